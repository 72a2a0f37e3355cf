use rand::Rng;

use crate::catalog::MonthCatalog;
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::loader::{self, DataSource};
use crate::models::{MonthDataset, MonthKey};
use crate::pipeline::{self, Chart};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Direction {
    Prev,
    Next,
}

/// Handle for one in-flight load. Only the most recent ticket may update the
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub month: MonthKey,
    generation: u64,
}

#[derive(Debug, Clone)]
pub enum ChartView {
    Empty,
    Loading { month: MonthKey },
    Ready { month: MonthKey, chart: Box<Chart> },
    Failed { month: MonthKey, message: String },
}

impl ChartView {
    pub fn month(&self) -> Option<MonthKey> {
        match self {
            ChartView::Empty => None,
            ChartView::Loading { month }
            | ChartView::Ready { month, .. }
            | ChartView::Failed { month, .. } => Some(*month),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Discarded,
}

/// Month selection plus whatever is currently on screen. Chart building
/// itself stays in [`pipeline::build_chart`]; the session only decides which
/// results are allowed to land.
#[derive(Debug)]
pub struct ChartSession {
    catalog: MonthCatalog,
    selected: MonthKey,
    generation: u64,
    view: ChartView,
}

impl ChartSession {
    pub fn new(catalog: MonthCatalog, selected: MonthKey) -> Result<Self, ChartError> {
        let selected = catalog.require(selected)?;
        Ok(Self {
            catalog,
            selected,
            generation: 0,
            view: ChartView::Empty,
        })
    }

    pub fn selected(&self) -> MonthKey {
        self.selected
    }

    pub fn view(&self) -> &ChartView {
        &self.view
    }

    /// Moves one month and starts a load, or does nothing at a boundary.
    pub fn step(&mut self, direction: Direction) -> Option<LoadTicket> {
        let Some(month) = self.neighbour(direction) else {
            tracing::debug!(month = %self.selected, ?direction, "already at catalog boundary");
            return None;
        };
        self.selected = month;
        Some(self.begin_load())
    }

    pub fn select(&mut self, month: MonthKey) -> Result<LoadTicket, ChartError> {
        self.selected = self.catalog.require(month)?;
        Ok(self.begin_load())
    }

    pub fn reload(&mut self) -> LoadTicket {
        self.begin_load()
    }

    fn neighbour(&self, direction: Direction) -> Option<MonthKey> {
        match direction {
            Direction::Prev => self.catalog.previous(&self.selected),
            Direction::Next => self.catalog.next(&self.selected),
        }
    }

    /// Supersedes any earlier ticket and clears the previous month's chart.
    fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.view = ChartView::Loading {
            month: self.selected,
        };
        LoadTicket {
            month: self.selected,
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    pub fn complete<R>(
        &mut self,
        ticket: LoadTicket,
        result: Result<MonthDataset, ChartError>,
        config: &ChartConfig,
        rng: &mut R,
    ) -> Completion
    where
        R: Rng,
    {
        if !self.is_current(&ticket) {
            tracing::debug!(
                stale = %ticket.month,
                current = %self.selected,
                "discarding superseded load"
            );
            return Completion::Discarded;
        }

        match result {
            Ok(dataset) => {
                let chart = pipeline::build_chart(config, &dataset, rng);
                self.view = ChartView::Ready {
                    month: ticket.month,
                    chart: Box::new(chart),
                };
                Completion::Applied
            }
            Err(err) => {
                tracing::error!(month = %ticket.month, error = %err, "month failed to load");
                self.view = ChartView::Failed {
                    month: ticket.month,
                    message: err.to_string(),
                };
                Completion::Failed
            }
        }
    }

    /// Loads the ticket's month and applies it if still current.
    pub async fn fulfil<S, R>(
        &mut self,
        source: &S,
        ticket: LoadTicket,
        config: &ChartConfig,
        rng: &mut R,
    ) -> Completion
    where
        S: DataSource + ?Sized,
        R: Rng,
    {
        let result = loader::load_month(source, ticket.month).await;
        self.complete(ticket, result, config, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{three_day_dataset, three_day_source};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn key(value: &str) -> MonthKey {
        value.parse().unwrap()
    }

    fn session(selected: &str) -> ChartSession {
        let catalog = MonthCatalog::new(vec![key("2024-02"), key("2024-03"), key("2024-04")]);
        ChartSession::new(catalog, key(selected)).unwrap()
    }

    #[test]
    fn stepping_past_boundaries_is_a_no_op() {
        let mut first = session("2024-02");
        assert!(first.step(Direction::Prev).is_none());
        assert_eq!(first.selected(), key("2024-02"));
        assert!(matches!(first.view(), ChartView::Empty));

        let mut last = session("2024-04");
        assert!(last.step(Direction::Next).is_none());
        assert_eq!(last.selected(), key("2024-04"));
    }

    #[test]
    fn stepping_moves_one_month_and_clears_view() {
        let mut session = session("2024-03");
        let ticket = session.step(Direction::Next).unwrap();
        assert_eq!(ticket.month, key("2024-04"));
        assert!(matches!(session.view(), ChartView::Loading { month } if *month == key("2024-04")));
    }

    #[test]
    fn selecting_outside_catalog_is_rejected() {
        let mut session = session("2024-03");
        assert!(matches!(
            session.select(key("2025-01")),
            Err(ChartError::UnknownMonth(_))
        ));
        assert_eq!(session.selected(), key("2024-03"));
    }

    #[test]
    fn selected_month_stays_current_after_boundary_step() {
        let mut session = session("2024-04");
        let ticket = session.select(key("2024-02")).unwrap();
        assert!(session.step(Direction::Prev).is_none());
        assert!(session.is_current(&ticket));
        assert!(matches!(session.view(), ChartView::Loading { month } if *month == key("2024-02")));
    }

    #[test]
    fn late_result_for_superseded_month_is_discarded() {
        let config = ChartConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = session("2024-02");

        let stale = session.select(key("2024-03")).unwrap();
        let current = session.select(key("2024-04")).unwrap();

        let mut april = three_day_dataset();
        april.month = key("2024-04");
        assert_eq!(
            session.complete(current, Ok(april), &config, &mut rng),
            Completion::Applied
        );
        assert_eq!(
            session.complete(stale, Ok(three_day_dataset()), &config, &mut rng),
            Completion::Discarded
        );

        match session.view() {
            ChartView::Ready { month, chart } => {
                assert_eq!(*month, key("2024-04"));
                assert_eq!(chart.composition.month, key("2024-04"));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn stale_failure_does_not_replace_current_chart() {
        let config = ChartConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = session("2024-02");
        let stale = session.select(key("2024-03")).unwrap();
        let current = session.reload();

        session.complete(current, Ok(three_day_dataset()), &config, &mut rng);
        let err = ChartError::UnknownMonth(key("2024-03"));
        assert_eq!(
            session.complete(stale, Err(err), &config, &mut rng),
            Completion::Discarded
        );
        assert!(matches!(session.view(), ChartView::Ready { .. }));
    }

    #[tokio::test]
    async fn fulfil_loads_and_renders_current_month() {
        let config = ChartConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let source = three_day_source();
        let mut session = session("2024-03");

        let ticket = session.reload();
        let outcome = session.fulfil(&source, ticket, &config, &mut rng).await;
        assert_eq!(outcome, Completion::Applied);
        match session.view() {
            ChartView::Ready { chart, .. } => assert_eq!(chart.composition.boxes.len(), 3),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_month_clears_chart_and_names_month() {
        let config = ChartConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let source = three_day_source();
        let mut session = session("2024-03");

        let ticket = session.reload();
        session.fulfil(&source, ticket, &config, &mut rng).await;
        assert!(matches!(session.view(), ChartView::Ready { .. }));

        // 2024-02 has no resources in the fixture source
        let ticket = session.step(Direction::Prev).unwrap();
        let outcome = session.fulfil(&source, ticket, &config, &mut rng).await;
        assert_eq!(outcome, Completion::Failed);
        match session.view() {
            ChartView::Failed { month, message } => {
                assert_eq!(*month, key("2024-02"));
                assert!(message.contains("2024-02"));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }
}
