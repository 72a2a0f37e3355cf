use rand::Rng;

use crate::choreography::{self, Schedule};
use crate::config::ChartConfig;
use crate::layers::{self, Composition};
use crate::models::MonthDataset;
use crate::scales::Scales;

/// A fully built month: geometry plus its reveal timing.
#[derive(Debug, Clone)]
pub struct Chart {
    pub composition: Composition,
    pub schedule: Schedule,
}

/// Records → scales → layers → schedule. Holds no state between calls; the
/// random source only drives jitter.
pub fn build_chart<R>(config: &ChartConfig, dataset: &MonthDataset, rng: &mut R) -> Chart
where
    R: Rng,
{
    let scales = Scales::build(config, dataset);
    let composition = layers::compose(config, dataset, &scales, rng);
    let schedule = choreography::choreograph(&config.choreography, &composition);
    let bound_ms = config.choreography.completion_bound_ms();
    if schedule.total_ms() > bound_ms {
        tracing::warn!(
            total_ms = schedule.total_ms(),
            bound_ms,
            "reveal runs past its budget"
        );
    }
    tracing::debug!(
        month = %dataset.month,
        boxes = composition.boxes.len(),
        points = composition.points.len(),
        orgs = scales.color.domain().len(),
        reveal_ms = schedule.total_ms(),
        "chart built"
    );
    Chart {
        composition,
        schedule,
    }
}
