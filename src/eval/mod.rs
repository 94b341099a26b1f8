//! Accuracy measurement over a directory-per-class image set.

pub mod dataset;
pub mod stats;

use std::time::Instant;

use tracing::{debug, warn};

pub use dataset::{discover, Sample};
pub use stats::EvalStats;

use crate::network::{LabelSet, Network};
use crate::preprocess;

/// Classifies every sample with one reused activation state and counts the
/// predictions whose label equals the sample's directory name.
///
/// Images that fail to decode are logged and skipped so one bad file does
/// not end the run.
pub fn evaluate(network: &Network, labels: &LabelSet, samples: &[Sample]) -> EvalStats {
    let mut stats = EvalStats::default();
    let mut state = network.new_state();
    let start = Instant::now();

    for sample in samples {
        let input = match preprocess::load_image(&sample.path, &network.plan().input) {
            Ok(input) => input,
            Err(e) => {
                warn!(path = %sample.path.display(), error = %e, "skipping image");
                stats.skip();
                continue;
            }
        };
        match network.classify(&input, &mut state, labels) {
            Ok((index, predicted)) => {
                let hit = predicted == sample.label;
                debug!(path = %sample.path.display(), index, predicted, hit, "classified");
                stats.record(hit);
            }
            Err(e) => {
                warn!(path = %sample.path.display(), error = %e, "classification failed");
                stats.skip();
            }
        }
    }

    stats.finish(start.elapsed());
    stats
}
