use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Accuracy tally over a labelled image set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalStats {
    /// Images that went through a forward pass.
    pub total: usize,
    /// Predictions whose label matched the image's class directory.
    pub correct: usize,
    /// Images that could not be decoded or classified.
    pub skipped: usize,
    /// Wall-clock time spent on the whole run in milliseconds.
    pub elapsed_ms: u64,
}

impl EvalStats {
    pub fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.correct += 1;
        }
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    /// Percentage of correct predictions, 0 when nothing was classified.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for EvalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Images = {}", self.total)?;
        write!(f, "Accuracy = {:.6}", self.accuracy())?;
        if self.skipped > 0 {
            write!(f, "\nSkipped = {}", self.skipped)?;
        }
        Ok(())
    }
}
