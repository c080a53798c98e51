//! Runs independent jobs over rayon's pool. A failing job never stops the others.

use rayon::prelude::*;

use crate::error::Categorized;

/// Runs `f` over every job in parallel. Results come back in job order.
pub fn process_batch<J, T, E, F>(jobs: &[J], f: F) -> Vec<Result<T, E>>
where
    J: Sync,
    T: Send,
    E: Send,
    F: Fn(&J) -> Result<T, E> + Sync + Send,
{
    jobs.par_iter().map(f).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    /// Inputs that turned out not to be sprite resources.
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results<T, E: Categorized>(results: &[Result<T, E>]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result {
                    Ok(_) => summary.succeeded += 1,
                    Err(err) if err.category().is_skippable() => summary.skipped += 1,
                    Err(_) => summary.failed += 1,
                }

                summary
            })
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// Something was attempted and nothing came out of it.
    pub fn nothing_succeeded(&self) -> bool {
        self.succeeded == 0 && self.total() > 0
    }
}
