//! Per-container fan-out.
//!
//! Containers are the unit of parallel work: every object handle owns its
//! cursor, but typed construction and reporting are grouped per container
//! so results come back in registration order.  With the `parallel`
//! feature the work runs on Rayon's pool; if that attempt fails as a whole
//! the same work is retried sequentially before the error is surfaced.

use log::warn;

/// Apply `f` to every item, preserving input order in the output.
pub fn map_containers<T, U, E, F>(items: &[T], f: F) -> Result<Vec<U>, E>
where
    T: Sync,
    U: Send,
    E: Send + std::fmt::Display,
    F: Fn(&T) -> Result<U, E> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let attempt: Result<Vec<U>, E> = items.par_iter().map(&f).collect();
        match attempt {
            Ok(out) => return Ok(out),
            Err(e) => warn!("parallel pass failed ({e}); retrying sequentially"),
        }
    }

    map_sequential(items, f)
}

fn map_sequential<T, U, E, F>(items: &[T], f: F) -> Result<Vec<U>, E>
where
    E: std::fmt::Display,
    F: Fn(&T) -> Result<U, E>,
{
    items
        .iter()
        .map(|item| {
            f(item).map_err(|e| {
                warn!("container pass failed: {e}");
                e
            })
        })
        .collect()
}
