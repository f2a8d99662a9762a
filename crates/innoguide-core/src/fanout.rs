//! Issue N independent tasks, wait for all of them, keep what succeeded.

use std::future::Future;

use futures_util::future::join_all;

/// Outcome of a fan-out, with successes in submission order.
#[derive(Debug)]
pub struct Gathered<T, E> {
    pub successes: Vec<T>,
    /// `(submission index, error)` for every task that failed
    pub failures: Vec<(usize, E)>,
}

impl<T, E> Gathered<T, E> {
    pub fn is_total_failure(&self) -> bool {
        self.successes.is_empty()
    }
}

/// Run `count` tasks built by `make` concurrently and join them all.
///
/// Nothing short-circuits: a failing task never cancels its siblings. Each
/// task is tagged with its index and results are re-sorted by that index, so
/// the output order never depends on completion order.
pub async fn gather_ordered<T, E, F, Fut>(count: usize, make: F) -> Gathered<T, E>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let tasks = (0..count).map(|index| {
        let task = make(index);
        async move { (index, task.await) }
    });

    let mut settled = join_all(tasks).await;
    settled.sort_by_key(|(index, _)| *index);

    let mut gathered = Gathered {
        successes: Vec::new(),
        failures: Vec::new(),
    };
    for (index, outcome) in settled {
        match outcome {
            Ok(value) => gathered.successes.push(value),
            Err(err) => gathered.failures.push((index, err)),
        }
    }
    gathered
}
