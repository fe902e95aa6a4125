//! Bounded fan-out and pagination helpers

pub use janitor_core::collect_pages;
use futures::stream::{FuturesUnordered, StreamExt};
use janitor_core::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Run `f` over every item with at most `limit` in flight
///
/// The first error is returned and the remaining work is dropped.
/// Results come back in completion order.
pub async fn for_each_bounded<I, F, Fut, T>(items: I, limit: usize, f: F) -> Result<Vec<T>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut futures = FuturesUnordered::new();

    for item in items {
        let sem = semaphore.clone();
        let work = f(item);
        futures.push(async move {
            let _permit = sem.acquire_owned().await.map_err(|_| Error::Cancelled)?;
            work.await
        });
    }

    let mut results = Vec::with_capacity(futures.len());
    while let Some(result) = futures.next().await {
        results.push(result?);
    }
    Ok(results)
}
