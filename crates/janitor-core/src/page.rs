//! Paginated provider listings

use crate::cancel::CancelToken;
use crate::error::Result;
use std::future::Future;

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self {
            items,
            // providers sometimes return an empty token on the last page
            next_token: next_token.filter(|t| !t.is_empty()),
        }
    }

    /// Final page holding every item
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Drain a paginated listing, checking for cancellation before every page
pub async fn collect_pages<T, F, Fut>(cancel: &CancelToken, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token = None;
    loop {
        cancel.check()?;
        let page = fetch(token.take()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_collect_pages_follows_tokens() {
        let cancel = CancelToken::new();
        let calls = AtomicUsize::new(0);
        let items = collect_pages(&cancel, |token| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(match token.as_deref() {
                    None => Page::new(vec![1, 2], Some("a".into())),
                    Some("a") => Page::new(vec![3], Some("b".into())),
                    _ => Page::new(vec![4], Some(String::new())),
                })
            }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_collect_pages_stops_when_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = collect_pages(&cancel, |_| async { Ok(Page::last(vec![1])) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
