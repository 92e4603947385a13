//! Cursor pagination over list endpoints.
//!
//! A [`Pager`] holds one page of items plus the function that fetches the page
//! after a cursor. [`Pager::into_stream`] walks every remaining page lazily; the
//! stream is finite and consumes the pager, so it cannot be restarted.

use std::fmt;
use std::sync::Arc;

use futures::Stream;
use futures::future::BoxFuture;
use genai_core::{GenAiError, Result};
use tracing::debug;

/// One page of a list response.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Cursor for the following page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Fetches the page at a cursor (`None` for the first page).
pub type PageFetcher<T> = Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;

/// Cursor-driven view over a list endpoint.
pub struct Pager<T> {
    items: Vec<T>,
    next_page_token: Option<String>,
    requested_page_size: Option<u32>,
    fetch: PageFetcher<T>,
}

impl<T: Send + 'static> Pager<T> {
    /// A pager positioned on `first`, fetching later pages with `fetch`.
    pub fn new(first: Page<T>, requested_page_size: Option<u32>, fetch: PageFetcher<T>) -> Self {
        Self {
            items: first.items,
            next_page_token: first.next_page_token.filter(|t| !t.is_empty()),
            requested_page_size,
            fetch,
        }
    }

    /// Fetch the page at `page_token` and position a pager on it.
    pub async fn start(
        page_token: Option<String>,
        requested_page_size: Option<u32>,
        fetch: PageFetcher<T>,
    ) -> Result<Self> {
        let first = fetch(page_token).await?;
        Ok(Self::new(first, requested_page_size, fetch))
    }

    /// Items of the current page.
    pub fn page(&self) -> &[T] {
        &self.items
    }

    /// Requested page size, or the current page length when none was requested.
    pub fn page_size(&self) -> usize {
        self.requested_page_size
            .map_or(self.items.len(), |size| size as usize)
    }

    /// Whether a cursor for another page is present.
    pub fn has_next_page(&self) -> bool {
        self.next_page_token.is_some()
    }

    /// Cursor of the following page.
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    /// Replace the current page with the next one.
    ///
    /// Fails with [`GenAiError::NoMorePages`] when no cursor is present.
    pub async fn next_page(&mut self) -> Result<&[T]> {
        let token = self.next_page_token.clone().ok_or(GenAiError::NoMorePages)?;
        debug!(page_token = %token, "fetching next page");
        let page = (self.fetch)(Some(token)).await?;
        self.items = page.items;
        self.next_page_token = page.next_page_token.filter(|t| !t.is_empty());
        Ok(&self.items)
    }

    /// Every item from the current page onward, fetching pages on demand.
    ///
    /// A fetch failure is yielded once and ends the stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> + Send
    where
        T: Sync,
    {
        async_stream::stream! {
            let mut pager = self;
            loop {
                for item in std::mem::take(&mut pager.items) {
                    yield Ok(item);
                }
                if !pager.has_next_page() {
                    break;
                }
                if let Err(e) = pager.next_page().await {
                    yield Err(e);
                    break;
                }
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("items", &self.items)
            .field("next_page_token", &self.next_page_token)
            .field("requested_page_size", &self.requested_page_size)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use futures::{FutureExt, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Pages `[1,2] → [3,4] → [5]` keyed by cursor.
    fn three_pages(calls: Arc<AtomicUsize>) -> PageFetcher<u32> {
        Arc::new(move |token: Option<String>| {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            let page = match token.as_deref() {
                None => Page { items: vec![1, 2], next_page_token: Some("p2".into()) },
                Some("p2") => Page { items: vec![3, 4], next_page_token: Some("p3".into()) },
                Some("p3") => Page { items: vec![5], next_page_token: None },
                Some(other) => {
                    let other = other.to_string();
                    return async move { Err(GenAiError::invalid_request(format!("bad cursor {other}"))) }
                        .boxed();
                }
            };
            async move { Ok(page) }.boxed()
        })
    }

    #[tokio::test]
    async fn stream_walks_all_pages_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pager = Pager::start(None, Some(2), three_pages(calls.clone())).await.unwrap();
        let items: Vec<u32> = pager.into_stream().map(Result::unwrap).collect().await;
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn next_page_without_cursor_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pager = Pager::start(Some("p3".into()), None, three_pages(calls)).await.unwrap();
        assert!(!pager.has_next_page());
        assert_matches!(pager.next_page().await, Err(GenAiError::NoMorePages));
        assert_eq!(pager.page(), &[5]);
    }

    #[tokio::test]
    async fn manual_paging_replaces_items() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pager = Pager::start(None, None, three_pages(calls)).await.unwrap();
        assert_eq!(pager.page_size(), 2);
        assert_eq!(pager.next_page().await.unwrap(), &[3, 4]);
        assert_eq!(pager.next_page_token(), Some("p3"));
        assert_eq!(pager.next_page().await.unwrap(), &[5]);
        assert_eq!(pager.page_size(), 1);
    }

    #[tokio::test]
    async fn empty_cursor_means_last_page() {
        let fetch: PageFetcher<u32> = Arc::new(|_| {
            async { Ok(Page { items: vec![7], next_page_token: Some(String::new()) }) }.boxed()
        });
        let pager = Pager::start(None, None, fetch).await.unwrap();
        assert!(!pager.has_next_page());
    }

    #[tokio::test]
    async fn fetch_error_ends_stream() {
        let fetch: PageFetcher<u32> = Arc::new(|token| match token {
            None => async { Ok(Page { items: vec![1], next_page_token: Some("x".into()) }) }.boxed(),
            Some(_) => async { Err(GenAiError::NoMorePages) }.boxed(),
        });
        let pager = Pager::start(None, None, fetch).await.unwrap();
        let items: Vec<Result<u32>> = pager.into_stream().collect().await;
        assert_eq!(items.len(), 2);
        assert_matches!(items[0], Ok(1));
        assert_matches!(items[1], Err(_));
    }
}
