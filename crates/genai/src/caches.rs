//! The `caches` capability: cached content CRUD and listing.

use std::sync::Arc;

use futures::FutureExt;
use genai_core::Result;
use genai_core::types::{
    CachedContent, CreateCachedContentParameters, ListCachedContentsConfig,
    UpdateCachedContentParameters,
};
use genai_transcode::caches::{
    cached_content_response, create_cached_content_request, delete_cached_content_request,
    get_cached_content_request, list_cached_contents_request, list_cached_contents_response,
    update_cached_content_request,
};
use tracing::instrument;

use crate::client::ClientInner;
use crate::pager::{Page, PageFetcher, Pager};

/// Handle for the `caches` capability.
#[derive(Clone, Debug)]
pub struct Caches {
    inner: Arc<ClientInner>,
}

impl Caches {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Create cached content for a model.
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn create(&self, params: CreateCachedContentParameters) -> Result<CachedContent> {
        let descriptor = create_cached_content_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        cached_content_response(&wire, &self.inner.ctx)
    }

    /// Cached content by name.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn get(&self, name: &str) -> Result<CachedContent> {
        let descriptor = get_cached_content_request(name, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        cached_content_response(&wire, &self.inner.ctx)
    }

    /// Change the expiration of cached content.
    #[instrument(skip_all, fields(name = %params.name))]
    pub async fn update(&self, params: UpdateCachedContentParameters) -> Result<CachedContent> {
        let descriptor = update_cached_content_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        cached_content_response(&wire, &self.inner.ctx)
    }

    /// Delete cached content.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        let descriptor = delete_cached_content_request(name, &self.inner.ctx)?;
        let _ = self.inner.api.request(descriptor).await?;
        Ok(())
    }

    /// List cached contents.
    #[instrument(skip_all)]
    pub async fn list(&self, config: ListCachedContentsConfig) -> Result<Pager<CachedContent>> {
        let page_token = config.page_token.clone();
        let page_size = config.page_size;
        let inner = Arc::clone(&self.inner);
        let fetch: PageFetcher<CachedContent> = Arc::new(move |token| {
            let inner = Arc::clone(&inner);
            let config = ListCachedContentsConfig {
                page_token: token,
                ..config.clone()
            };
            async move {
                let descriptor = list_cached_contents_request(&config, &inner.ctx)?;
                let wire = inner.api.request(descriptor).await?;
                let page = list_cached_contents_response(&wire, &inner.ctx)?;
                Ok(Page {
                    items: page.cached_contents.unwrap_or_default(),
                    next_page_token: page.next_page_token,
                })
            }
            .boxed()
        });
        Pager::start(page_token, page_size, fetch).await
    }
}
