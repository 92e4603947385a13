//! The `models` capability: generation, token counting, embeddings, image and
//! video generation, and model metadata.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use genai_core::{HttpRequestDescriptor, Result};
use genai_core::types::{
    CountTokensParameters, CountTokensResponse, EmbedContentParameters, EmbedContentResponse,
    GenerateContentParameters, GenerateContentResponse, GenerateImagesParameters,
    GenerateImagesResponse, GenerateVideosOperation, GenerateVideosParameters,
    GetModelParameters, ListModelsConfig, ListModelsParameters, Model,
};
use genai_transcode::TranscodeContext;
use genai_transcode::models::{
    count_tokens_request, count_tokens_response, embed_content_request, embed_content_response,
    generate_content_request, generate_content_response, generate_images_request,
    generate_images_response, generate_videos_operation, generate_videos_request,
    get_model_request, list_models_request, list_models_response, model_response,
    stream_generate_content_request,
};
use tracing::instrument;

use crate::afc;
use crate::client::ClientInner;
use crate::pager::{Page, PageFetcher, Pager};

/// Stream of generation chunks.
pub type ResponseStream = BoxStream<'static, Result<GenerateContentResponse>>;

/// Handle for the `models` capability.
#[derive(Clone, Debug)]
pub struct Models {
    inner: Arc<ClientInner>,
}

impl Models {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Transcoding context of the owning client.
    pub fn context(&self) -> &TranscodeContext {
        &self.inner.ctx
    }

    /// Generate content.
    ///
    /// When the config registers callable tools, function calls are executed and
    /// answered automatically up to the configured ceiling.
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn generate_content(
        &self,
        params: GenerateContentParameters,
    ) -> Result<GenerateContentResponse> {
        match afc::plan(params.config.as_ref(), self.inner.default_remote_calls())? {
            None => self.generate_once(params).await,
            Some(plan) => {
                afc::run(&plan, params, |request| {
                    let models = self.clone();
                    async move { models.generate_once(request).await }
                })
                .await
            }
        }
    }

    /// Generate content as a stream of partial responses.
    ///
    /// The request is transcoded before any network activity, so unsupported
    /// fields fail here rather than on the stream. With callable tools, each
    /// round's chunks are followed by one chunk holding the tool results.
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn generate_content_stream(
        &self,
        params: GenerateContentParameters,
    ) -> Result<ResponseStream> {
        let descriptor = stream_generate_content_request(&params, &self.inner.ctx)?;
        match afc::plan(params.config.as_ref(), self.inner.default_remote_calls())? {
            None => self.open_stream(descriptor).await,
            Some(plan) => {
                let models = self.clone();
                // The first round reuses the descriptor built above.
                let mut first = Some(descriptor);
                Ok(afc::run_stream(plan, params, move |request| {
                    let models = models.clone();
                    let prepared = first.take();
                    async move {
                        let descriptor = match prepared {
                            Some(descriptor) => descriptor,
                            None => stream_generate_content_request(&request, &models.inner.ctx)?,
                        };
                        models.open_stream(descriptor).await
                    }
                })
                .boxed())
            }
        }
    }

    async fn generate_once(&self, params: GenerateContentParameters) -> Result<GenerateContentResponse> {
        let descriptor = generate_content_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        generate_content_response(&wire, &self.inner.ctx)
    }

    async fn open_stream(&self, descriptor: HttpRequestDescriptor) -> Result<ResponseStream> {
        let chunks = self.inner.api.stream(descriptor).await?;
        let ctx = self.inner.ctx.clone();
        Ok(chunks
            .map(move |chunk| chunk.and_then(|wire| generate_content_response(&wire, &ctx)))
            .boxed())
    }

    /// Count tokens for the given contents.
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn count_tokens(&self, params: CountTokensParameters) -> Result<CountTokensResponse> {
        let descriptor = count_tokens_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        count_tokens_response(&wire, &self.inner.ctx)
    }

    /// Embed each content.
    #[instrument(skip_all, fields(model = %params.model, count = params.contents.len()))]
    pub async fn embed_content(&self, params: EmbedContentParameters) -> Result<EmbedContentResponse> {
        let descriptor = embed_content_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        embed_content_response(&wire, &self.inner.ctx)
    }

    /// Generate images from a prompt.
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn generate_images(
        &self,
        params: GenerateImagesParameters,
    ) -> Result<GenerateImagesResponse> {
        let descriptor = generate_images_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        generate_images_response(&wire, &self.inner.ctx)
    }

    /// Start video generation. Poll the returned operation with
    /// [`Operations::get_videos_operation`](crate::Operations::get_videos_operation).
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn generate_videos(
        &self,
        params: GenerateVideosParameters,
    ) -> Result<GenerateVideosOperation> {
        let descriptor = generate_videos_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        generate_videos_operation(&wire, &self.inner.ctx)
    }

    /// Model metadata.
    #[instrument(skip_all, fields(model = %params.model))]
    pub async fn get(&self, params: GetModelParameters) -> Result<Model> {
        let descriptor = get_model_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        model_response(&wire, &self.inner.ctx)
    }

    /// List base models, or tuned models when `query_base` is `false`.
    #[instrument(skip_all)]
    pub async fn list(&self, config: ListModelsConfig) -> Result<Pager<Model>> {
        let page_token = config.page_token.clone();
        let page_size = config.page_size;
        let inner = Arc::clone(&self.inner);
        let fetch: PageFetcher<Model> = Arc::new(move |token| {
            let inner = Arc::clone(&inner);
            let params = ListModelsParameters {
                config: Some(ListModelsConfig {
                    page_token: token,
                    ..config.clone()
                }),
            };
            async move {
                let descriptor = list_models_request(&params, &inner.ctx)?;
                let wire = inner.api.request(descriptor).await?;
                let page = list_models_response(&wire, &inner.ctx)?;
                Ok(Page {
                    items: page.models.unwrap_or_default(),
                    next_page_token: page.next_page_token,
                })
            }
            .boxed()
        });
        Pager::start(page_token, page_size, fetch).await
    }
}
