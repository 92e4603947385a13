//! The `files` capability (direct backend): metadata, listing, deletion and
//! resumable upload.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use genai_core::types::{File, ListFilesConfig, UploadFileConfig};
use genai_core::{GenAiError, Result};
use genai_transcode::files::{
    delete_file_request, file_response, get_file_request, list_files_request, list_files_response,
    upload_file_body,
};
use tracing::{info, instrument};

use crate::client::ClientInner;
use crate::pager::{Page, PageFetcher, Pager};

/// Handle for the `files` capability.
#[derive(Clone, Debug)]
pub struct Files {
    inner: Arc<ClientInner>,
}

impl Files {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// File metadata by name (`files/abc`, `abc`, or a file URI).
    #[instrument(skip_all, fields(name = %name))]
    pub async fn get(&self, name: &str) -> Result<File> {
        let descriptor = get_file_request(name, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        file_response(&wire, &self.inner.ctx)
    }

    /// Delete a file.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        let descriptor = delete_file_request(name, &self.inner.ctx)?;
        let _ = self.inner.api.request(descriptor).await?;
        Ok(())
    }

    /// List uploaded files.
    #[instrument(skip_all)]
    pub async fn list(&self, config: ListFilesConfig) -> Result<Pager<File>> {
        let page_token = config.page_token.clone();
        let page_size = config.page_size;
        let inner = Arc::clone(&self.inner);
        let fetch: PageFetcher<File> = Arc::new(move |token| {
            let inner = Arc::clone(&inner);
            let config = ListFilesConfig {
                page_token: token,
                ..config.clone()
            };
            async move {
                let descriptor = list_files_request(&config, &inner.ctx)?;
                let wire = inner.api.request(descriptor).await?;
                let page = list_files_response(&wire, &inner.ctx)?;
                Ok(Page {
                    items: page.files.unwrap_or_default(),
                    next_page_token: page.next_page_token,
                })
            }
            .boxed()
        });
        Pager::start(page_token, page_size, fetch).await
    }

    /// Upload `data` with the resumable protocol and return the stored file.
    ///
    /// `config.mime_type` is required.
    #[instrument(skip_all, fields(size_bytes = data.len()))]
    pub async fn upload(&self, data: Bytes, config: UploadFileConfig) -> Result<File> {
        let ctx = &self.inner.ctx;
        let api = &self.inner.api;
        let metadata = upload_file_body(&config, ctx)?;
        let mime_type = config
            .mime_type
            .as_deref()
            .ok_or_else(|| GenAiError::invalid_request("mime_type is required to upload a file"))?;
        let options = config.http_options.clone().unwrap_or_default();

        let upload_url = api
            .upload_start(&metadata, data.len() as u64, mime_type, &options)
            .await?;
        let wire = api
            .upload_blob(&upload_url, data, &api.settings().upload, &options)
            .await?;
        let file = file_response(&wire, ctx)?;
        info!(name = file.name.as_deref().unwrap_or_default(), "file uploaded");
        Ok(file)
    }

    /// Upload the file at `path`. The display name defaults to the file name.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn upload_path(&self, path: &Path, mut config: UploadFileConfig) -> Result<File> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            GenAiError::invalid_request(format!("cannot read {}: {e}", path.display()))
        })?;
        if config.display_name.is_none() {
            config.display_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from);
        }
        self.upload(Bytes::from(data), config).await
    }
}
