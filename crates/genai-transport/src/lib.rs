//! # genai-transport
//!
//! Network execution for transcoded requests.
//!
//! - **Client**: [`ApiClient`] builds URLs per backend, injects default and auth
//!   headers, and maps non-2xx responses to [`GenAiError::Api`]
//! - **Streaming**: [`sse`] frames `alt=sse` byte streams into JSON chunks
//! - **Cancellation**: [`CancelScope`] races timeouts and caller tokens against I/O
//! - **Auth**: [`auth`] providers for API keys, bearer tokens, and service accounts
//! - **Upload**: chunked resumable upload with bounded retry ([`upload`])
//!
//! [`GenAiError::Api`]: genai_core::GenAiError::Api

#![deny(unsafe_code)]

pub mod api_client;
pub mod auth;
pub mod cancel;
pub mod sse;
pub mod upload;

pub use api_client::{ApiClient, UploadResponse, managed_base_url};
pub use auth::{ApiKeyAuth, AuthProvider, BearerTokenAuth, ServiceAccountAuth, auth_from_settings};
pub use cancel::CancelScope;
