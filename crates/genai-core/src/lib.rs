//! # genai-core
//!
//! Foundation types shared by every genai crate.
//!
//! - **Backend target**: [`BackendTarget`] selects one of the two wire dialects
//! - **Canonical model**: backend-independent request/response structures in [`types`]
//! - **Request descriptor**: [`HttpRequestDescriptor`], the transport-neutral shape a
//!   transcoder produces and the transport consumes
//! - **Errors**: [`GenAiError`] taxonomy via `thiserror`
//! - **Logging**: `tracing` subscriber bootstrap
//! - **Backoff**: exponential retry schedule used by the upload protocol

#![deny(unsafe_code)]

pub mod backend;
pub mod descriptor;
pub mod errors;
pub mod logging;
pub mod retry;
pub mod types;

pub use backend::BackendTarget;
pub use descriptor::{HttpMethod, HttpRequestDescriptor, RequestOptions};
pub use errors::{GenAiError, Result};
