//! # genai-transcode
//!
//! Pure mapping between the canonical model and the two backend wire dialects.
//!
//! - **Path grammar**: [`path`] reads and writes nested JSON (`a.b`, `a[0].b`,
//!   `a[].b`, `_self`)
//! - **Field tables**: [`table::FieldRule`] rows name the canonical path, each
//!   backend's wire path, and a value transform; one engine ([`table::encode`],
//!   [`table::decode`]) interprets every table in both directions
//! - **Names**: [`names`] qualifies model, cached-content, and file ids per backend
//! - **Capabilities**: [`models`], [`files`], [`caches`], [`operations`], [`live`]
//!   expose request builders producing an [`HttpRequestDescriptor`] and response
//!   decoders producing canonical types
//!
//! Nothing here performs I/O. Every backend-exclusive field supplied for the other
//! backend fails with [`GenAiError::FieldNotSupported`] before a request exists.
//!
//! [`HttpRequestDescriptor`]: genai_core::HttpRequestDescriptor
//! [`GenAiError::FieldNotSupported`]: genai_core::GenAiError::FieldNotSupported

#![deny(unsafe_code)]

pub mod caches;
pub mod common;
pub mod files;
pub mod live;
pub mod models;
pub mod names;
pub mod operations;
pub mod path;
pub mod table;

pub use names::{cached_content_name, caches_model_name, file_id, model_name};
pub use table::{FieldRule, Transform, TranscodeContext, Wire, decode, decode_into, encode};
