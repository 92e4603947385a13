//! # genai
//!
//! Client for the Gemini generative API over two backends: the direct API-key
//! service and the managed cloud platform.
//!
//! - **Client**: [`Client`] built from [`ClientSettings`]; one handle per capability
//!   ([`Models`], [`Files`], [`Caches`], [`Operations`], [`Live`])
//! - **Automatic function calling**: requests carrying callable tools are resolved
//!   locally in rounds; see [`afc`]
//! - **Pagination**: list endpoints return a [`Pager`]
//!
//! Canonical request and response types live in [`types`]; every failure is a
//! [`GenAiError`].

#![deny(unsafe_code)]

pub mod afc;
pub mod caches;
pub mod client;
pub mod files;
pub mod live;
pub mod models;
pub mod operations;
pub mod pager;

pub use caches::Caches;
pub use client::Client;
pub use files::Files;
pub use live::Live;
pub use models::{Models, ResponseStream};
pub use operations::Operations;
pub use pager::{Page, PageFetcher, Pager};

pub use genai_core::{BackendTarget, GenAiError, RequestOptions, Result, types};
pub use genai_live::{LiveConnectOptions, LiveSession, SessionState};
pub use genai_settings::ClientSettings;
