//! Canonical, backend-independent request and response model.
//!
//! These structures serialize to camelCase JSON, which is the input and output of
//! the field-table transcoders. Absent fields are omitted, never null-filled, so a
//! decoded response leaves unknown fields `None` rather than defaulting them.

pub mod caches;
pub mod config;
pub mod content;
pub mod embed;
pub mod files;
pub mod images;
pub mod live;
pub mod models;
pub mod operations;
pub mod response;
pub mod tokens;
pub mod tools;
pub mod videos;

pub use caches::*;
pub use config::*;
pub use content::*;
pub use embed::*;
pub use files::*;
pub use images::*;
pub use live::*;
pub use models::*;
pub use operations::*;
pub use response::*;
pub use tokens::*;
pub use tools::*;
pub use videos::*;
