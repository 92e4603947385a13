//! Backend selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which wire dialect and endpoint family a client talks to.
///
/// Resolved once per client instance and never changed afterwards. Every
/// transcoder is keyed by this value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendTarget {
    /// The developer API (`generativelanguage.googleapis.com`), API-key auth.
    #[default]
    Direct,
    /// The managed cloud platform (`aiplatform.googleapis.com`), project/location
    /// scoped, bearer or service-account auth.
    Managed,
}

impl BackendTarget {
    /// Resolve from the `vertexai` boolean used in settings.
    #[must_use]
    pub fn from_vertexai(vertexai: bool) -> Self {
        if vertexai { Self::Managed } else { Self::Direct }
    }

    /// Whether this is the managed backend.
    #[must_use]
    pub fn is_managed(self) -> bool {
        matches!(self, Self::Managed)
    }

    /// Stable lowercase name used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Managed => "managed",
        }
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
