//! Video generation (long-running).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::images::Image;
use crate::descriptor::RequestOptions;

/// A video, inline or by URI.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Location of the video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Base64-encoded bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_bytes: Option<String>,
    /// IANA MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Optional parameters for `generateVideos`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideosConfig {
    /// Number of videos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_videos: Option<u32>,
    /// Clip length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// Aspect ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// What to avoid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Whether people may be generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
    /// Output resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Sampling seed (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Frames per second (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    /// Let the model rewrite the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance_prompt: Option<bool>,
    /// Generate an audio track (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_audio: Option<bool>,
    /// Storage destination (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_gcs_uri: Option<String>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `generateVideos`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideosParameters {
    /// Model id or resource name.
    pub model: String,
    /// Text prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// First frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateVideosConfig>,
}

/// One generated video.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    /// The video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
}

/// Result payload of a finished video operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideosResponse {
    /// Videos in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_videos: Option<Vec<GeneratedVideo>>,
    /// Number of filtered videos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rai_media_filtered_count: Option<u32>,
    /// Filter reasons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rai_media_filtered_reasons: Option<Vec<String>>,
}

/// A long-running video generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideosOperation {
    /// Operation resource name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the operation finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    /// Service-specific metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Failure status, when `done` and unsuccessful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Result, when `done` and successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<GenerateVideosResponse>,
}

impl GenerateVideosOperation {
    /// Whether the operation finished (successfully or not).
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}
