//! Image generation.

use serde::{Deserialize, Serialize};

use crate::descriptor::RequestOptions;

/// An image, inline or by storage URI.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Cloud storage URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_uri: Option<String>,
    /// Base64-encoded bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<String>,
    /// IANA MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Optional parameters for `generateImages`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagesConfig {
    /// Number of images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_images: Option<u32>,
    /// Aspect ratio, e.g. `16:9`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Prompt adherence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    /// Safety filter level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_filter_level: Option<String>,
    /// Whether people may be generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
    /// Report the filter reason for blocked images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_rai_reason: Option<bool>,
    /// Output MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_mime_type: Option<String>,
    /// Output image size, e.g. `2K`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
    /// What to avoid (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Sampling seed (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Invisible watermark (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_watermark: Option<bool>,
    /// Let the model rewrite the prompt (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance_prompt: Option<bool>,
    /// Storage destination (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_gcs_uri: Option<String>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `generateImages`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagesParameters {
    /// Model id or resource name.
    pub model: String,
    /// Text prompt.
    pub prompt: String,
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateImagesConfig>,
}

/// One generated image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// The image, absent when filtered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Filter reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rai_filtered_reason: Option<String>,
    /// Rewritten prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
}

/// Response of `generateImages`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagesResponse {
    /// Images in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_images: Option<Vec<GeneratedImage>>,
}
