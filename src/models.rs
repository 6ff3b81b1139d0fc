//! Typed views over the JSON envelopes the forensics service returns.
//!
//! The client hands back raw [`serde_json::Value`] payloads; these types are an
//! optional, lenient lens over them. Every field is optional or defaulted and
//! anything the server adds beyond the known fields is kept in `extra`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiResult, Failure};

/// The `status` discriminator present on every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    /// Used by `/health`.
    Ok,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ApiStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Ok)
    }
}

/// `GET /health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: ApiStatus,
    pub version: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /metadata`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub status: ApiStatus,
    pub message: Option<String>,
    pub metadata: Option<ImageMetadata>,
}

/// Metadata the server extracted from one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub filename: Option<String>,
    pub filesize: Option<u64>,
    pub exif: Option<ExifSummary>,
    /// Raw IPTC key/value pairs, present only when the image carries IPTC.
    pub iptc: Option<Map<String, Value>>,
    /// Raw XMP key/value pairs, present only when the image carries XMP.
    pub xmp: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExifSummary {
    pub make: Option<String>,
    pub model: Option<String>,
    pub datetime_original: Option<String>,
    pub datetime_modified: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub gps: Option<GpsInfo>,
    pub software: Option<String>,
    /// Every EXIF tag keyed by its full name (`Exif.Image.Make`, ...).
    #[serde(default)]
    pub all: Map<String, Value>,
}

/// GPS block in decimal degrees; south and west are negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsInfo {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub timestamp: Option<String>,
    pub location_string: Option<String>,
}

/// `POST /metadata/batch`
///
/// Each entry of `results` is itself a [`MetadataResponse`]-shaped envelope,
/// so one image can fail while the batch as a whole succeeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub status: ApiStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<MetadataResponse>,
}

/// `POST /forensics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForensicsResponse {
    #[serde(default)]
    pub status: ApiStatus,
    pub message: Option<String>,
    pub forensics: Option<ForensicsReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForensicsReport {
    #[serde(default)]
    pub is_tampered: bool,
    #[serde(default)]
    pub tampering_indicators: Vec<TamperingIndicator>,
    pub thumbnail_check: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One reason the server suspects an image was altered after capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TamperingIndicator {
    /// e.g. `time_mismatch`, `editing_software`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Indicator-specific evidence such as `software` or `original_time`.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ForensicsResponse {
    /// `true` only when the call succeeded and the server flagged the image.
    pub fn is_tampered(&self) -> bool {
        self.status.is_success() && self.forensics.as_ref().is_some_and(|f| f.is_tampered)
    }

    pub fn indicators(&self) -> &[TamperingIndicator] {
        self.forensics
            .as_ref()
            .map(|f| f.tampering_indicators.as_slice())
            .unwrap_or_default()
    }
}

/// Deserialize a raw payload into one of the typed views.
pub fn parse_payload<T: DeserializeOwned>(payload: &Value) -> ApiResult<T> {
    T::deserialize(payload)
        .map_err(|e| Failure::new(format!("Unexpected response shape: {e}")))
}
