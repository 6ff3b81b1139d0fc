//! # image-forensics-client
//!
//! Async client for an image metadata extraction and tamper forensics HTTP service.
//!
//! The service does the real work (EXIF/IPTC/XMP extraction, consistency checks that flag
//! edited images); this crate builds the multipart uploads, sends them, and hands back the
//! parsed JSON or a uniform [`Failure`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_forensics::{ForensicsClient, ForensicsService};
//! use image_forensics::image::ImageInput;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ForensicsClient::new("http://localhost:8080");
//!
//!     // Every call yields exactly one ApiResult; nothing panics or retries.
//!     match client.check_health().await {
//!         Ok(health) => println!("Service up: {health}"),
//!         Err(failure) => eprintln!("Service down: {failure}"),
//!     }
//!
//!     let image = ImageInput::from_path("evidence.jpg".as_ref()).await?;
//!     let metadata = client.extract_metadata(&image).await?;
//!     println!("{metadata:#}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoints
//!
//! | Operation | Request | Multipart field |
//! |-----------|---------|-----------------|
//! | [`check_health`](ForensicsService::check_health) | `GET /health` | — |
//! | [`extract_metadata`](ForensicsService::extract_metadata) | `POST /metadata` | `image` |
//! | [`batch_extract_metadata`](ForensicsService::batch_extract_metadata) | `POST /metadata/batch` | `images[]` (repeated) |
//! | [`analyze_forensics`](ForensicsService::analyze_forensics) | `POST /forensics` | `image` |
//!
//! ## Modules
//!
//! - [`client`] — The service trait and its HTTP implementation
//! - [`config`] — Configuration types and loading/saving
//! - [`error`] — The [`Failure`] value every operation can return
//! - [`image`] — Upload inputs, MIME detection, and image collection
//! - [`models`] — Typed views over the service's JSON envelopes
//! - [`report`] — Tamper verdict summaries and result rendering

pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod models;
pub mod report;

pub use client::{ForensicsClient, ForensicsService};
pub use config::ClientConfig;
pub use error::{ApiResult, Failure};
pub use image::ImageInput;
