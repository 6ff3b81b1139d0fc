use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::{ApiResult, Failure};
use crate::image::ImageInput;

/// Multipart field carrying the image for single-image endpoints.
pub const IMAGE_FIELD: &str = "image";
/// Multipart field repeated once per image for the batch endpoint.
pub const BATCH_IMAGE_FIELD: &str = "images[]";

/// The operations offered by the image forensics service.
///
/// [`ForensicsClient`] is the HTTP implementation. Every method resolves to
/// exactly one [`ApiResult`]: the parsed JSON body on success, a [`Failure`]
/// carrying the error text otherwise. Nothing is retried.
///
/// # Example
///
/// ```rust,no_run
/// use image_forensics::{ForensicsClient, ForensicsService};
/// use image_forensics::models::{ForensicsResponse, parse_payload};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = ForensicsClient::new("http://localhost:8080");
///
/// let payload = client.analyze_forensics_file("evidence.jpg".as_ref()).await?;
/// let report: ForensicsResponse = parse_payload(&payload)?;
/// if report.is_tampered() {
///     for indicator in report.indicators() {
///         println!("{}", indicator.description);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait ForensicsService: Send + Sync {
    /// The service root every endpoint is resolved against.
    fn base_url(&self) -> &str;

    /// `GET /health`, no body.
    async fn check_health(&self) -> ApiResult;

    /// `POST /metadata` with the image in field `image`.
    async fn extract_metadata(&self, image: &ImageInput) -> ApiResult;

    /// `POST /metadata/batch` with one `images[]` field per input, in order.
    ///
    /// The batch is a single request: it succeeds or fails as a whole. An
    /// empty slice still sends a request with no image fields.
    async fn batch_extract_metadata(&self, images: &[ImageInput]) -> ApiResult;

    /// `POST /forensics` with the image in field `image`.
    async fn analyze_forensics(&self, image: &ImageInput) -> ApiResult;

    /// Read `path` and call [`extract_metadata`](Self::extract_metadata).
    ///
    /// A missing or unreadable file fails without contacting the service.
    async fn extract_metadata_file(&self, path: &Path) -> ApiResult {
        let image = read_image(path).await?;
        self.extract_metadata(&image).await
    }

    /// Read every path and call [`batch_extract_metadata`](Self::batch_extract_metadata).
    ///
    /// The first unreadable path fails the whole batch before anything is sent.
    async fn batch_extract_metadata_files(&self, paths: &[PathBuf]) -> ApiResult {
        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            images.push(read_image(path).await?);
        }
        self.batch_extract_metadata(&images).await
    }

    /// Read `path` and call [`analyze_forensics`](Self::analyze_forensics).
    async fn analyze_forensics_file(&self, path: &Path) -> ApiResult {
        let image = read_image(path).await?;
        self.analyze_forensics(&image).await
    }
}

/// HTTP client for the forensics service.
///
/// Holds only its configuration and a pooled [`reqwest::Client`]; cloning is
/// cheap and clones share the connection pool. Concurrent calls are
/// independent of each other.
#[derive(Debug, Clone)]
pub struct ForensicsClient {
    config: ClientConfig,
    client: Client,
}

impl Default for ForensicsClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ForensicsClient {
    /// Client for `base_url` with no request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(base_url),
            client: Client::new(),
        }
    }

    /// Client honouring every setting in `config`, including the timeout.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::from_config_with(config, Client::builder())
    }

    /// Like [`from_config`](Self::from_config), starting from a caller's
    /// [`ClientBuilder`] (proxies, TLS roots, ...).
    pub fn from_config_with(config: ClientConfig, mut builder: ClientBuilder) -> Result<Self> {
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    /// Use a caller-provided [`reqwest::Client`] (proxies, TLS roots, ...).
    pub fn with_http_client(config: ClientConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.normalized_base_url())
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path);
        log::debug!("GET {url}");
        send_json(self.client.get(&url), &format!("GET {url}")).await
    }

    async fn post_form(&self, path: &str, form: Form, images: usize) -> Result<Value> {
        let url = self.endpoint(path);
        log::debug!("POST {url} ({images} image(s))");
        send_json(self.client.post(&url).multipart(form), &format!("POST {url}")).await
    }

    /// POST a multipart document with no parts.
    ///
    /// reqwest streams an empty body for a part-less `Form`, which lacks the
    /// closing delimiter and is rejected by multipart parsers.
    async fn post_empty_form(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path);
        let form = Form::new();
        let boundary = form.boundary();
        log::debug!("POST {url} (0 image(s))");
        let request = self
            .client
            .post(&url)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(empty_multipart_body(boundary));
        send_json(request, &format!("POST {url}")).await
    }
}

#[async_trait::async_trait]
impl ForensicsService for ForensicsClient {
    fn base_url(&self) -> &str {
        self.config.normalized_base_url()
    }

    async fn check_health(&self) -> ApiResult {
        settle("Health check", self.get_json("/health").await)
    }

    async fn extract_metadata(&self, image: &ImageInput) -> ApiResult {
        let result: Result<Value> = async {
            let form = Form::new().part(IMAGE_FIELD, image_part(image)?);
            self.post_form("/metadata", form, 1).await
        }
        .await;
        settle("Metadata extraction", result)
    }

    async fn batch_extract_metadata(&self, images: &[ImageInput]) -> ApiResult {
        if images.is_empty() {
            return settle(
                "Batch metadata extraction",
                self.post_empty_form("/metadata/batch").await,
            );
        }
        let result: Result<Value> = async {
            let mut form = Form::new();
            for image in images {
                form = form.part(BATCH_IMAGE_FIELD, image_part(image)?);
            }
            self.post_form("/metadata/batch", form, images.len()).await
        }
        .await;
        settle("Batch metadata extraction", result)
    }

    async fn analyze_forensics(&self, image: &ImageInput) -> ApiResult {
        let result: Result<Value> = async {
            let form = Form::new().part(IMAGE_FIELD, image_part(image)?);
            self.post_form("/forensics", form, 1).await
        }
        .await;
        settle("Forensics analysis", result)
    }
}

/// Build the multipart part for one image.
fn image_part(image: &ImageInput) -> Result<Part> {
    Part::bytes(image.bytes.clone())
        .file_name(image.filename.clone())
        .mime_str(&image.mime_type)
        .with_context(|| {
            format!(
                "Invalid MIME type {:?} for {}",
                image.mime_type, image.filename
            )
        })
}

/// A complete multipart document with zero parts: just the close delimiter.
fn empty_multipart_body(boundary: &str) -> String {
    format!("--{boundary}--\r\n")
}

/// Read an upload from disk, logging the failure like any other call.
async fn read_image(path: &Path) -> ApiResult<ImageInput> {
    settle("Reading image", ImageInput::from_path(path).await)
}

/// Send once, require a 2xx status, and parse the body as JSON.
async fn send_json(request: RequestBuilder, label: &str) -> Result<Value> {
    let resp = request
        .send()
        .await
        .with_context(|| format!("{label} failed"))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .with_context(|| format!("Failed to read {label} response"))?;

    if !status.is_success() {
        anyhow::bail!(error_message(label, status, &text));
    }

    serde_json::from_str(&text).with_context(|| format!("Failed to parse {label} response JSON"))
}

/// Message for a non-2xx response: the server's own `message` when it sent an
/// error envelope, the status and raw body otherwise.
fn error_message(label: &str, status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| format!("{label} returned {status}: {}", body.trim()))
}

fn settle<T>(operation: &str, result: Result<T>) -> ApiResult<T> {
    result.map_err(|e| {
        log::warn!("{operation} failed: {e:#}");
        Failure::from(e)
    })
}
