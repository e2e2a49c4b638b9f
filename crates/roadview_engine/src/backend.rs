use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::{
    BackendError, EngineConfig, EngineEvent, FailureKind, JobId, MetricsReport, StagedFile,
    StatusReport,
};

pub type FeedStream = BoxStream<'static, Result<Bytes, BackendError>>;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// HTTP surface of the processing backend.
#[async_trait::async_trait]
pub trait BackendClient: Send + Sync {
    /// `POST /api/upload`; returns the job id assigned by the backend.
    async fn upload(&self, path: &Path) -> Result<JobId, BackendError>;

    /// `GET /api/jobs/{id}`.
    async fn job_status(&self, job_id: &str) -> Result<StatusReport, BackendError>;

    /// `GET /api/download/{id}`, streamed into `dest`. Returns the byte count.
    async fn download_result(&self, job_id: &str, dest: &mut StagedFile)
        -> Result<u64, BackendError>;

    /// `POST /upload` for the single-stream mode.
    async fn upload_live(&self, path: &Path) -> Result<(), BackendError>;

    /// `GET /video_feed?t={cache_bust}`; yields raw chunks until the feed ends.
    async fn open_feed(&self, cache_bust: i64) -> Result<FeedStream, BackendError>;

    /// `GET /status`.
    async fn metrics(&self) -> Result<MetricsReport, BackendError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    job_id: JobId,
}

#[derive(Debug, Deserialize)]
struct LiveUploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base_url: Url,
    client: reqwest::Client,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl ReqwestBackend {
    pub fn new(config: &EngineConfig) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", config.base_url),
            ));
        }
        base_url.set_query(None);

        // No client-wide timeout: the feed and downloads are long-lived streams.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base_url,
            client,
            request_timeout: config.request_timeout,
            upload_timeout: config.upload_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, escaping each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_file(&self, url: Url, path: &Path) -> Result<Response, BackendError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| {
                BackendError::new(FailureKind::Io, format!("{}: {err}", path.display()))
            })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        let form = Form::new().part("file", Part::bytes(data).file_name(filename));

        self.client
            .post(url)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)
    }

    async fn get(&self, url: Url, timeout: Option<Duration>) -> Result<Response, BackendError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        ensure_success(response)
    }
}

#[async_trait::async_trait]
impl BackendClient for ReqwestBackend {
    async fn upload(&self, path: &Path) -> Result<JobId, BackendError> {
        let response = self.post_file(self.endpoint(&["api", "upload"]), path).await?;
        let body: UploadResponse = read_json(ensure_success(response)?).await?;
        Ok(body.job_id)
    }

    async fn job_status(&self, job_id: &str) -> Result<StatusReport, BackendError> {
        let url = self.endpoint(&["api", "jobs", job_id]);
        let response = self.get(url, Some(self.request_timeout)).await?;
        read_json(response).await
    }

    async fn download_result(
        &self,
        job_id: &str,
        dest: &mut StagedFile,
    ) -> Result<u64, BackendError> {
        let url = self.endpoint(&["api", "download", job_id]);
        let response = self.get(url, None).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            dest.append(&chunk)
                .map_err(|err| BackendError::new(FailureKind::Io, err.to_string()))?;
        }
        Ok(dest.len())
    }

    async fn upload_live(&self, path: &Path) -> Result<(), BackendError> {
        let response = self.post_file(self.endpoint(&["upload"]), path).await?;
        let body: LiveUploadResponse = read_json(ensure_success(response)?).await?;
        if body.success {
            Ok(())
        } else {
            Err(BackendError::new(
                FailureKind::Rejected,
                body.error.unwrap_or_else(|| "upload not accepted".to_string()),
            ))
        }
    }

    async fn open_feed(&self, cache_bust: i64) -> Result<FeedStream, BackendError> {
        let mut url = self.endpoint(&["video_feed"]);
        url.query_pairs_mut()
            .append_pair("t", &cache_bust.to_string());
        let response = self.get(url, None).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error))
            .boxed())
    }

    async fn metrics(&self) -> Result<MetricsReport, BackendError> {
        let response = self
            .get(self.endpoint(&["status"]), Some(self.request_timeout))
            .await?;
        read_json(response).await
    }
}

fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}
