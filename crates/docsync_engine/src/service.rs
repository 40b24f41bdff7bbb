use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use docsync_core::{Document, DocumentId, FileCandidate, Msg, StatusReport, UploadId};
use docsync_logging::{sync_debug, sync_info};
use serde::de::DeserializeOwned;
use url::Url;

use crate::wire::{
    BatchItem, BatchPayload, DeletePayload, ErrorPayload, ListPayload, MarkdownPayload,
    ProcessedPayload, UploadPayload,
};
use crate::{AcceptedUpload, FailureKind, ServiceError};

const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub upload_chunk_size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8010".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(3),
            upload_chunk_size: 64 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, msg: Msg);
}

pub struct ChannelProgressSink {
    tx: tokio::sync::mpsc::UnboundedSender<Msg>,
}

impl ChannelProgressSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<Msg>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, msg: Msg) {
        let _ = self.tx.send(msg);
    }
}

/// Per-file outcome of a batch upload.
pub type BatchOutcome = Vec<(UploadId, Result<AcceptedUpload, ServiceError>)>;

/// The remote document service.
#[async_trait::async_trait]
pub trait DocumentService: Send + Sync {
    async fn list(&self) -> Result<Vec<Document>, ServiceError>;

    async fn upload_one(
        &self,
        upload_id: UploadId,
        file: &FileCandidate,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<AcceptedUpload, ServiceError>;

    /// Uploads several files in one request. An `Err` means the request as a
    /// whole failed; otherwise every upload id appears exactly once.
    async fn upload_batch(
        &self,
        files: &[(UploadId, FileCandidate)],
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BatchOutcome, ServiceError>;

    async fn delete(&self, id: &DocumentId) -> Result<(), ServiceError>;

    async fn status(&self, id: &DocumentId) -> Result<StatusReport, ServiceError>;

    async fn markdown(&self, id: &DocumentId) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDocumentService {
    settings: ServiceSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestDocumentService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be a base url", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Transport, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn file_part(
        &self,
        upload_id: UploadId,
        file: &FileCandidate,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<reqwest::multipart::Part, ServiceError> {
        let bytes = tokio::fs::read(&file.path).await.map_err(|err| {
            ServiceError::new(
                FailureKind::FileRead,
                format!("{}: {err}", file.path.display()),
            )
        })?;
        let length = bytes.len() as u64;
        let body = progress_body(upload_id, bytes, self.settings.upload_chunk_size, sink);
        reqwest::multipart::Part::stream_with_length(body, length)
            .file_name(file.name.clone())
            .mime_str(PDF_MIME)
            .map_err(|err| ServiceError::new(FailureKind::Transport, err.to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentService for ReqwestDocumentService {
    async fn list(&self) -> Result<Vec<Document>, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&["pdf-list"]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: ListPayload = read_json(response).await?;
        let documents = payload.into_documents();
        sync_debug!("Listed {} documents", documents.len());
        Ok(documents)
    }

    async fn upload_one(
        &self,
        upload_id: UploadId,
        file: &FileCandidate,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<AcceptedUpload, ServiceError> {
        let part = self.file_part(upload_id, file, sink).await?;
        let form = reqwest::multipart::Form::new().part("file", part);
        sync_info!("Uploading {} ({} bytes)", file.name, file.size_bytes);
        let response = self
            .client
            .post(self.endpoint(&["upload-pdf"]))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: UploadPayload = read_json(response).await?;
        payload.into_accepted()
    }

    async fn upload_batch(
        &self,
        files: &[(UploadId, FileCandidate)],
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BatchOutcome, ServiceError> {
        let mut form = reqwest::multipart::Form::new();
        for (upload_id, file) in files {
            let part = self.file_part(*upload_id, file, sink.clone()).await?;
            form = form.part("files", part);
        }
        sync_info!("Uploading batch of {} files", files.len());
        let response = self
            .client
            .post(self.endpoint(&["upload-pdfs-batch"]))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: BatchPayload = read_json(response).await?;
        if let Some(error) = payload.error {
            return Err(ServiceError::new(FailureKind::ServerReported, error));
        }
        if !payload.success {
            return Err(ServiceError::new(
                FailureKind::ServerReported,
                "server rejected the batch",
            ));
        }
        Ok(pair_batch_results(files, payload.results))
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(self.endpoint(&["delete-pdf", id.as_str()]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: DeletePayload = read_json(response).await?;
        payload.into_result()
    }

    async fn status(&self, id: &DocumentId) -> Result<StatusReport, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&["processed", id.as_str()]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: ProcessedPayload = read_json(response).await?;
        payload.into_report()
    }

    async fn markdown(&self, id: &DocumentId) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&["processed", id.as_str(), "markdown"]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: MarkdownPayload = read_json(response).await?;
        Ok(payload.markdown)
    }
}

/// Streams `bytes` in chunks, reporting the share handed to the transport after each one.
fn progress_body(
    upload_id: UploadId,
    bytes: Vec<u8>,
    chunk_size: usize,
    sink: Arc<dyn ProgressSink>,
) -> reqwest::Body {
    let total = bytes.len();
    let data = Bytes::from(bytes);
    let chunk_size = chunk_size.max(1);
    let pieces: Vec<Bytes> = (0..total)
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(total)))
        .collect();

    let mut sent = 0usize;
    let stream = futures_util::stream::iter(pieces.into_iter().map(move |piece| {
        sent += piece.len();
        let percent = (sent * 100 / total.max(1)) as u8;
        sink.emit(Msg::UploadProgress { upload_id, percent });
        Ok::<Bytes, std::io::Error>(piece)
    }));
    reqwest::Body::wrap_stream(stream)
}

/// Pairs batch results with uploads by position, or by filename when the
/// server returned a different number of entries.
fn pair_batch_results(
    files: &[(UploadId, FileCandidate)],
    results: Vec<BatchItem>,
) -> BatchOutcome {
    if results.len() == files.len() {
        return files
            .iter()
            .zip(results)
            .map(|((upload_id, _), item)| (*upload_id, item.into_accepted()))
            .collect();
    }

    let mut remaining: Vec<Option<BatchItem>> = results.into_iter().map(Some).collect();
    files
        .iter()
        .map(|(upload_id, file)| {
            let matched = remaining
                .iter_mut()
                .find(|slot| {
                    slot.as_ref()
                        .is_some_and(|item| item.filename.as_deref() == Some(file.name.as_str()))
                })
                .and_then(Option::take);
            let result = match matched {
                Some(item) => item.into_accepted(),
                None => Err(ServiceError::new(
                    FailureKind::ServerReported,
                    format!("no result for {}", file.name),
                )),
            };
            (*upload_id, result)
        })
        .collect()
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.text().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        let reported = serde_json::from_str::<ErrorPayload>(&body)
            .ok()
            .and_then(|payload| payload.error);
        return Err(match reported {
            Some(message) => ServiceError::new(FailureKind::ServerReported, message),
            None => {
                ServiceError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
            }
        });
    }
    serde_json::from_str(&body)
        .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    ServiceError::new(FailureKind::Transport, err.to_string())
}
