//! Upload dispatcher client and the direct-to-storage transport.
//!
//! The dispatcher is an external service that validates a proposed upload's
//! metadata and answers with a time-limited signed write URL plus the
//! canonical storage path. Both it and the signed-URL PUT sit behind traits
//! so the lifecycle tests can count invocations.

use async_trait::async_trait;
use bytes::Bytes;
use portico_core::models::{DispatchRequest, DispatchResponse, DispatchTicket};
use portico_core::AppError;

/// Dispatcher handshake. One attempt, no retry; a rejection is terminal and
/// the upstream body is surfaced to the caller for diagnostics.
#[async_trait]
pub trait UploadDispatcher: Send + Sync {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchTicket, AppError>;
}

/// Raw PUT of file bytes to a dispatcher-issued signed URL.
#[async_trait]
pub trait SignedUrlTransport: Send + Sync {
    async fn put(&self, signed_url: &str, data: Bytes, content_type: &str)
        -> Result<(), AppError>;
}

pub struct HttpUploadDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploadDispatcher {
    pub fn new(endpoint: String) -> Self {
        HttpUploadDispatcher {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl UploadDispatcher for HttpUploadDispatcher {
    #[tracing::instrument(skip(self, request), fields(file_name = %request.file_name, user_id = %request.user_id))]
    async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchTicket, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::DispatcherRejected {
                status: 0,
                body: format!("dispatcher unreachable: {}", e),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::DispatcherRejected {
                status,
                body: format!("unreadable dispatcher response: {}", e),
            })?;

        if !(200..300).contains(&status) {
            return Err(AppError::DispatcherRejected { status, body });
        }

        let parsed: DispatchResponse =
            serde_json::from_str(&body).map_err(|_| AppError::DispatcherRejected {
                status,
                body: body.clone(),
            })?;

        if parsed.status != "success" {
            return Err(AppError::DispatcherRejected { status, body });
        }

        match (parsed.signed_url, parsed.upload_path) {
            (Some(signed_url), Some(upload_path)) => Ok(DispatchTicket {
                signed_url,
                upload_path,
            }),
            _ => Err(AppError::DispatcherRejected { status, body }),
        }
    }
}

pub struct HttpSignedUrlTransport {
    client: reqwest::Client,
}

impl HttpSignedUrlTransport {
    pub fn new() -> Self {
        HttpSignedUrlTransport {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSignedUrlTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignedUrlTransport for HttpSignedUrlTransport {
    #[tracing::instrument(skip(self, signed_url, data), fields(size = data.len()))]
    async fn put(
        &self,
        signed_url: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .put(signed_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::StorageWriteFailed {
                status: 0,
                body: format!("storage unreachable: {}", e),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageWriteFailed { status, body });
        }

        Ok(())
    }
}
