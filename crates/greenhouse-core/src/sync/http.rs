//! HTTP uploader for the greenhouse REST API.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::models::FieldObservation;
use crate::util::compact_text;

use super::ObservationUploader;

/// Business status code the backend uses for success.
const API_SUCCESS_CODE: i64 = 200;

/// Posts observation batches as `{ "data": [...] }` to the batch endpoint.
#[derive(Clone)]
pub struct HttpObservationUploader {
    config: UploadConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpObservationUploader {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpObservationUploader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct BatchUploadRequest<'a> {
    data: &'a [FieldObservation],
}

/// Response envelope shared by all backend endpoints.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
}

impl HttpObservationUploader {
    pub fn new(config: UploadConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub const fn config(&self) -> &UploadConfig {
        &self.config
    }
}

impl ObservationUploader for HttpObservationUploader {
    async fn upload(&self, batch: &[FieldObservation]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let url = self.config.batch_url();
        tracing::debug!("Uploading {} observations to {}", batch.len(), url);

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&BatchUploadRequest { data: batch });
        if let Some(token) = self.config.auth_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        interpret_upload_response(status, &body)?;

        tracing::info!("Uploaded {} observations", batch.len());
        Ok(())
    }
}

/// Decide whether a backend response acknowledged the upload.
pub fn interpret_upload_response(status: StatusCode, body: &str) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Upload(
            "unauthorized; the API token is missing or expired".to_string(),
        ));
    }

    if !status.is_success() {
        return Err(Error::Upload(format!(
            "backend returned HTTP {}: {}",
            status.as_u16(),
            describe_body(body)
        )));
    }

    let envelope: ApiEnvelope = serde_json::from_str(body).map_err(|error| {
        Error::Upload(format!(
            "invalid response from backend ({error}): {}",
            compact_text(body)
        ))
    })?;

    if envelope.code == API_SUCCESS_CODE {
        Ok(())
    } else {
        let message = envelope
            .msg
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| "request failed".to_string());
        Err(Error::Upload(format!(
            "backend rejected upload (code {}): {}",
            envelope.code,
            compact_text(&message)
        )))
    }
}

fn describe_body(body: &str) -> String {
    serde_json::from_str::<ApiEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.msg)
        .filter(|msg| !msg.trim().is_empty())
        .map_or_else(|| compact_text(body), |msg| compact_text(&msg))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;

    fn record(id: &str) -> FieldObservation {
        FieldObservation {
            id: id.into(),
            crop_type: "tomato".to_string(),
            growth_stage: "flowering".to_string(),
            height: 42.0,
            pest_count: 2,
            notes: String::new(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            synced: false,
        }
    }

    /// Accept one connection, answer with `body`, and hand back the raw request.
    async fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);

            if let Some(head_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buffer[..head_end]).to_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buffer.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8(buffer).unwrap()
    }

    fn split_request(request: &str) -> (String, serde_json::Value) {
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        (head.to_lowercase(), serde_json::from_str(body).unwrap())
    }

    #[test]
    fn success_envelope_is_accepted() {
        let body = r#"{"code":200,"msg":"success","data":"ok"}"#;
        assert!(interpret_upload_response(StatusCode::OK, body).is_ok());
    }

    #[test]
    fn business_error_code_is_rejected_with_message() {
        let body = r#"{"code":500,"msg":"greenhouse not found","data":null}"#;
        let error = interpret_upload_response(StatusCode::OK, body).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("code 500"));
        assert!(message.contains("greenhouse not found"));
    }

    #[test]
    fn business_error_without_message_gets_default() {
        let body = r#"{"code":400}"#;
        let error = interpret_upload_response(StatusCode::OK, body).unwrap_err();
        assert!(error.to_string().contains("request failed"));
    }

    #[test]
    fn unauthorized_is_reported() {
        let error = interpret_upload_response(StatusCode::UNAUTHORIZED, "").unwrap_err();
        assert!(matches!(error, Error::Upload(ref message) if message.contains("unauthorized")));
    }

    #[test]
    fn http_error_prefers_envelope_message() {
        let body = r#"{"code":503,"msg":"maintenance window"}"#;
        let error =
            interpret_upload_response(StatusCode::SERVICE_UNAVAILABLE, body).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("HTTP 503"));
        assert!(message.contains("maintenance window"));
    }

    #[test]
    fn non_json_success_body_is_rejected() {
        let error = interpret_upload_response(StatusCode::OK, "<html>").unwrap_err();
        assert!(error.to_string().contains("invalid response"));
    }

    #[test]
    fn request_body_wraps_records_in_data() {
        let records = vec![record("1")];
        let value = serde_json::to_value(BatchUploadRequest { data: &records }).unwrap();
        assert_eq!(value["data"][0]["cropType"], "tomato");
        assert_eq!(value["data"][0]["pestCount"], 2);
    }

    #[tokio::test]
    async fn empty_batch_skips_network() {
        let uploader =
            HttpObservationUploader::new(UploadConfig::new("http://127.0.0.1:9").unwrap())
                .unwrap();
        assert!(uploader.upload(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn upload_posts_batch_with_bearer_token() {
        let (base_url, server) = serve_once(r#"{"code":200,"msg":"success"}"#).await;
        let config = UploadConfig::new(base_url)
            .unwrap()
            .with_auth_token("field-token");
        let uploader = HttpObservationUploader::new(config).unwrap();

        uploader
            .upload(&[record("obs-1"), record("obs-2")])
            .await
            .unwrap();

        let (head, body) = split_request(&server.await.unwrap());
        assert!(head.starts_with("post /data/upload/batch http/1.1"));
        assert!(head.contains("authorization: bearer field-token"));
        assert!(head.contains("content-type: application/json"));
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["data"][0]["id"], "obs-1");
        assert_eq!(body["data"][1]["cropType"], "tomato");
    }

    #[tokio::test]
    async fn upload_without_token_sends_no_authorization() {
        let (base_url, server) = serve_once(r#"{"code":200}"#).await;
        let uploader = HttpObservationUploader::new(UploadConfig::new(base_url).unwrap()).unwrap();

        uploader.upload(&[record("obs-1")]).await.unwrap();

        let (head, _) = split_request(&server.await.unwrap());
        assert!(!head.contains("authorization:"));
    }

    #[tokio::test]
    async fn upload_rejected_by_envelope_code() {
        let (base_url, server) = serve_once(r#"{"code":500,"msg":"disk full"}"#).await;
        let uploader = HttpObservationUploader::new(UploadConfig::new(base_url).unwrap()).unwrap();

        let error = uploader.upload(&[record("obs-1")]).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(error, Error::Upload(ref message) if message.contains("disk full")));
    }
}
