//! Client for the text generator behind the info endpoints.

use axum::http::StatusCode;
use regioni_shared::FALLBACK_INFO;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UpstreamConfig;

const BODY_PREVIEW_CHARS: usize = 200;

/// Failure talking to the generator. The display text is what the browser
/// sees, so timeout and connect messages carry the retry markers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("info service timeout, please try again")]
    Timeout,
    #[error("could not connect to the info service")]
    Connect,
    #[error("info service returned status {0}")]
    Status(u16),
    #[error("info service returned an unreadable reply")]
    Decode,
    #[error("info service request failed")]
    Request,
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        // A connect timeout is reported as both; the timeout wins.
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_connect() {
            UpstreamError::Connect
        } else if let Some(status) = e.status() {
            UpstreamError::Status(status.as_u16())
        } else if e.is_decode() || e.is_body() {
            UpstreamError::Decode
        } else {
            UpstreamError::Request
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: Option<String>,
}

/// One non-streaming generation. A reply without text yields [`FALLBACK_INFO`].
pub async fn generate(
    client: &reqwest::Client,
    upstream: &UpstreamConfig,
    prompt: &str,
) -> Result<String, UpstreamError> {
    let resp = client
        .post(&upstream.generate_url)
        .json(&GenerateRequest {
            model: &upstream.model,
            prompt,
            stream: false,
        })
        .send()
        .await?;
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        tracing::warn!(
            status = status.as_u16(),
            body_preview = %preview(&bytes),
            "generator returned an error status"
        );
        return Err(UpstreamError::Status(status.as_u16()));
    }

    let reply: GenerateReply = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!(error = %e, body_preview = %preview(&bytes), "failed to decode generator reply");
        UpstreamError::Decode
    })?;
    Ok(reply
        .response
        .unwrap_or_else(|| FALLBACK_INFO.to_string()))
}

fn preview(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(BODY_PREVIEW_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::Json;
    use axum::routing::post;

    use super::*;

    fn upstream_at(url: String) -> UpstreamConfig {
        UpstreamConfig {
            generate_url: url,
            model: "mario".to_string(),
            general_prompt: "Introduce yourself".to_string(),
            request_timeout: Duration::from_millis(300),
            connect_timeout: Duration::from_millis(300),
        }
    }

    fn client_for(upstream: &UpstreamConfig) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(upstream.request_timeout)
            .connect_timeout(upstream.connect_timeout)
            .build()
            .expect("build test client")
    }

    async fn spawn_generator(app: axum::Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind generator");
        let addr = listener.local_addr().expect("generator address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve generator");
        });
        addr
    }

    #[tokio::test]
    async fn forwards_model_prompt_and_returns_text() {
        let app = axum::Router::new().route(
            "/api/generate",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "mario");
                assert_eq!(body["stream"], false);
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                Json(serde_json::json!({ "response": format!("About {prompt}") }))
            }),
        );
        let addr = spawn_generator(app).await;
        let upstream = upstream_at(format!("http://{addr}/api/generate"));

        let text = generate(&client_for(&upstream), &upstream, "Lazio")
            .await
            .expect("generate");
        assert_eq!(text, "About Lazio");
    }

    #[tokio::test]
    async fn missing_response_field_yields_fallback() {
        let app = axum::Router::new().route(
            "/api/generate",
            post(|| async { Json(serde_json::json!({ "done": true })) }),
        );
        let addr = spawn_generator(app).await;
        let upstream = upstream_at(format!("http://{addr}/api/generate"));

        let text = generate(&client_for(&upstream), &upstream, "Molise")
            .await
            .expect("generate");
        assert_eq!(text, FALLBACK_INFO);
    }

    #[tokio::test]
    async fn error_status_and_garbage_are_classified() {
        let app = axum::Router::new()
            .route(
                "/missing",
                post(|| async { (StatusCode::NOT_FOUND, "model not found") }),
            )
            .route("/garbage", post(|| async { "not json" }));
        let addr = spawn_generator(app).await;

        let upstream = upstream_at(format!("http://{addr}/missing"));
        let err = generate(&client_for(&upstream), &upstream, "Puglia")
            .await
            .expect_err("status error");
        assert_eq!(err, UpstreamError::Status(404));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let upstream = upstream_at(format!("http://{addr}/garbage"));
        let err = generate(&client_for(&upstream), &upstream, "Puglia")
            .await
            .expect_err("decode error");
        assert_eq!(err, UpstreamError::Decode);
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let app = axum::Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({ "response": "too late" }))
            }),
        );
        let addr = spawn_generator(app).await;
        let upstream = upstream_at(format!("http://{addr}/api/generate"));

        let err = generate(&client_for(&upstream), &upstream, "Sardegna")
            .await
            .expect_err("timeout");
        assert_eq!(err, UpstreamError::Timeout);
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.to_string().contains("try again"));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind probe");
        let addr = listener.local_addr().expect("probe address");
        drop(listener);
        let upstream = upstream_at(format!("http://{addr}/api/generate"));

        let err = generate(&client_for(&upstream), &upstream, "Liguria")
            .await
            .expect_err("connect error");
        assert_eq!(err, UpstreamError::Connect);
        assert!(err.to_string().contains("connect"));
    }
}
