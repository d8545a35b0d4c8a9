//! HTTP 传输层
//!
//! `WebhookTransport` 是 worker 与网络之间的接缝：生产环境使用基于 reqwest 的
//! `HttpTransport`，测试中替换为脚本化的实现。

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::DeliveryError;

/// 响应体截断长度（仅用于日志）
const MAX_LOGGED_BODY: usize = 1024;

/// 发送一次 JSON POST
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// 成功（2xx）时返回状态码，其他情况返回错误
    async fn post_json(
        &self,
        url: &str,
        body: Arc<str>,
        timeout: Duration,
    ) -> Result<u16, DeliveryError>;
}

/// 基于 reqwest 的传输实现
///
/// 内部 `Client` 自带连接池，可被任意多个 worker 并发共享。
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(concat!("build-webhook-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: Arc<str>,
        timeout: Duration,
    ) -> Result<u16, DeliveryError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }

        let text = match response.text().await {
            Ok(text) => truncate(text),
            Err(e) => {
                debug!(url = %url, error = %e, "Failed to read response body");
                String::new()
            }
        };
        Err(DeliveryError::status(status.as_u16(), text))
    }
}

fn classify(e: reqwest::Error, timeout: Duration) -> DeliveryError {
    if e.is_timeout() {
        DeliveryError::timeout(timeout)
    } else {
        DeliveryError::from(e)
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_LOGGED_BODY {
        let mut end = MAX_LOGGED_BODY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"summary": "hi"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let status = transport
            .post_json(
                &format!("{}/hook", server.uri()),
                Arc::from(r#"{"summary":"hi"}"#),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_non_2xx_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let err = transport
            .post_json(&server.uri(), Arc::from("{}"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::status(500, "boom"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let err = transport
            .post_json(&server.uri(), Arc::from("{}"), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .post_json("http://127.0.0.1:9/hook", Arc::from("{}"), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "x".repeat(2000);
        let out = truncate(long);
        assert_eq!(out.len(), MAX_LOGGED_BODY + 3);
        assert!(out.ends_with("..."));
        assert_eq!(truncate("short".to_string()), "short");
    }
}
