//! HTTP client for the local companion service.
//!
//! The service exposes `GET /status`, `POST /copy-image` and `POST /paste-url`.
//! Every call carries its own timeout; the caller picks it so that liveness
//! hints can shorten a push to a service believed to be down.

use crate::FerryError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body sent to `/copy-image`.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePush<'a> {
    pub image_url: &'a str,
    pub filename: &'a str,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub source: &'a str,
}

/// Body sent to `/paste-url`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LinkPush<'a> {
    pub url: &'a str,
    pub timestamp: i64,
    pub source: &'a str,
}

/// What the service answers on a successful push.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Acknowledgement {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CompanionClient {
    base_url: String,
    client: reqwest::Client,
}

impl CompanionClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The companion service root (e.g., "http://localhost:8590")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("reqwest client build should not fail");
        Self::with_client(client, base_url)
    }

    /// Reuse an existing connection pool.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /status`; any 2xx counts as alive.
    pub async fn status(&self, timeout: Duration) -> Result<(), FerryError> {
        let url = format!("{}/status", self.base_url);
        let resp = self.client.get(url).timeout(timeout).send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(())
    }

    pub async fn push_image(
        &self,
        body: &ImagePush<'_>,
        timeout: Duration,
    ) -> Result<Acknowledgement, FerryError> {
        let url = format!("{}/copy-image", self.base_url);
        let request = self.client.post(url).timeout(timeout).json(body);
        self.execute_ack(request).await
    }

    pub async fn push_link(
        &self,
        body: &LinkPush<'_>,
        timeout: Duration,
    ) -> Result<Acknowledgement, FerryError> {
        let url = format!("{}/paste-url", self.base_url);
        let request = self.client.post(url).timeout(timeout).json(body);
        self.execute_ack(request).await
    }

    /// Execute a push and insist on a JSON object acknowledgement that does
    /// not explicitly report failure.
    async fn execute_ack(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Acknowledgement, FerryError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        let value: serde_json::Value = resp.json().await?;
        if !value.is_object() {
            return Err(FerryError::Refused(
                "acknowledgement is not a JSON object".into(),
            ));
        }
        let ack: Acknowledgement = serde_json::from_value(value)?;
        if ack.success == Some(false) {
            let reason = ack
                .message
                .clone()
                .unwrap_or_else(|| "service reported failure".into());
            return Err(FerryError::Refused(reason));
        }
        Ok(ack)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> FerryError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        FerryError::Status {
            status,
            body: body_snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_push_uses_camel_case_fields() {
        let body = ImagePush {
            image_url: "https://x/y.png",
            filename: "browser_1.png",
            timestamp: 42,
            source: "media-ferry",
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["imageUrl"], "https://x/y.png");
        assert_eq!(v["filename"], "browser_1.png");
        assert_eq!(v["timestamp"], 42);
    }

    #[test]
    fn acknowledgement_fields_are_optional() {
        let ack: Acknowledgement = serde_json::from_str("{}").unwrap();
        assert_eq!(ack, Acknowledgement::default());
        let ack: Acknowledgement =
            serde_json::from_str(r#"{"success":true,"filename":"a.png","path":"/x"}"#).unwrap();
        assert_eq!(ack.filename.as_deref(), Some("a.png"));
        assert_eq!(ack.success, Some(true));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = CompanionClient::new("http://localhost:8590/");
        assert_eq!(client.base_url(), "http://localhost:8590");
    }
}
