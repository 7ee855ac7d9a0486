//! Shopping assistant client.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};
use url::Url;

use super::types::{ChatRequest, ChatResponse};
use super::BackendError;
use crate::config::BackendConfig;

/// Shown in place of an answer when the assistant fails.
pub const CHAT_APOLOGY: &str =
    "Sorry, there was an error processing your message. Please try again.";

/// Shown when a chat starts.
pub const CHAT_GREETING: &str = "Hi! I'm your shopping assistant. How can I help you today?";

/// Client for the chat assistant service.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<ChatClientInner>,
}

struct ChatClientInner {
    client: reqwest::Client,
    endpoint: Url,
}

impl ChatClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_base_url(config.ai_url.clone(), config.timeout)
    }

    /// Create a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_base_url(mut base_url: Url, timeout: Duration) -> Result<Self, BackendError> {
        if let Ok(mut path) = base_url.path_segments_mut() {
            path.pop_if_empty().extend(["chat", "generate"]);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(ChatClientInner {
                client,
                endpoint: base_url,
            }),
        })
    }

    /// Ask the assistant, given a short description of the page the shopper is on.
    ///
    /// # Errors
    ///
    /// Returns error on any transport, status or decoding failure.
    #[instrument(skip(self, message), fields(len = message.len()))]
    pub async fn generate(&self, message: &str, context: &str) -> Result<String, BackendError> {
        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&ChatRequest { message, context })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: "Failed to get chat response".to_string(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(body.response)
    }

    /// Like [`generate`](Self::generate), but any failure becomes the fixed
    /// apology so the conversation can continue.
    pub async fn reply(&self, message: &str, context: &str) -> String {
        match self.generate(message, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Chat assistant failed");
                CHAT_APOLOGY.to_string()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ChatClient {
        ChatClient::with_base_url(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reply_passes_message_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .and(body_json(serde_json::json!({
                "message": "Any headphones on sale?",
                "context": "home page"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Yes, two models are discounted."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server)
            .reply("Any headphones on sale?", "home page")
            .await;
        assert_eq!(answer, "Yes, two models are discounted.");
    }

    #[tokio::test]
    async fn test_reply_apologizes_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.generate("hi", "").await.is_err());
        assert_eq!(client.reply("hi", "").await, CHAT_APOLOGY);
    }

    #[tokio::test]
    async fn test_reply_apologizes_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "wrong field"
            })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).reply("hi", "").await, CHAT_APOLOGY);
    }
}
