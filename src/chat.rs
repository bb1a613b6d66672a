//! Chat-completion collaborator: trait, HTTP client, and a scripted mock.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::message::Message;
use crate::types::{AssistantError, Result};

/// External chat-completion collaborator.
///
/// Takes the full ordered message list for the turn and returns a single
/// reply string. Temperature is optional; when absent the service default
/// applies.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, messages: &[Message], temperature: Option<f32>) -> Result<String>;
}

/// Client for an OpenAI-compatible `/chat/completions` deployment route.
pub struct OpenAiChat {
    endpoint: Url,
    api_key: String,
    api_version: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(
        endpoint: Url,
        api_key: String,
        api_version: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            api_key,
            api_version,
            model,
            client,
        })
    }

    fn request_url(&self) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(&format!("openai/deployments/{}/chat/completions", self.model))
            .map_err(|err| AssistantError::Config(format!("invalid chat endpoint: {err}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(&self, messages: &[Message], temperature: Option<f32>) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature,
        };
        let response = self
            .client
            .post(self.request_url()?)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Chat(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| AssistantError::Chat(format!("malformed response: {err}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::Chat("response carried no choices".into()))
    }
}

/// Scripted in-process provider for tests and offline runs.
///
/// Returns one fixed reply (or a fixed failure) and records every call it
/// serves, so tests can assert on what reached the collaborator.
pub mod scripted {
    use std::sync::Mutex;

    use super::*;

    pub struct ScriptedChat {
        pub reply: String,
        pub calls: Mutex<Vec<(Vec<Message>, Option<f32>)>>,
        pub fail: bool,
    }

    impl ScriptedChat {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: String::new(),
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn complete(
            &self,
            messages: &[Message],
            temperature: Option<f32>,
        ) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), temperature));
            if self.fail {
                Err(AssistantError::Chat("scripted failure".into()))
            } else {
                Ok(self.reply.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_omitted_when_none() {
        let body = ChatRequest {
            model: "o4-mini",
            messages: &[Message::user("hi")],
            temperature: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("temperature"));

        let body = ChatRequest {
            model: "o4-mini",
            messages: &[Message::user("hi")],
            temperature: Some(0.2),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"temperature\":0.2"));
    }
}
