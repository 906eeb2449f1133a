//! Chat completion proxy.
//!
//! [`OpenAiCompletion`] talks to the `OpenAI` chat completions API through
//! `openai_dive`. Handlers depend on the [`Completion`] trait only.

use async_trait::async_trait;
use openai_dive::v1::api::Client;
use openai_dive::v1::resources::chat::{
    ChatCompletionParameters, ChatCompletionParametersBuilder,
    ChatCompletionResponse, ChatMessage, ChatMessageContent,
    ChatMessageContentPart,
};
use thiserror::Error;
use tracing::instrument;
use types::SimpleChatMessage;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("completion API request failed: {0}")]
    Api(String),

    #[error("invalid conversation history: {0}")]
    InvalidHistory(#[from] serde_json::Error),

    #[error("failed to build completion request: {0}")]
    Request(String),

    #[error("completion API returned no choices")]
    EmptyResponse,

    #[error("no completion API key configured")]
    NotConfigured,
}

/// A reply together with the history it was appended to.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub reply: String,
    pub history: Vec<SimpleChatMessage>,
}

#[async_trait]
pub trait Completion: Send + Sync {
    /// Sends `message` as the next user turn of `history` and returns the
    /// reply. The returned history ends with the user turn followed by the
    /// assistant turn.
    async fn generate(
        &self,
        message: &str,
        history: Vec<SimpleChatMessage>,
    ) -> Result<Generated, ProxyError>;
}

pub struct OpenAiCompletion {
    client: Client,
    model: String,
    instructions: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(
        api_key: String,
        model: String,
        instructions: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(api_key),
            model,
            instructions,
        }
    }
}

#[async_trait]
impl Completion for OpenAiCompletion {
    #[instrument(skip(self, history), fields(history_len = history.len()))]
    async fn generate(
        &self,
        message: &str,
        history: Vec<SimpleChatMessage>,
    ) -> Result<Generated, ProxyError> {
        let mut history = history;
        history.push(SimpleChatMessage::user(message));

        let parameters = build_parameters(
            &history,
            &self.model,
            self.instructions.as_deref(),
        )?;

        let response =
            self.client.chat().create(parameters).await.map_err(|e| {
                tracing::error!("Failed to complete chat: {:?}", e);
                ProxyError::Api(format!("{e:?}"))
            })?;

        append_reply(history, &response)
    }
}

/// `history` already ends with the user turn that produced `response`.
fn append_reply(
    mut history: Vec<SimpleChatMessage>,
    response: &ChatCompletionResponse,
) -> Result<Generated, ProxyError> {
    let reply = convert_chat_completion(response)?;
    history.push(SimpleChatMessage::assistant(reply.clone()));

    Ok(Generated { reply, history })
}

/// Used when no API key is configured, so the rest of the server can still
/// run.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredCompletion;

#[async_trait]
impl Completion for UnconfiguredCompletion {
    async fn generate(
        &self,
        _message: &str,
        _history: Vec<SimpleChatMessage>,
    ) -> Result<Generated, ProxyError> {
        Err(ProxyError::NotConfigured)
    }
}

/// `SimpleChatMessage` already has the wire shape of a chat message, so the
/// conversion goes through JSON rather than matching every role.
fn to_chat_message(
    message: &SimpleChatMessage,
) -> Result<ChatMessage, ProxyError> {
    Ok(serde_json::from_value(serde_json::to_value(message)?)?)
}

fn build_messages(
    history: &[SimpleChatMessage],
    instructions: Option<&str>,
) -> Result<Vec<ChatMessage>, ProxyError> {
    let system = instructions.map(|text| ChatMessage::System {
        name: None,
        content: ChatMessageContent::Text(text.to_string()),
    });

    system
        .into_iter()
        .map(Ok)
        .chain(history.iter().map(to_chat_message))
        .collect()
}

fn build_parameters(
    history: &[SimpleChatMessage],
    model: &str,
    instructions: Option<&str>,
) -> Result<ChatCompletionParameters, ProxyError> {
    ChatCompletionParametersBuilder::default()
        .model(model.to_string())
        .messages(build_messages(history, instructions)?)
        .build()
        .map_err(|e| ProxyError::Request(e.to_string()))
}

fn convert_chat_completion(
    response: &ChatCompletionResponse,
) -> Result<String, ProxyError> {
    let choice = response.choices.first().ok_or(ProxyError::EmptyResponse)?;

    match &choice.finish_reason {
        Some(reason) => {
            tracing::info!("Finish reason: {:?}", reason);
        }
        None => {
            tracing::info!("No finish reason provided");
        }
    }

    let content = match &choice.message {
        ChatMessage::Assistant { content, .. } => content.clone(),
        other => {
            tracing::warn!("unexpected message in completion: {:?}", other);
            None
        }
    };

    Ok(match content {
        None | Some(ChatMessageContent::None) => String::new(),
        Some(ChatMessageContent::Text(text)) => text,
        Some(ChatMessageContent::ContentPart(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                ChatMessageContentPart::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use types::Role;

    fn completion_response(choices: Value) -> ChatCompletionResponse {
        serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": choices,
        }))
        .unwrap()
    }

    fn assistant_choice(content: Value) -> Value {
        json!([{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }])
    }

    #[test]
    fn test_text_reply() {
        let response =
            completion_response(assistant_choice(json!("Try Kind of Blue.")));

        assert_eq!(
            convert_chat_completion(&response).unwrap(),
            "Try Kind of Blue."
        );
    }

    #[test]
    fn test_missing_content_is_empty_reply() {
        let response = completion_response(assistant_choice(Value::Null));

        assert_eq!(convert_chat_completion(&response).unwrap(), "");
    }

    #[test]
    fn test_content_parts_are_joined() {
        let response = completion_response(assistant_choice(json!([
            { "type": "text", "text": "Try " },
            { "type": "text", "text": "Coltrane." },
        ])));

        assert_eq!(
            convert_chat_completion(&response).unwrap(),
            "Try Coltrane."
        );
    }

    #[test]
    fn test_no_choices_is_an_error() {
        let response = completion_response(json!([]));

        assert!(matches!(
            convert_chat_completion(&response),
            Err(ProxyError::EmptyResponse)
        ));
    }

    #[test]
    fn test_reply_is_appended_after_user_turn() {
        let history = vec![
            SimpleChatMessage::user("hi"),
            SimpleChatMessage::assistant("hello"),
            SimpleChatMessage::user("something mellow"),
        ];
        let response =
            completion_response(assistant_choice(json!("Try Nick Drake.")));

        let generated = append_reply(history, &response).unwrap();

        assert_eq!(generated.reply, "Try Nick Drake.");
        assert_eq!(generated.history.len(), 4);
        assert_eq!(
            generated.history[2],
            SimpleChatMessage::user("something mellow")
        );
        assert_eq!(
            generated.history[3],
            SimpleChatMessage::assistant("Try Nick Drake.")
        );
    }

    #[test]
    fn test_empty_response_fails_generation() {
        let response = completion_response(json!([]));

        let result =
            append_reply(vec![SimpleChatMessage::user("hi")], &response);

        assert!(matches!(result, Err(ProxyError::EmptyResponse)));
    }

    #[test]
    fn test_system_and_developer_turns_are_forwarded() {
        let system = SimpleChatMessage {
            content: "You recommend music.".to_string(),
            role: Role::System,
        };
        let developer = SimpleChatMessage {
            content: "Answer in one line.".to_string(),
            role: Role::Developer,
        };

        assert!(matches!(
            to_chat_message(&system).unwrap(),
            ChatMessage::System { .. }
        ));
        assert!(matches!(
            to_chat_message(&developer).unwrap(),
            ChatMessage::Developer { .. }
        ));
    }

    #[test]
    fn test_user_turn_becomes_user_message() {
        let turn = SimpleChatMessage::user("recommend jazz");

        let message = to_chat_message(&turn).unwrap();

        match message {
            ChatMessage::User {
                content: ChatMessageContent::Text(text),
                ..
            } => assert_eq!(text, "recommend jazz"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_assistant_turn_becomes_assistant_message() {
        let message =
            to_chat_message(&SimpleChatMessage::assistant("Try Coltrane."))
                .unwrap();

        assert!(matches!(message, ChatMessage::Assistant { .. }));
    }

    #[test]
    fn test_instructions_are_prepended() {
        let history = vec![SimpleChatMessage::user("hi")];

        let messages =
            build_messages(&history, Some("You recommend music.")).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[0],
            ChatMessage::System {
                content: ChatMessageContent::Text(text),
                ..
            } if text == "You recommend music."
        ));
        assert!(matches!(&messages[1], ChatMessage::User { .. }));
    }

    #[test]
    fn test_no_instructions() {
        let history = vec![
            SimpleChatMessage::user("hi"),
            SimpleChatMessage::assistant("hello"),
            SimpleChatMessage::user("play something"),
        ];

        let messages = build_messages(&history, None).unwrap();

        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_completion_fails() {
        let result = UnconfiguredCompletion
            .generate("hi", vec![SimpleChatMessage::user("earlier")])
            .await;

        assert!(matches!(result, Err(ProxyError::NotConfigured)));
    }
}
