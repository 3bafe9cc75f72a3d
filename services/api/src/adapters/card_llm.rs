//! services/api/src/adapters/card_llm.rs
//!
//! LLM-backed implementation of the `CardGenerationService` port: turns a
//! free-text topic into question/answer flashcard pairs.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use study_buddy_core::domain::GeneratedCard;
use study_buddy_core::ports::{CardGenerationService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You are a flashcard authoring assistant. Generate exactly 5 \
flashcards for the requested topic, in the requested language. Respond with ONLY a JSON array \
of the shape [{\"question\": \"...\", \"answer\": \"...\"}] and nothing else. Questions must \
be short and specific, answers one or two sentences.";

pub struct OpenAiCardAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCardAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Parses the model's raw output into card pairs, rejecting anything that is
/// not a non-empty JSON array of populated question/answer objects.
pub fn parse_card_response(raw: &str) -> PortResult<Vec<GeneratedCard>> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let cards: Vec<GeneratedCard> = serde_json::from_str(trimmed)
        .map_err(|e| PortError::GenerationFailed(format!("malformed card JSON: {}", e)))?;

    if cards.is_empty() {
        return Err(PortError::GenerationFailed(
            "model returned no cards".to_string(),
        ));
    }
    for card in &cards {
        if card.question.trim().is_empty() || card.answer.trim().is_empty() {
            return Err(PortError::GenerationFailed(
                "card is missing a question or answer".to_string(),
            ));
        }
    }
    Ok(cards)
}

#[async_trait]
impl CardGenerationService for OpenAiCardAdapter {
    async fn generate_cards(&self, topic: &str, language: &str) -> PortResult<Vec<GeneratedCard>> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(format!(
                        "Topic: {}\nLanguage for questions and answers: {}",
                        topic, language
                    ))
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PortError::GenerationFailed(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                PortError::GenerationFailed("model returned no content".to_string())
            })?;

        parse_card_response(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_cards_parse() {
        let raw = r#"[
            {"question": "What is 2+2?", "answer": "4"},
            {"question": "What is 3+3?", "answer": "6"}
        ]"#;
        let cards = parse_card_response(raw).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].answer, "6");
    }

    #[test]
    fn empty_array_fails_generation() {
        assert!(matches!(
            parse_card_response("[]").unwrap_err(),
            PortError::GenerationFailed(_)
        ));
    }

    #[test]
    fn object_instead_of_array_fails_generation() {
        assert!(matches!(
            parse_card_response(r#"{"cards": []}"#).unwrap_err(),
            PortError::GenerationFailed(_)
        ));
    }
}
