//! services/api/src/adapters/plan_llm.rs
//!
//! LLM-backed implementation of the `PlanGenerationService` port. Talks to any
//! OpenAI-compatible endpoint (OpenRouter by default) and validates the model's
//! JSON output before it is allowed anywhere near the database.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use study_buddy_core::domain::{StudyPlanItem, StudyTopic};
use study_buddy_core::ports::{PlanGenerationService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You are a study planning assistant. Given one or more study topics \
with goals, date ranges and a daily time budget, produce a day-by-day study plan. Respond with \
ONLY a JSON object of the shape {\"plan\": [{\"date\": \"YYYY-MM-DD\", \"task\": \"...\", \
\"topic\": \"...\", \"duration\": \"...\"}]} and nothing else. Every day in each topic's date \
range must appear, tasks must build towards the stated goal, and duration must respect the \
topic's daily time budget.";

pub struct OpenAiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPlanAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[derive(Deserialize)]
struct PlanEnvelope {
    plan: Vec<StudyPlanItem>,
}

/// Parses and validates the model's raw output. Anything other than a
/// non-empty `{"plan": [...]}` object with fully-populated items is a
/// generation failure, and the caller must not persist it.
pub fn parse_plan_response(raw: &str) -> PortResult<Vec<StudyPlanItem>> {
    // Models occasionally wrap JSON in a markdown fence despite instructions.
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let envelope: PlanEnvelope = serde_json::from_str(trimmed)
        .map_err(|e| PortError::GenerationFailed(format!("malformed plan JSON: {}", e)))?;

    if envelope.plan.is_empty() {
        return Err(PortError::GenerationFailed(
            "model returned an empty plan".to_string(),
        ));
    }
    for item in &envelope.plan {
        if item.date.trim().is_empty() || item.task.trim().is_empty() {
            return Err(PortError::GenerationFailed(
                "plan item is missing a date or task".to_string(),
            ));
        }
    }
    Ok(envelope.plan)
}

fn describe_topics(topics: &[StudyTopic]) -> String {
    topics
        .iter()
        .map(|t| {
            format!(
                "- Topic: {}\n  Goal: {}\n  From {} to {}\n  Daily time: {} minutes",
                t.title, t.goal, t.start_date, t.end_date, t.daily_time_minutes
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl PlanGenerationService for OpenAiPlanAdapter {
    async fn generate_plan(&self, topics: &[StudyTopic]) -> PortResult<Vec<StudyPlanItem>> {
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
                        "Create a study plan for these topics:\n{}",
                        describe_topics(topics)
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

        parse_plan_response(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_plan_parses() {
        let raw = r#"{"plan": [
            {"date": "2024-01-01", "task": "Read chapter 1", "topic": "Algebra", "duration": "30 min"},
            {"date": "2024-01-02", "task": "Practice problems", "topic": "Algebra", "duration": "30 min"}
        ]}"#;
        let items = parse_plan_response(raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].task, "Read chapter 1");
    }

    #[test]
    fn fenced_output_is_tolerated() {
        let raw = "```json\n{\"plan\": [{\"date\": \"2024-01-01\", \"task\": \"Read\", \"topic\": \"X\", \"duration\": \"10 min\"}]}\n```";
        assert_eq!(parse_plan_response(raw).unwrap().len(), 1);
    }

    #[test]
    fn prose_output_fails_generation() {
        let err = parse_plan_response("Here is your plan: study hard!").unwrap_err();
        assert!(matches!(err, PortError::GenerationFailed(_)));
    }

    #[test]
    fn empty_plan_fails_generation() {
        let err = parse_plan_response(r#"{"plan": []}"#).unwrap_err();
        assert!(matches!(err, PortError::GenerationFailed(_)));
    }

    #[test]
    fn blank_fields_fail_generation() {
        let raw = r#"{"plan": [{"date": "", "task": "Read", "topic": "X", "duration": "10 min"}]}"#;
        let err = parse_plan_response(raw).unwrap_err();
        assert!(matches!(err, PortError::GenerationFailed(_)));
    }
}
