//! Chat advisor: an empathetic reply plus task suggestions for a message.
//!
//! Replies come from the configured LLM when an API key is present and fall
//! back to keyword-matched canned text otherwise (or when the LLM call fails).
//! Suggestions are always rule-based.

pub mod canned;
pub mod llm;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::data::{DataAccess, DataResult};
use crate::models::Task;
use llm::LlmClient;

const DEFAULT_PERSONALITY: &str = "Balanced";

/// Incoming chat message. `context` is accepted from clients but not used.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub suggestions: Vec<Suggestion>,
}

/// An actionable nudge, optionally tied to a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub action: String,
}

impl Suggestion {
    pub fn new(kind: &str, message: &str, action: &str) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            task_id: None,
            action: action.into(),
        }
    }

    pub fn for_task(kind: &str, message: &str, task: &Task, action: &str) -> Self {
        Self {
            task_id: Some(task.id.clone()),
            ..Self::new(kind, message, action)
        }
    }
}

/// What the advisor knows about the user when replying.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub personality_type: String,
    pub active_tasks: usize,
    pub completed_tasks: usize,
}

impl ChatContext {
    fn system_prompt(&self) -> String {
        format!(
            "You are EmotiTask, an emotionally intelligent task management assistant.\n\n\
             User Profile:\n\
             - Personality Type: {}\n\
             - Active Tasks: {}\n\
             - Completed Today: {}\n\n\
             Your role is to:\n\
             1. Provide emotional support and encouragement\n\
             2. Help with task management and productivity\n\
             3. Adapt your communication style to the user's personality\n\
             4. Be warm, understanding, and helpful\n\
             5. Keep responses concise but meaningful\n\n\
             Respond naturally and empathetically to the user's message.",
            self.personality_type, self.active_tasks, self.completed_tasks
        )
    }
}

#[derive(Clone)]
pub struct ChatAdvisor {
    llm: Option<LlmClient>,
}

impl ChatAdvisor {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self { llm }
    }

    /// LLM-backed when an API key is configured, canned replies otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        let llm = config
            .llm_configured()
            .then(|| LlmClient::new(&config.openai));
        Self::new(llm)
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_some()
    }

    async fn personality(data: &DataAccess, user_id: &str) -> DataResult<String> {
        Ok(data
            .find_profile(user_id)
            .await?
            .and_then(|p| p.personality_type)
            .unwrap_or_else(|| DEFAULT_PERSONALITY.to_string()))
    }

    pub async fn respond(
        &self,
        data: &DataAccess,
        user_id: &str,
        message: &ChatMessage,
    ) -> DataResult<ChatReply> {
        let personality_type = Self::personality(data, user_id).await?;
        let (active, completed): (Vec<Task>, Vec<Task>) = data
            .list_tasks(user_id)
            .await?
            .into_iter()
            .partition(|t| !t.is_completed);

        let ctx = ChatContext {
            personality_type,
            active_tasks: active.len(),
            completed_tasks: completed.len(),
        };

        let response = match &self.llm {
            Some(llm) => match llm.complete(&ctx.system_prompt(), &message.message).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "LLM reply failed, using canned response");
                    canned::canned_response(&message.message, &ctx)
                }
            },
            None => canned::canned_response(&message.message, &ctx),
        };

        Ok(ChatReply {
            response,
            suggestions: canned::message_suggestions(&message.message, &active),
        })
    }

    /// Suggestions that do not depend on a message.
    pub async fn suggestions(&self, data: &DataAccess, user_id: &str) -> DataResult<Vec<Suggestion>> {
        let personality_type = Self::personality(data, user_id).await?;
        let tasks = data.list_tasks(user_id).await?;
        Ok(canned::contextual_suggestions(&tasks, &personality_type))
    }
}
