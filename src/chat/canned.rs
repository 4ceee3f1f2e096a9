//! Keyword-matched replies and task suggestions that need no LLM.

use super::{ChatContext, Suggestion};
use crate::models::{EmotionalTag, Task};

const OVERWHELM_WORDS: &[&str] = &["overwhelmed", "stressed", "too much"];
const ENERGY_WORDS: &[&str] = &["tired", "exhausted", "energy"];
const FOCUS_WORDS: &[&str] = &["focus", "concentrate", "important"];

/// More incomplete tasks than this earns an "organize" nudge.
const BUSY_THRESHOLD: usize = 10;
const MAX_MESSAGE_SUGGESTIONS: usize = 2;

/// Reply for the first keyword (in table order) found in the message.
pub fn canned_response(message: &str, ctx: &ChatContext) -> String {
    let lower = message.to_lowercase();

    if lower.contains("overwhelmed") {
        format!(
            "I understand you're feeling overwhelmed. With {} active tasks, that's completely normal. \
             Let's break things down into smaller, manageable steps.",
            ctx.active_tasks
        )
    } else if lower.contains("stressed") {
        format!(
            "Stress can be challenging. Remember that you've already completed {} tasks today - \
             that's progress! What's the most important thing you need to focus on right now?",
            ctx.completed_tasks
        )
    } else if lower.contains("tired") {
        "It sounds like you might need a break. Your well-being is just as important as your \
         productivity. Have you considered scheduling some self-care time?"
            .to_string()
    } else if lower.contains("motivated") {
        format!(
            "I love your energy! With {} tasks ahead, your motivation will serve you well. \
             What would you like to tackle first?",
            ctx.active_tasks
        )
    } else if lower.contains("help") {
        format!(
            "I'm here to help! Based on your {} personality type, I can suggest the best approach \
             for your current tasks.",
            ctx.personality_type
        )
    } else {
        format!(
            "Thank you for sharing that with me. As someone with a {} personality type, you have \
             unique strengths. How can I help you make progress on your goals today?",
            ctx.personality_type
        )
    }
}

fn mentions(message: &str, words: &[&str]) -> bool {
    words.iter().any(|w| message.contains(w))
}

fn first_tagged(tasks: &[Task], tag: EmotionalTag) -> Option<&Task> {
    tasks.iter().find(|t| t.emotional_tag == Some(tag))
}

/// Suggestions for a chat message, drawn from the user's active tasks.
pub fn message_suggestions(message: &str, active: &[Task]) -> Vec<Suggestion> {
    let lower = message.to_lowercase();
    let mut suggestions = Vec::new();

    if mentions(&lower, OVERWHELM_WORDS) {
        if let Some(task) = active.iter().find(|t| t.priority.is_pressing()) {
            suggestions.push(Suggestion::for_task(
                "reschedule",
                "Would you like me to help reschedule some lower-priority tasks to reduce your workload?",
                task,
                "reschedule_low_priority",
            ));
        }
        suggestions.push(Suggestion::new(
            "self_care",
            "How about adding a 10-minute mindfulness break to your schedule?",
            "add_break",
        ));
    } else if mentions(&lower, ENERGY_WORDS) {
        if let Some(task) = first_tagged(active, EmotionalTag::LowEnergy) {
            suggestions.push(Suggestion::for_task(
                "prioritize",
                "I can prioritize your low-energy tasks for now. Would that help?",
                task,
                "prioritize_low_energy",
            ));
        }
    } else if mentions(&lower, FOCUS_WORDS) {
        if let Some(task) = first_tagged(active, EmotionalTag::Focus) {
            suggestions.push(Suggestion::for_task(
                "focus",
                "I see you have some focus-intensive tasks. Should we tackle those while you're in the zone?",
                task,
                "prioritize_focus",
            ));
        }
    }

    suggestions.truncate(MAX_MESSAGE_SUGGESTIONS);
    suggestions
}

/// General suggestions from task load and personality type.
pub fn contextual_suggestions(tasks: &[Task], personality_type: &str) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    let incomplete = tasks.iter().filter(|t| !t.is_completed).count();
    if incomplete > BUSY_THRESHOLD {
        suggestions.push(Suggestion::new(
            "organization",
            &format!(
                "You have {incomplete} active tasks. Would you like help organizing them by priority?"
            ),
            "organize_by_priority",
        ));
    }

    match personality_type {
        "Explorer" => suggestions.push(Suggestion::new(
            "variety",
            "As an Explorer, you might enjoy mixing different types of tasks. Want me to suggest a varied schedule?",
            "create_varied_schedule",
        )),
        "Analyst" => suggestions.push(Suggestion::new(
            "planning",
            "Would you like me to help create a detailed plan for your upcoming tasks?",
            "create_detailed_plan",
        )),
        _ => {}
    }

    suggestions
}
