//! Prompt construction for quiz generation.

use crate::chat::ChatMessage;
use crate::quiz::QuizPlan;

/// System preamble sent ahead of every quiz prompt.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates programming quiz questions.";

/// Build the user prompt for a validated quiz request.
pub fn build_prompt(plan: &QuizPlan) -> String {
    format!(
        "Generate {count} programming quiz questions in the {language} programming language \
         with {difficulty} difficulty. Return ONLY valid JSON: a list of objects with \
         'question' (string), 'options' (array of 3-6 strings), and 'answer' (string). \
         'answer' must be one of the options. \
         Do not include any prose before or after the JSON.",
        count = plan.num_questions,
        language = plan.language,
        difficulty = plan.difficulty,
    )
}

/// Build the full message list sent to the chat model.
pub fn build_messages(plan: &QuizPlan) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_prompt(plan)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;
    use crate::quiz::Difficulty;

    fn plan() -> QuizPlan {
        QuizPlan {
            language: "Rust".to_string(),
            num_questions: 7,
            difficulty: Difficulty::Hard,
            model: "gpt-oss:20b".to_string(),
            stream: false,
        }
    }

    #[test]
    fn prompt_embeds_request_details() {
        let prompt = build_prompt(&plan());
        assert!(prompt.starts_with("Generate 7 programming quiz questions in the Rust programming language with hard difficulty."));
        assert!(prompt.contains("Return ONLY valid JSON"));
        assert!(prompt.contains("'answer' must be one of the options."));
        assert!(prompt.ends_with("Do not include any prose before or after the JSON."));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt(&plan()), build_prompt(&plan()));
    }

    #[test]
    fn messages_lead_with_system_preamble() {
        let messages = build_messages(&plan());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, build_prompt(&plan()));
    }
}
