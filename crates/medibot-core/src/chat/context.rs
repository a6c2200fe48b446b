//! Context window builder for follow-up questions.
//!
//! The answer generator is stateless, so conversational continuity is carried
//! by prepending the most recent transcript messages to the new question as
//! labeled lines. Only the last `max_messages` messages are used; individual
//! messages are never truncated.

use std::fmt::Write;

use medibot_types::chat::{MessageRole, TranscriptMessage};
use medibot_types::config::ContextConfig;

const USER_LABEL: &str = "Previous User Question";
const ASSISTANT_LABEL: &str = "Previous Assistant Answer";

/// Renders a bounded slice of a transcript into a prompt prefix.
#[derive(Debug, Clone)]
pub struct ContextWindowBuilder {
    max_messages: usize,
    header: String,
    instruction: String,
}

impl ContextWindowBuilder {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            max_messages: config.max_history_messages,
            header: config.header.clone(),
            instruction: config.instruction.clone(),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Build the generator input for `message` given the prior `history`.
    ///
    /// Returns `message` unchanged when no history lines are produced.
    pub fn build(&self, history: &[TranscriptMessage], message: &str) -> String {
        let start = history.len().saturating_sub(self.max_messages);

        let mut lines = String::new();
        for entry in &history[start..] {
            let label = match entry.role {
                MessageRole::User => USER_LABEL,
                MessageRole::Assistant => ASSISTANT_LABEL,
                MessageRole::System => continue,
            };
            // Writing into a String cannot fail.
            let _ = writeln!(lines, "{label}: {}", entry.content);
        }

        if lines.is_empty() {
            return message.to_string();
        }

        format!(
            "{}:\n{lines}\n\nCurrent User Question: {message}\n\n{}",
            self.header, self.instruction
        )
    }
}

impl Default for ContextWindowBuilder {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibot_types::chat::Transcript;

    fn transcript(exchanges: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for i in 1..=exchanges {
            transcript.push_exchange(&format!("q{i}"), &format!("a{i}"));
        }
        transcript
    }

    #[test]
    fn empty_history_returns_message_unchanged() {
        let builder = ContextWindowBuilder::default();
        let message = "  What is fever?\n";
        assert_eq!(builder.build(&[], message), message);
    }

    #[test]
    fn single_exchange_matches_expected_layout() {
        let builder = ContextWindowBuilder::default();
        let mut history = Transcript::new();
        history.push_exchange("What is fever?", "A fever is...");

        let out = builder.build(history.messages(), "And children?");
        assert_eq!(
            out,
            "Conversation History:\n\
             Previous User Question: What is fever?\n\
             Previous Assistant Answer: A fever is...\n\
             \n\n\
             Current User Question: And children?\n\n\
             Please provide a helpful answer considering the conversation history above."
        );
        assert_eq!(out.matches("Previous User Question").count(), 1);
        assert_eq!(out.matches("Previous Assistant Answer").count(), 1);
    }

    #[test]
    fn up_to_five_exchanges_are_all_included_in_order() {
        let builder = ContextWindowBuilder::default();
        let history = transcript(5);
        let out = builder.build(history.messages(), "next");

        let mut last = 0;
        for i in 1..=5 {
            let pos = out.find(&format!("Previous User Question: q{i}\n")).unwrap();
            assert!(pos >= last);
            last = pos;
        }
        assert_eq!(out.matches("Previous User Question").count(), 5);
    }

    #[test]
    fn more_than_five_exchanges_keeps_most_recent_five() {
        let builder = ContextWindowBuilder::default();
        let history = transcript(8);
        let out = builder.build(history.messages(), "next");

        assert_eq!(out.matches("Previous User Question").count(), 5);
        assert_eq!(out.matches("Previous Assistant Answer").count(), 5);
        assert!(!out.contains("q3\n"));
        assert!(out.contains("Previous User Question: q4\n"));
        assert!(out.contains("Previous Assistant Answer: a8\n"));
    }

    #[test]
    fn trailing_unanswered_user_message_yields_only_its_line() {
        let builder = ContextWindowBuilder::default();
        let history = vec![TranscriptMessage::user("dangling")];
        let out = builder.build(&history, "next");

        assert!(out.starts_with("Conversation History:\nPrevious User Question: dangling\n\n\n"));
        assert!(!out.contains("Previous Assistant Answer"));
    }

    #[test]
    fn odd_window_labels_by_role() {
        let builder = ContextWindowBuilder::new(&ContextConfig {
            max_history_messages: 3,
            ..ContextConfig::default()
        });
        let history = transcript(2);
        let out = builder.build(history.messages(), "next");

        // Window starts on an assistant message: a1, q2, a2.
        assert!(out.starts_with(
            "Conversation History:\n\
             Previous Assistant Answer: a1\n\
             Previous User Question: q2\n\
             Previous Assistant Answer: a2\n"
        ));
    }

    #[test]
    fn long_messages_are_not_truncated() {
        let builder = ContextWindowBuilder::default();
        let long = "x".repeat(10_000);
        let mut history = Transcript::new();
        history.push_exchange(&long, "ok");

        let out = builder.build(history.messages(), "next");
        assert!(out.contains(&long));
    }

    #[test]
    fn custom_header_and_instruction() {
        let builder = ContextWindowBuilder::new(&ContextConfig {
            max_history_messages: 10,
            header: "History".to_string(),
            instruction: "Answer briefly.".to_string(),
        });
        let history = transcript(1);
        let out = builder.build(history.messages(), "next");

        assert!(out.starts_with("History:\n"));
        assert!(out.ends_with("Current User Question: next\n\nAnswer briefly."));
    }
}
