//! Prompt assembly. Every builder is a pure function of its inputs.

use crate::history::{Role, Turn};
use crate::llm::ChatMessage;
use crate::rag::SearchHit;

pub const REWRITE_INSTRUCTION: &str =
    "Given the chat history and user question, rewrite it as a standalone question.";

pub const ANSWER_INSTRUCTION: &str = "You're an e-commerce bot answering product-related queries using reviews and titles.\nStick to context. Be concise and helpful.";

/// Separator between retrieved documents inside the context block.
const DOCUMENT_SEPARATOR: &str = "\n\n";

fn replay(history: &[Turn]) -> impl Iterator<Item = ChatMessage> + '_ {
    history.iter().map(|turn| match turn.role {
        Role::User => ChatMessage::user(turn.content.clone()),
        Role::Assistant => ChatMessage::assistant(turn.content.clone()),
    })
}

/// System instruction, the full history, then the new question.
pub fn rewrite_prompt(history: &[Turn], input: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(REWRITE_INSTRUCTION));
    messages.extend(replay(history));
    messages.push(ChatMessage::user(input));
    messages
}

/// Concatenated document texts, in retrieval order.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.document.text.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Persona and retrieved context, the full history, then the original
/// question.
pub fn answer_prompt(history: &[Turn], input: &str, context: &str) -> Vec<ChatMessage> {
    let system = format!(
        "{}\n\nCONTEXT:\n{}\n\nQUESTION: {}",
        ANSWER_INSTRUCTION, context, input
    );

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(replay(history));
    messages.push(ChatMessage::user(input));
    messages
}
