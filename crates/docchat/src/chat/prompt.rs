//! Prompt construction for grounded answers

use crate::providers::PromptMessage;
use crate::retrieval::GroundingContext;
use crate::types::ChatSession;

/// How many prior messages from the transcript are replayed to the model
const HISTORY_WINDOW: usize = 20;

/// Build the message sequence for one chat turn: a grounding system prompt,
/// recent transcript history, then the new user message.
pub fn build_messages(
    context: &GroundingContext,
    session: &ChatSession,
    user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = vec![PromptMessage::system(system_prompt(context))];

    let start = session.messages.len().saturating_sub(HISTORY_WINDOW);
    for message in &session.messages[start..] {
        messages.push(PromptMessage::from(message));
    }

    messages.push(PromptMessage::user(user_message));
    messages
}

fn system_prompt(context: &GroundingContext) -> String {
    let sources = if context.source_names.is_empty() {
        "the uploaded documents".to_string()
    } else {
        context.source_names.join(", ")
    };

    format!(
        "You are a helpful assistant answering questions about the user's documents ({sources}). \
         Answer using only the excerpts below. If the excerpts do not contain the answer, say so \
         instead of guessing.\n\nDocument excerpts:\n\n{}",
        context.text
    )
}
