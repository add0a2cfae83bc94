//! Chat engine: retrieval, generation, and transcript persistence for one turn

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::error::Result;
use crate::providers::GenerationProvider;
use crate::retrieval::ContextAssembler;
use crate::types::{ChatMessage, ChatRequest};

use super::prompt::build_messages;
use super::store::SessionStore;

/// Orchestrates a chat turn end to end.
///
/// Retrieval errors surface before any streaming starts and leave the session
/// untouched. Once streaming has begun, generation failures are turned into
/// an assistant-visible error message so the transcript stays consistent.
pub struct ChatEngine {
    assembler: Arc<ContextAssembler>,
    llm: Arc<dyn GenerationProvider>,
    sessions: Arc<SessionStore>,
}

impl ChatEngine {
    pub fn new(
        assembler: Arc<ContextAssembler>,
        llm: Arc<dyn GenerationProvider>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            assembler,
            llm,
            sessions,
        }
    }

    /// Run one chat turn, returning the session id and a stream of answer
    /// fragments. The transcript (user message plus the full assistant reply)
    /// is saved exactly once, after the stream finishes.
    pub async fn chat_turn(&self, request: ChatRequest) -> Result<(Uuid, ReceiverStream<String>)> {
        let context = self
            .assembler
            .build_context(&request.message, &request.document_ids)
            .await?;

        let session = self
            .sessions
            .get_or_create(request.session_id, &request.document_ids)
            .await?;

        let messages = build_messages(&context, &session, &request.message);
        let user_message = ChatMessage::user(request.message.clone());

        let session_id = session.id;
        let document_ids = request.document_ids;
        let model = request.model.unwrap_or_else(|| self.llm.model().to_string());
        let llm = Arc::clone(&self.llm);
        let sessions = Arc::clone(&self.sessions);

        let (tx, rx) = mpsc::channel::<String>(32);
        tokio::spawn(async move {
            let answer = stream_answer(llm, &model, &messages, &tx).await;
            let assistant = ChatMessage::assistant(answer);

            if let Err(e) = sessions
                .append_turn(session_id, &document_ids, user_message, assistant)
                .await
            {
                tracing::error!(session_id = %session_id, error = %e, "Failed to save chat session");
            }
        });

        Ok((session_id, ReceiverStream::new(rx)))
    }
}

/// Stream the completion into the channel, accumulating the full answer.
/// On any generation failure the error text becomes the rest of the answer.
async fn stream_answer(
    llm: Arc<dyn GenerationProvider>,
    model: &str,
    messages: &[crate::providers::PromptMessage],
    tx: &mpsc::Sender<String>,
) -> String {
    let mut answer = String::new();

    let mut stream = match llm.stream_complete(model, messages).await {
        Ok(stream) => stream,
        Err(e) => {
            let text = format!("Error generating response: {}", e);
            let _ = tx.send(text.clone()).await;
            return text;
        }
    };

    while let Some(fragment) = stream.next().await {
        match fragment {
            Ok(text) => {
                answer.push_str(&text);
                // A closed receiver means the client went away; keep
                // consuming so the saved transcript is still complete
                let _ = tx.send(text).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation stream failed mid-answer");
                let text = format!("\n\n[Error generating response: {}]", e);
                answer.push_str(&text);
                let _ = tx.send(text).await;
                break;
            }
        }
    }

    answer
}
