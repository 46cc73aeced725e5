//! Stateless turn processor for the ticket assistant.
//!
//! Each call receives the utterance, the prior conversation and the pending draft (if any)
//! from the caller and returns a single [`TurnResponse`]. Draft lifetime is owned by the
//! caller; the only write path is confirming a pending draft.

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::llm::{ActionEnvelope, ActionTag, ExtractionClient, ExtractionError, recent_turns};
use crate::models::{ChatTurn, TicketDraft, TurnResponse};
use crate::repos::{StoreError, TicketRecords};

mod create;
mod search;
mod stats;

const DRAFT_PREVIEW_FALLBACK: &str = "Here's what I have. Say 'yes' or 'create it' to confirm.";
const CHAT_FALLBACK: &str =
    "I'm not sure how to help with that. Try asking me to create a ticket or look one up!";
const NOTHING_PENDING: &str =
    "There's no ticket waiting for confirmation. Tell me about the job and I'll draft one.";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub utterance: &'a str,
    pub history: &'a [ChatTurn],
    pub pending_draft: Option<&'a TicketDraft>,
    pub workspace_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct TurnProcessor {
    extraction: ExtractionClient,
}

impl TurnProcessor {
    pub fn new(extraction: ExtractionClient) -> Self {
        Self { extraction }
    }

    pub async fn process_turn(
        &self,
        records: &dyn TicketRecords,
        input: TurnInput<'_>,
    ) -> Result<TurnResponse, TurnError> {
        let envelope = self
            .extraction
            .extract(recent_turns(input.history), input.utterance)
            .await?;

        info!(
            workspace_id = %input.workspace_id,
            action = envelope.action.as_str(),
            has_pending_draft = input.pending_draft.is_some(),
            "assistant action classified"
        );

        let action = envelope.action.clone();
        let response = match action {
            ActionTag::CreateTicket => preview_draft(envelope),
            ActionTag::ConfirmCreate => match input.pending_draft {
                Some(draft) => {
                    create::commit_draft(
                        records,
                        input.workspace_id,
                        input.user_id,
                        draft,
                        Utc::now(),
                    )
                    .await
                }
                None => TurnResponse::Chat {
                    message: NOTHING_PENDING.to_string(),
                },
            },
            ActionTag::SearchTickets => {
                let query = envelope.query.as_deref().unwrap_or(input.utterance);
                search::search_tickets(records, input.workspace_id, query).await?
            }
            ActionTag::GetStats => stats::summarize(records, input.workspace_id).await,
            ActionTag::Chat | ActionTag::Error | ActionTag::Unknown(_) => TurnResponse::Chat {
                message: envelope
                    .message
                    .unwrap_or_else(|| CHAT_FALLBACK.to_string()),
            },
        };

        Ok(response)
    }
}

/// Echoes the extracted fields back for confirmation without touching the store.
fn preview_draft(envelope: ActionEnvelope) -> TurnResponse {
    TurnResponse::ConfirmTicket {
        data: TicketDraft::from(envelope.data.unwrap_or_default()),
        message: envelope
            .message
            .unwrap_or_else(|| DRAFT_PREVIEW_FALLBACK.to_string()),
    }
}
