//! Client-side conversation state for the assistant panel.
//!
//! A [`ConversationSession`] lives as long as one open panel. It owns the transcript, the
//! single pending ticket draft and the single-flight guard; nothing here is persisted.

use thiserror::Error;
use tracing::debug;

use crate::llm::recent_turns;
use crate::models::{
    ChatRole, ChatTurn, TicketDraft, TicketField, TicketSummary, TurnRequest, TurnResponse,
};

mod transport;
mod voice;

pub use transport::{
    ASSISTANT_PATH, AssistantTransport, ClientConfigError, ClientError, HttpAssistantClient,
    TransportFuture,
};
pub use voice::{
    AUTO_SUBMIT_DELAY, Dictation, RecognitionError, RecognitionFuture, SpeechRecognizer,
    VoiceInput, VoiceUnavailable,
};

pub const GREETING: &str = "Hi! I'm your shop assistant. Type or tap the mic 🎙️\n\nTry saying:\n• \"Create a ticket for John Smith, Honda mower, won't start\"\n• \"Find tickets for Smith\"\n• \"How many tickets do I have?\"";
pub const NETWORK_ERROR_MESSAGE: &str = "⚠️ Network error. Please try again.";
const SERVER_ERROR_FALLBACK: &str = "Something went wrong.";
const EMPTY_REPLY_FALLBACK: &str = "Done!";
const TICKET_LINK_PREFIX: &str = "/dashboard/tickets/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("nothing to send")]
    Empty,
    #[error("a turn is already in flight")]
    InFlight,
}

/// One rendered line of the transcript. Assistant turns keep the server reply they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub turn: ChatTurn,
    pub reply: Option<TurnResponse>,
}

impl TranscriptEntry {
    fn user(content: String) -> Self {
        Self {
            turn: ChatTurn::user(content),
            reply: None,
        }
    }

    fn assistant(content: impl Into<String>, reply: Option<TurnResponse>) -> Self {
        Self {
            turn: ChatTurn::assistant(content),
            reply,
        }
    }

    pub fn role(&self) -> ChatRole {
        self.turn.role
    }

    pub fn content(&self) -> &str {
        &self.turn.content
    }

    /// The action-specific widget to render under this turn.
    pub fn affordance(&self) -> Affordance {
        match &self.reply {
            Some(TurnResponse::ConfirmTicket { data, .. }) => {
                Affordance::ConfirmationCard(DraftPreview::from_draft(data))
            }
            Some(TurnResponse::TicketCreated {
                ticket_id,
                invoice_number,
                ..
            }) => Affordance::CreatedLink {
                href: ticket_href(&ticket_id.to_string()),
                label: format!("📄 View Ticket {invoice_number}"),
            },
            Some(TurnResponse::SearchResults { tickets, .. }) if !tickets.is_empty() => {
                Affordance::ResultList(tickets.iter().map(ResultRow::from_summary).collect())
            }
            _ => Affordance::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordance {
    Text,
    ConfirmationCard(DraftPreview),
    ResultList(Vec<ResultRow>),
    CreatedLink { href: String, label: String },
}

/// Summary lines shown on the confirmation card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPreview {
    pub customer: Option<String>,
    pub equipment: Option<String>,
    pub problem: Option<String>,
    pub phone: Option<String>,
}

impl DraftPreview {
    fn from_draft(draft: &TicketDraft) -> Self {
        let equipment = [
            TicketField::EquipmentBrand,
            TicketField::EquipmentModel,
            TicketField::EquipmentType,
        ]
        .into_iter()
        .filter_map(|field| draft.get(field))
        .collect::<Vec<_>>();
        let has_equipment = draft.get(TicketField::EquipmentBrand).is_some()
            || draft.get(TicketField::EquipmentType).is_some();

        Self {
            customer: draft.get(TicketField::CustomerName),
            equipment: has_equipment.then(|| equipment.join(" ")),
            problem: draft.get(TicketField::ProblemDescription),
            phone: draft.get(TicketField::CustomerPhone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub href: String,
    pub invoice: String,
    pub customer: String,
    pub equipment: String,
    pub status: String,
}

impl ResultRow {
    fn from_summary(ticket: &TicketSummary) -> Self {
        let equipment = [&ticket.equipment_brand, &ticket.equipment_type]
            .into_iter()
            .filter_map(|value| value.as_deref().filter(|value| !value.is_empty()))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            href: ticket_href(&ticket.id.to_string()),
            invoice: non_blank_or(ticket.invoice_number.as_deref(), "—"),
            customer: non_blank_or(ticket.customer_name.as_deref(), "No name"),
            equipment: if equipment.is_empty() {
                "—".to_string()
            } else {
                equipment
            },
            status: format_status(&ticket.status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationSession {
    transcript: Vec<TranscriptEntry>,
    pending_draft: Option<TicketDraft>,
    input: String,
    in_flight: bool,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![TranscriptEntry::assistant(GREETING, None)],
            pending_draft: None,
            input: String::new(),
            in_flight: false,
        }
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn pending_draft(&self) -> Option<&TicketDraft> {
        self.pending_draft.as_ref()
    }

    /// Drops the pending draft without creating anything.
    pub fn discard_draft(&mut self) {
        self.pending_draft = None;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Records the user's utterance and builds the request for it. The history sent along is
    /// the last ten transcript turns preceding this utterance.
    pub fn begin_turn(&mut self, text: &str) -> Result<TurnRequest, SubmitRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitRejected::Empty);
        }
        if self.in_flight {
            return Err(SubmitRejected::InFlight);
        }

        let turns = self
            .transcript
            .iter()
            .map(|entry| entry.turn.clone())
            .collect::<Vec<_>>();
        let history = recent_turns(&turns).to_vec();

        self.transcript.push(TranscriptEntry::user(text.to_string()));
        self.input.clear();
        self.in_flight = true;

        Ok(TurnRequest {
            message: Some(text.to_string()),
            conversation_history: Some(history),
            pending_ticket_data: self.pending_draft.clone(),
        })
    }

    /// Applies the outcome of the in-flight turn and releases the single-flight guard.
    pub fn finish_turn(&mut self, outcome: Result<TurnResponse, ClientError>) -> &TranscriptEntry {
        let entry = match outcome {
            Ok(reply) => {
                match &reply {
                    TurnResponse::ConfirmTicket { data, .. } => {
                        self.pending_draft = Some(data.clone());
                    }
                    TurnResponse::TicketCreated { .. } => self.pending_draft = None,
                    _ => {}
                }
                let content = match reply.message().trim() {
                    "" => EMPTY_REPLY_FALLBACK.to_string(),
                    message => message.to_string(),
                };
                TranscriptEntry::assistant(content, Some(reply))
            }
            Err(ClientError::Server { status, message }) => {
                debug!(status, "assistant request rejected by server");
                let message = if message.trim().is_empty() {
                    SERVER_ERROR_FALLBACK
                } else {
                    message.as_str()
                };
                TranscriptEntry::assistant(format!("⚠️ {message}"), None)
            }
            Err(ClientError::Network(detail)) => {
                debug!("assistant request failed: {detail}");
                TranscriptEntry::assistant(NETWORK_ERROR_MESSAGE, None)
            }
        };

        self.in_flight = false;
        self.transcript.push(entry);
        &self.transcript[self.transcript.len() - 1]
    }

    /// Sends one utterance through `transport` and returns the assistant's transcript entry.
    pub async fn submit(
        &mut self,
        transport: &dyn AssistantTransport,
        text: &str,
    ) -> Result<&TranscriptEntry, SubmitRejected> {
        let request = self.begin_turn(text)?;
        let outcome = transport.send_turn(&request).await;
        Ok(self.finish_turn(outcome))
    }
}

/// `waiting_parts` renders as `Waiting Parts`; a blank status renders as `Intake`.
pub fn format_status(status: &str) -> String {
    let status = match status.trim() {
        "" => "intake",
        status => status,
    };

    let mut formatted = String::with_capacity(status.len());
    let mut at_word_start = true;
    for ch in status.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if at_word_start {
            formatted.extend(ch.to_uppercase());
        } else {
            formatted.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    formatted
}

fn ticket_href(ticket_id: &str) -> String {
    format!("{TICKET_LINK_PREFIX}{ticket_id}")
}

fn non_blank_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}
