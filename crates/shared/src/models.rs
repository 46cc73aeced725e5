use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Ticket fields the assistant knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    CustomerName,
    CustomerPhone,
    CustomerEmail,
    CustomerAddress,
    EquipmentType,
    EquipmentBrand,
    EquipmentModel,
    EquipmentSerial,
    EquipmentYear,
    ProblemDescription,
    Status,
}

impl TicketField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomerName => "customer_name",
            Self::CustomerPhone => "customer_phone",
            Self::CustomerEmail => "customer_email",
            Self::CustomerAddress => "customer_address",
            Self::EquipmentType => "equipment_type",
            Self::EquipmentBrand => "equipment_brand",
            Self::EquipmentModel => "equipment_model",
            Self::EquipmentSerial => "equipment_serial",
            Self::EquipmentYear => "equipment_year",
            Self::ProblemDescription => "problem_description",
            Self::Status => "status",
        }
    }
}

/// Extracted ticket fields awaiting confirmation.
///
/// Kept as the raw JSON object the model produced so it can be echoed back to
/// the client unchanged; typed reads go through [`TicketDraft::get`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketDraft(pub Map<String, Value>);

impl TicketDraft {
    pub fn get(&self, field: TicketField) -> Option<String> {
        match self.0.get(field.as_str())? {
            Value::String(raw) => {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for TicketDraft {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Where a ticket is in the shop's workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Intake,
    Diagnosing,
    WaitingParts,
    InProgress,
    Ready,
    PickedUp,
    Invoiced,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [Self; 8] = [
        Self::Intake,
        Self::Diagnosing,
        Self::WaitingParts,
        Self::InProgress,
        Self::Ready,
        Self::PickedUp,
        Self::Invoiced,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Diagnosing => "diagnosing",
            Self::WaitingParts => "waiting_parts",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::PickedUp => "picked_up",
            Self::Invoiced => "invoiced",
            Self::Cancelled => "cancelled",
        }
    }

    /// Reads a wire name or a loose spelling of one (`In Progress`, `waiting-parts`).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ChatTurn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_ticket_data: Option<TicketDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: Uuid,
    pub invoice_number: Option<String>,
    pub customer_name: Option<String>,
    pub status: String,
    pub equipment_brand: Option<String>,
    pub equipment_type: Option<String>,
    pub grand_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TurnResponse {
    ConfirmTicket {
        data: TicketDraft,
        message: String,
    },
    TicketCreated {
        #[serde(rename = "ticketId")]
        ticket_id: Uuid,
        #[serde(rename = "invoiceNumber")]
        invoice_number: String,
        message: String,
    },
    SearchResults {
        tickets: Vec<TicketSummary>,
        message: String,
    },
    Stats {
        message: String,
    },
    Chat {
        message: String,
    },
    Error {
        message: String,
    },
}

impl TurnResponse {
    pub fn message(&self) -> &str {
        match self {
            Self::ConfirmTicket { message, .. }
            | Self::TicketCreated { message, .. }
            | Self::SearchResults { message, .. }
            | Self::Stats { message }
            | Self::Chat { message }
            | Self::Error { message } => message,
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            Self::ConfirmTicket { .. } => "confirm_ticket",
            Self::TicketCreated { .. } => "ticket_created",
            Self::SearchResults { .. } => "search_results",
            Self::Stats { .. } => "stats",
            Self::Chat { .. } => "chat",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}
