use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::invoice::invoice_number_at;
use crate::models::{TicketDraft, TicketField, TicketStatus, TurnResponse};
use crate::repos::{NewCustomer, NewTicket, StoreError, TicketRecords};

/// Ticket inserts tried before giving up on invoice-number collisions.
const INVOICE_ATTEMPTS: i64 = 3;

/// Persists a confirmed draft: resolves (or creates) the customer by name, then inserts the
/// ticket. The two writes are not transactional; a failed ticket insert can leave a new
/// customer row behind.
///
/// Invoice numbers come from the creation millisecond. When another ticket in the workspace
/// already holds that number, the insert is retried with the following millisecond.
pub(super) async fn commit_draft(
    records: &dyn TicketRecords,
    workspace_id: Uuid,
    created_by: Option<Uuid>,
    draft: &TicketDraft,
    now: DateTime<Utc>,
) -> TurnResponse {
    let ticket = new_ticket_from_draft(draft, created_by, now);

    match insert_with_customer(records, workspace_id, draft, ticket, now).await {
        Ok((ticket_id, invoice_number)) => {
            info!(
                workspace_id = %workspace_id,
                ticket_id = %ticket_id,
                invoice_number = %invoice_number,
                "assistant created ticket"
            );
            let customer_label = draft
                .get(TicketField::CustomerName)
                .unwrap_or_else(|| "customer".to_string());
            TurnResponse::TicketCreated {
                ticket_id,
                message: format!(
                    "✅ Ticket {invoice_number} created for {customer_label}! Tap to view it."
                ),
                invoice_number,
            }
        }
        Err(err) => {
            warn!(workspace_id = %workspace_id, "assistant ticket creation failed: {err}");
            TurnResponse::Error {
                message: format!("Failed to create ticket: {err}"),
            }
        }
    }
}

async fn insert_with_customer(
    records: &dyn TicketRecords,
    workspace_id: Uuid,
    draft: &TicketDraft,
    mut ticket: NewTicket,
    now: DateTime<Utc>,
) -> Result<(Uuid, String), StoreError> {
    if let Some(name) = ticket.customer_name.clone() {
        let customer_id = match records.find_customer_by_name(workspace_id, &name).await? {
            Some(existing) => existing,
            None => {
                let customer = NewCustomer {
                    name,
                    email: draft.get(TicketField::CustomerEmail),
                    phone: draft.get(TicketField::CustomerPhone),
                    address: draft.get(TicketField::CustomerAddress),
                };
                records.insert_customer(workspace_id, &customer).await?
            }
        };
        ticket.customer_id = Some(customer_id);
    }

    let mut attempt = 0;
    loop {
        match records.insert_ticket(workspace_id, &ticket).await {
            Ok(ticket_id) => return Ok((ticket_id, ticket.invoice_number)),
            Err(StoreError::DuplicateInvoice(taken)) if attempt + 1 < INVOICE_ATTEMPTS => {
                attempt += 1;
                ticket.invoice_number = invoice_number_at(now + Duration::milliseconds(attempt));
                debug!(
                    workspace_id = %workspace_id,
                    taken = %taken,
                    retry = %ticket.invoice_number,
                    "invoice number collision, retrying"
                );
            }
            Err(err) => return Err(err),
        }
    }
}

fn new_ticket_from_draft(
    draft: &TicketDraft,
    created_by: Option<Uuid>,
    now: DateTime<Utc>,
) -> NewTicket {
    NewTicket {
        invoice_number: invoice_number_at(now),
        ticket_date: now.date_naive(),
        status: ticket_status(draft),
        customer_id: None,
        customer_name: draft.get(TicketField::CustomerName),
        customer_email: draft.get(TicketField::CustomerEmail),
        customer_phone: draft.get(TicketField::CustomerPhone),
        customer_address: draft.get(TicketField::CustomerAddress),
        equipment_type: draft.get(TicketField::EquipmentType),
        equipment_brand: draft.get(TicketField::EquipmentBrand),
        equipment_model: draft.get(TicketField::EquipmentModel),
        equipment_serial: draft.get(TicketField::EquipmentSerial),
        equipment_year: draft.get(TicketField::EquipmentYear),
        problem_description: draft.get(TicketField::ProblemDescription),
        created_by,
    }
}

/// The draft's status when it names a known one; anything else starts the ticket at intake.
fn ticket_status(draft: &TicketDraft) -> TicketStatus {
    let Some(raw) = draft.get(TicketField::Status) else {
        return TicketStatus::default();
    };
    TicketStatus::parse(&raw).unwrap_or_else(|| {
        debug!("draft carried an unrecognized status, using intake");
        TicketStatus::default()
    })
}
