use std::collections::VecDeque;
use std::sync::Mutex;

use uuid::Uuid;

use crate::llm::{LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest};
use crate::models::{TicketStatus, TicketSummary};
use crate::repos::{NewCustomer, NewTicket, RecordFuture, RecordKind, StoreError, TicketRecords};

/// Gateway that replays canned completions in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<LlmGatewayRequest>>,
}

impl ScriptedGateway {
    pub(crate) fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|reply| Ok(reply.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<LlmGatewayRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl LlmGateway for ScriptedGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        self.requests.lock().expect("requests lock").push(request);
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err("scripted replies exhausted".to_string()));

        Box::pin(async move {
            reply
                .map(|text| LlmCompletion {
                    model: "scripted-model".to_string(),
                    provider_request_id: None,
                    text,
                    usage: None,
                })
                .map_err(LlmGatewayError::ProviderFailure)
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StoredCustomer {
    pub(crate) id: Uuid,
    pub(crate) workspace_id: Uuid,
    pub(crate) customer: NewCustomer,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredTicket {
    pub(crate) id: Uuid,
    pub(crate) workspace_id: Uuid,
    pub(crate) ticket: NewTicket,
}

#[derive(Default)]
struct InMemoryState {
    customers: Vec<StoredCustomer>,
    // Insertion order doubles as creation order.
    tickets: Vec<StoredTicket>,
    parts: Vec<Uuid>,
}

/// In-memory stand-in for the Postgres store with switchable failures.
#[derive(Default)]
pub(crate) struct InMemoryRecords {
    state: Mutex<InMemoryState>,
    fail_ticket_insert: bool,
    failing_counts: Vec<RecordKind>,
}

impl InMemoryRecords {
    /// Every ticket insert fails; customer writes still succeed.
    pub(crate) fn failing_ticket_insert() -> Self {
        Self {
            fail_ticket_insert: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_counts(kinds: impl IntoIterator<Item = RecordKind>) -> Self {
        Self {
            failing_counts: kinds.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn seed_customer(&self, workspace_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .expect("state lock")
            .customers
            .push(StoredCustomer {
                id,
                workspace_id,
                customer: NewCustomer {
                    name: name.to_string(),
                    ..NewCustomer::default()
                },
            });
        id
    }

    pub(crate) fn seed_ticket(
        &self,
        workspace_id: Uuid,
        invoice_number: &str,
        customer_name: &str,
        equipment_brand: &str,
        equipment_type: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let ticket = NewTicket {
            invoice_number: invoice_number.to_string(),
            ticket_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            status: TicketStatus::Intake,
            customer_id: None,
            customer_name: Some(customer_name.to_string()),
            customer_email: None,
            customer_phone: None,
            customer_address: None,
            equipment_type: Some(equipment_type.to_string()),
            equipment_brand: Some(equipment_brand.to_string()),
            equipment_model: None,
            equipment_serial: None,
            equipment_year: None,
            problem_description: None,
            created_by: None,
        };
        self.state
            .lock()
            .expect("state lock")
            .tickets
            .push(StoredTicket {
                id,
                workspace_id,
                ticket,
            });
        id
    }

    pub(crate) fn seed_parts(&self, workspace_id: Uuid, count: usize) {
        let mut state = self.state.lock().expect("state lock");
        state
            .parts
            .extend(std::iter::repeat_n(workspace_id, count));
    }

    pub(crate) fn customers(&self) -> Vec<StoredCustomer> {
        self.state.lock().expect("state lock").customers.clone()
    }

    pub(crate) fn tickets(&self) -> Vec<StoredTicket> {
        self.state.lock().expect("state lock").tickets.clone()
    }
}

impl TicketRecords for InMemoryRecords {
    fn find_customer_by_name<'a>(
        &'a self,
        workspace_id: Uuid,
        name: &'a str,
    ) -> RecordFuture<'a, Option<Uuid>> {
        Box::pin(async move {
            let wanted = name.trim().to_lowercase();
            Ok(self
                .state
                .lock()
                .expect("state lock")
                .customers
                .iter()
                .find(|stored| {
                    stored.workspace_id == workspace_id
                        && stored.customer.name.to_lowercase() == wanted
                })
                .map(|stored| stored.id))
        })
    }

    fn insert_customer<'a>(
        &'a self,
        workspace_id: Uuid,
        customer: &'a NewCustomer,
    ) -> RecordFuture<'a, Uuid> {
        Box::pin(async move {
            let id = Uuid::new_v4();
            self.state
                .lock()
                .expect("state lock")
                .customers
                .push(StoredCustomer {
                    id,
                    workspace_id,
                    customer: customer.clone(),
                });
            Ok(id)
        })
    }

    fn insert_ticket<'a>(
        &'a self,
        workspace_id: Uuid,
        ticket: &'a NewTicket,
    ) -> RecordFuture<'a, Uuid> {
        Box::pin(async move {
            if self.fail_ticket_insert {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let id = Uuid::new_v4();
            let mut state = self.state.lock().expect("state lock");
            let taken = state.tickets.iter().any(|stored| {
                stored.workspace_id == workspace_id
                    && stored.ticket.invoice_number == ticket.invoice_number
            });
            if taken {
                return Err(StoreError::DuplicateInvoice(ticket.invoice_number.clone()));
            }
            state.tickets.push(StoredTicket {
                id,
                workspace_id,
                ticket: ticket.clone(),
            });
            Ok(id)
        })
    }

    fn search_tickets<'a>(
        &'a self,
        workspace_id: Uuid,
        query: &'a str,
        limit: i64,
    ) -> RecordFuture<'a, Vec<TicketSummary>> {
        Box::pin(async move {
            let needle = query.to_lowercase();
            let contains = |value: &Option<String>| {
                value
                    .as_deref()
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            };
            let state = self.state.lock().expect("state lock");
            Ok(state
                .tickets
                .iter()
                .rev()
                .filter(|stored| stored.workspace_id == workspace_id)
                .filter(|stored| {
                    let ticket = &stored.ticket;
                    contains(&ticket.customer_name)
                        || contains(&Some(ticket.invoice_number.clone()))
                        || contains(&ticket.equipment_brand)
                        || contains(&ticket.equipment_type)
                })
                .take(usize::try_from(limit).unwrap_or(0))
                .map(|stored| TicketSummary {
                    id: stored.id,
                    invoice_number: Some(stored.ticket.invoice_number.clone()),
                    customer_name: stored.ticket.customer_name.clone(),
                    status: stored.ticket.status.as_str().to_string(),
                    equipment_brand: stored.ticket.equipment_brand.clone(),
                    equipment_type: stored.ticket.equipment_type.clone(),
                    grand_total: None,
                })
                .collect())
        })
    }

    fn count_records(&self, workspace_id: Uuid, kind: RecordKind) -> RecordFuture<'_, i64> {
        Box::pin(async move {
            if self.failing_counts.contains(&kind) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let state = self.state.lock().expect("state lock");
            let count = match kind {
                RecordKind::Tickets => state
                    .tickets
                    .iter()
                    .filter(|stored| stored.workspace_id == workspace_id)
                    .count(),
                RecordKind::Customers => state
                    .customers
                    .iter()
                    .filter(|stored| stored.workspace_id == workspace_id)
                    .count(),
                RecordKind::Parts => state
                    .parts
                    .iter()
                    .filter(|owner| **owner == workspace_id)
                    .count(),
            };
            Ok(count as i64)
        })
    }
}
