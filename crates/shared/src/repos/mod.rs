use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{TicketStatus, TicketSummary};

mod auth;
mod customers;
mod records;
mod stats;
mod tickets;
mod users;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invoice number {0} is already used in this workspace")]
    DuplicateInvoice(String),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Tickets,
    Customers,
    Parts,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::Customers => "customers",
            Self::Parts => "parts",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub invoice_number: String,
    pub ticket_date: NaiveDate,
    pub status: TicketStatus,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub equipment_type: Option<String>,
    pub equipment_brand: Option<String>,
    pub equipment_model: Option<String>,
    pub equipment_serial: Option<String>,
    pub equipment_year: Option<String>,
    pub problem_description: Option<String>,
    pub created_by: Option<Uuid>,
}

pub type RecordFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Workspace-scoped record operations the assistant depends on.
pub trait TicketRecords: Send + Sync {
    /// Case-insensitive exact name match, oldest customer first.
    fn find_customer_by_name<'a>(
        &'a self,
        workspace_id: Uuid,
        name: &'a str,
    ) -> RecordFuture<'a, Option<Uuid>>;

    fn insert_customer<'a>(
        &'a self,
        workspace_id: Uuid,
        customer: &'a NewCustomer,
    ) -> RecordFuture<'a, Uuid>;

    fn insert_ticket<'a>(
        &'a self,
        workspace_id: Uuid,
        ticket: &'a NewTicket,
    ) -> RecordFuture<'a, Uuid>;

    /// Tickets whose customer name, invoice number, equipment brand or equipment type contain
    /// `query` case-insensitively, newest first.
    fn search_tickets<'a>(
        &'a self,
        workspace_id: Uuid,
        query: &'a str,
        limit: i64,
    ) -> RecordFuture<'a, Vec<TicketSummary>>;

    fn count_records(&self, workspace_id: Uuid, kind: RecordKind) -> RecordFuture<'_, i64>;
}
