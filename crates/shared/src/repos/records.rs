use uuid::Uuid;

use super::{NewCustomer, NewTicket, RecordFuture, RecordKind, Store, TicketRecords};
use crate::models::TicketSummary;

impl TicketRecords for Store {
    fn find_customer_by_name<'a>(
        &'a self,
        workspace_id: Uuid,
        name: &'a str,
    ) -> RecordFuture<'a, Option<Uuid>> {
        Box::pin(Store::find_customer_by_name(self, workspace_id, name))
    }

    fn insert_customer<'a>(
        &'a self,
        workspace_id: Uuid,
        customer: &'a NewCustomer,
    ) -> RecordFuture<'a, Uuid> {
        Box::pin(Store::insert_customer(self, workspace_id, customer))
    }

    fn insert_ticket<'a>(
        &'a self,
        workspace_id: Uuid,
        ticket: &'a NewTicket,
    ) -> RecordFuture<'a, Uuid> {
        Box::pin(Store::insert_ticket(self, workspace_id, ticket))
    }

    fn search_tickets<'a>(
        &'a self,
        workspace_id: Uuid,
        query: &'a str,
        limit: i64,
    ) -> RecordFuture<'a, Vec<TicketSummary>> {
        Box::pin(Store::search_tickets(self, workspace_id, query, limit))
    }

    fn count_records(&self, workspace_id: Uuid, kind: RecordKind) -> RecordFuture<'_, i64> {
        Box::pin(Store::count_records(self, workspace_id, kind))
    }
}
