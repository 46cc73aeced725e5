use tracing::warn;
use uuid::Uuid;

use crate::models::TurnResponse;
use crate::repos::{RecordKind, StoreError, TicketRecords};

/// Counts tickets, customers and parts concurrently. A failed count is reported as zero.
pub(super) async fn summarize(records: &dyn TicketRecords, workspace_id: Uuid) -> TurnResponse {
    let (tickets, customers, parts) = tokio::join!(
        records.count_records(workspace_id, RecordKind::Tickets),
        records.count_records(workspace_id, RecordKind::Customers),
        records.count_records(workspace_id, RecordKind::Parts),
    );

    let tickets = count_or_zero(workspace_id, RecordKind::Tickets, tickets);
    let customers = count_or_zero(workspace_id, RecordKind::Customers, customers);
    let parts = count_or_zero(workspace_id, RecordKind::Parts, parts);

    TurnResponse::Stats {
        message: format!(
            "📊 You have {tickets} tickets, {customers} customers, and {parts} parts in stock."
        ),
    }
}

fn count_or_zero(workspace_id: Uuid, kind: RecordKind, result: Result<i64, StoreError>) -> i64 {
    result.unwrap_or_else(|err| {
        warn!(
            workspace_id = %workspace_id,
            record_kind = kind.as_str(),
            "stat count failed, reporting zero: {err}"
        );
        0
    })
}
