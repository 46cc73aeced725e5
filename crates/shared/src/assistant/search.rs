use uuid::Uuid;

use crate::models::TurnResponse;
use crate::repos::{StoreError, TicketRecords};

const MAX_SEARCH_RESULTS: i64 = 5;

pub(super) async fn search_tickets(
    records: &dyn TicketRecords,
    workspace_id: Uuid,
    query: &str,
) -> Result<TurnResponse, StoreError> {
    let query = query.trim();
    let tickets = records
        .search_tickets(workspace_id, query, MAX_SEARCH_RESULTS)
        .await?;

    let message = match tickets.len() {
        0 => format!("No tickets found for \"{query}\". Try a different name or number."),
        1 => "Found 1 ticket:".to_string(),
        count => format!("Found {count} tickets:"),
    };

    Ok(TurnResponse::SearchResults { tickets, message })
}
