use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use super::{NewTicket, Store, StoreError};
use crate::models::{TicketStatus, TicketSummary};

impl Store {
    pub async fn insert_ticket(
        &self,
        workspace_id: Uuid,
        ticket: &NewTicket,
    ) -> Result<Uuid, StoreError> {
        let ticket_id: Uuid = sqlx::query_scalar(
            "INSERT INTO tickets (
                workspace_id, invoice_number, ticket_date, status, customer_id,
                customer_name, customer_email, customer_phone, customer_address,
                equipment_type, equipment_brand, equipment_model, equipment_serial,
                equipment_year, problem_description, created_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING id",
        )
        .bind(workspace_id)
        .bind(&ticket.invoice_number)
        .bind(ticket.ticket_date)
        .bind(ticket.status.as_str())
        .bind(ticket.customer_id)
        .bind(ticket.customer_name.as_deref())
        .bind(ticket.customer_email.as_deref())
        .bind(ticket.customer_phone.as_deref())
        .bind(ticket.customer_address.as_deref())
        .bind(ticket.equipment_type.as_deref())
        .bind(ticket.equipment_brand.as_deref())
        .bind(ticket.equipment_model.as_deref())
        .bind(ticket.equipment_serial.as_deref())
        .bind(ticket.equipment_year.as_deref())
        .bind(ticket.problem_description.as_deref())
        .bind(ticket.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            let duplicate = err
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                StoreError::DuplicateInvoice(ticket.invoice_number.clone())
            } else {
                StoreError::Database(err)
            }
        })?;

        Ok(ticket_id)
    }

    pub async fn search_tickets(
        &self,
        workspace_id: Uuid,
        query: &str,
        limit: i64,
    ) -> Result<Vec<TicketSummary>, StoreError> {
        let pattern = format!("%{}%", escape_like_pattern(query.trim()));

        let rows = sqlx::query(
            "SELECT id, invoice_number, customer_name, status, equipment_brand, equipment_type,
                    grand_total::float8 AS grand_total
             FROM tickets
             WHERE workspace_id = $1
               AND (
                    customer_name ILIKE $2
                 OR invoice_number ILIKE $2
                 OR equipment_brand ILIKE $2
                 OR equipment_type ILIKE $2
               )
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(workspace_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ticket_summary_from_row).collect()
    }
}

fn ticket_summary_from_row(row: &PgRow) -> Result<TicketSummary, StoreError> {
    let raw_status: String = row.try_get("status")?;
    let status = TicketStatus::parse(&raw_status)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown ticket status {raw_status:?}")))?;

    Ok(TicketSummary {
        id: row.try_get("id")?,
        invoice_number: row.try_get("invoice_number")?,
        customer_name: row.try_get("customer_name")?,
        status: status.as_str().to_string(),
        equipment_brand: row.try_get("equipment_brand")?,
        equipment_type: row.try_get("equipment_type")?,
        grand_total: row.try_get("grand_total")?,
    })
}

/// Escapes LIKE metacharacters so user text is matched literally.
fn escape_like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
