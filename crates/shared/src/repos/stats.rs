use uuid::Uuid;

use super::{RecordKind, Store, StoreError};

impl Store {
    pub async fn count_records(
        &self,
        workspace_id: Uuid,
        kind: RecordKind,
    ) -> Result<i64, StoreError> {
        let sql = match kind {
            RecordKind::Tickets => "SELECT COUNT(*)::bigint FROM tickets WHERE workspace_id = $1",
            RecordKind::Customers => {
                "SELECT COUNT(*)::bigint FROM customers WHERE workspace_id = $1"
            }
            RecordKind::Parts => "SELECT COUNT(*)::bigint FROM parts WHERE workspace_id = $1",
        };

        let count: i64 = sqlx::query_scalar(sql)
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
