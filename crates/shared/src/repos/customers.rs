use uuid::Uuid;

use super::{NewCustomer, Store, StoreError};

impl Store {
    pub async fn find_customer_by_name(
        &self,
        workspace_id: Uuid,
        name: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let customer_id = sqlx::query_scalar(
            "SELECT id
             FROM customers
             WHERE workspace_id = $1
               AND lower(name) = lower($2)
             ORDER BY created_at ASC, id ASC
             LIMIT 1",
        )
        .bind(workspace_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer_id)
    }

    pub async fn insert_customer(
        &self,
        workspace_id: Uuid,
        customer: &NewCustomer,
    ) -> Result<Uuid, StoreError> {
        let customer_id: Uuid = sqlx::query_scalar(
            "INSERT INTO customers (workspace_id, name, email, phone, address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(workspace_id)
        .bind(&customer.name)
        .bind(customer.email.as_deref())
        .bind(customer.phone.as_deref())
        .bind(customer.address.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(customer_id)
    }
}
