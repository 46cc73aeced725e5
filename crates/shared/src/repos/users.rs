use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{Store, StoreError};

impl Store {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn create_user(&self) -> Result<Uuid, StoreError> {
        let user_id: Uuid = sqlx::query_scalar("INSERT INTO users DEFAULT VALUES RETURNING id")
            .fetch_one(&self.pool)
            .await?;
        Ok(user_id)
    }

    pub async fn create_workspace(&self, name: &str) -> Result<Uuid, StoreError> {
        let workspace_id: Uuid =
            sqlx::query_scalar("INSERT INTO workspaces (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(workspace_id)
    }

    /// Creates or replaces the user's profile, attaching it to `workspace_id` when given.
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        workspace_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO profiles (id, workspace_id)
             VALUES ($1, $2)
             ON CONFLICT (id) DO UPDATE SET workspace_id = EXCLUDED.workspace_id",
        )
        .bind(user_id)
        .bind(workspace_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn workspace_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let workspace_id: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT workspace_id FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(workspace_id.flatten())
    }
}
