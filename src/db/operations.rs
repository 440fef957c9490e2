use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{Client, ClientRow, NewClient};
use crate::types::AppResult;

/// Persistent storage of client rows.
///
/// Lookups by slug only ever see active (not soft-deleted) clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Insert a new client and return it with its assigned id and timestamps.
    async fn insert(&self, input: &NewClient) -> AppResult<Client>;

    async fn find_active_by_slug(&self, slug: &str) -> AppResult<Option<Client>>;

    /// Write every mutable column of `client` and refresh `updated_at`.
    ///
    /// Returns `None` when the row is gone or was soft-deleted meanwhile.
    async fn update(&self, client: &Client) -> AppResult<Option<Client>>;

    /// Mark the client deleted. Returns `false` if it was not active.
    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

const CLIENT_COLUMNS: &str = "id, name, slug, is_project, self_capture, client_prefix, \
     client_logo, address, phone_number, city, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn insert(&self, input: &NewClient) -> AppResult<Client> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            r#"
            INSERT INTO clients
                (name, slug, is_project, self_capture, client_prefix, client_logo, address, phone_number, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.is_project)
        .bind(&input.self_capture)
        .bind(&input.client_prefix)
        .bind(&input.client_logo)
        .bind(&input.address)
        .bind(&input.phone_number)
        .bind(&input.city)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_active_by_slug(&self, slug: &str) -> AppResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE slug = $1 AND deleted_at IS NULL LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    async fn update(&self, client: &Client) -> AppResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            r#"
            UPDATE clients
            SET name = $2, slug = $3, is_project = $4, self_capture = $5, client_prefix = $6,
                client_logo = $7, address = $8, phone_number = $9, city = $10, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.slug)
        .bind(&client.is_project)
        .bind(&client.self_capture)
        .bind(&client.client_prefix)
        .bind(&client.client_logo)
        .bind(&client.address)
        .bind(&client.phone_number)
        .bind(&client.city)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET deleted_at = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        super::health_check(&self.pool).await?;
        Ok(())
    }
}
