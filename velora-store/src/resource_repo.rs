use crate::booking_repo::{enum_from_string, enum_to_string, from_json, storage, to_json};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;
use velora_booking::{RepositoryError, ResourceRepository};
use velora_catalog::BookableResource;

pub struct PgResourceRepository {
    pool: PgPool,
}

impl PgResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ResourceRow {
    id: Uuid,
    kind: String,
    name: String,
    description: Option<String>,
    unit_price: Decimal,
    currency: String,
    capacity: Value,
    is_active: bool,
    metadata: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for BookableResource {
    type Error = RepositoryError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(BookableResource {
            id: row.id,
            kind: enum_from_string(&row.kind)?,
            name: row.name,
            description: row.description,
            unit_price: row.unit_price,
            currency: row.currency,
            capacity: from_json(row.capacity)?,
            is_active: row.is_active,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

const SELECT_RESOURCE: &str = r#"
    SELECT id, kind, name, description, unit_price, currency, capacity,
           is_active, metadata, created_at
    FROM resources
"#;

#[async_trait]
impl ResourceRepository for PgResourceRepository {
    async fn insert(&self, resource: &BookableResource) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO resources (
                id, kind, name, description, unit_price, currency, capacity,
                is_active, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                unit_price = EXCLUDED.unit_price,
                currency = EXCLUDED.currency,
                capacity = EXCLUDED.capacity,
                is_active = EXCLUDED.is_active,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(resource.id)
        .bind(enum_to_string(&resource.kind)?)
        .bind(&resource.name)
        .bind(&resource.description)
        .bind(resource.unit_price)
        .bind(&resource.currency)
        .bind(to_json(&resource.capacity)?)
        .bind(resource.is_active)
        .bind(&resource.metadata)
        .bind(resource.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<BookableResource>, RepositoryError> {
        let row = sqlx::query_as::<_, ResourceRow>(&format!("{SELECT_RESOURCE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(BookableResource::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<BookableResource>, RepositoryError> {
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            "{SELECT_RESOURCE} ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(BookableResource::try_from).collect()
    }
}
