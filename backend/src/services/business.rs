//! Business (location) management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::Business;
use shared::validation::validate_business_code;

use crate::error::{AppError, AppResult};

/// Business management service
#[derive(Clone)]
pub struct BusinessService {
    db: PgPool,
}

/// Input for adding a new location
#[derive(Debug, Deserialize)]
pub struct CreateBusinessInput {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, FromRow)]
struct BusinessRow {
    id: Uuid,
    name: String,
    code: String,
    address: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BusinessRow> for Business {
    fn from(row: BusinessRow) -> Self {
        Business {
            id: row.id,
            name: row.name,
            code: row.code,
            address: row.address,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl BusinessService {
    /// Create a new BusinessService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all locations, alphabetically
    pub async fn list(&self) -> AppResult<Vec<Business>> {
        let rows = sqlx::query_as::<_, BusinessRow>(
            r#"
            SELECT id, name, code, address, phone, created_at, updated_at
            FROM businesses
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Business::from).collect())
    }

    /// Fetch a single location
    pub async fn get(&self, business_id: Uuid) -> AppResult<Business> {
        let row = sqlx::query_as::<_, BusinessRow>(
            r#"
            SELECT id, name, code, address, phone, created_at, updated_at
            FROM businesses
            WHERE id = $1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))?;

        Ok(row.into())
    }

    /// Add a new location
    pub async fn create(&self, input: CreateBusinessInput) -> AppResult<Business> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Business name is required".to_string(),
                message_es: "El nombre del negocio es obligatorio".to_string(),
            });
        }
        validate_business_code(&input.code).map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
            message_es: "El código del negocio no es válido".to_string(),
        })?;

        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM businesses WHERE code = $1")
            .bind(&input.code)
            .fetch_optional(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict {
                resource: "code".to_string(),
                message: "A business with this code already exists".to_string(),
                message_es: "Ya existe un negocio con este código".to_string(),
            });
        }

        let row = sqlx::query_as::<_, BusinessRow>(
            r#"
            INSERT INTO businesses (name, code, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, code, address, phone, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.code)
        .bind(&input.address)
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(business_id = %row.id, code = %row.code, "business created");
        Ok(row.into())
    }
}
