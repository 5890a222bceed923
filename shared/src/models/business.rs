//! Business (store location) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    /// Short code used in receipts and reports (e.g. "CENTRO")
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new location with its admin account
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterBusinessInput {
    pub business_name: String,
    pub business_code: String,
    pub admin_name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}
