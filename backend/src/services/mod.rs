//! Business logic services for the POS Inventory Platform

pub mod activity;
pub mod auth;
pub mod business;
pub mod catalog;
pub mod reconcile;
pub mod reporting;

pub use activity::ActivityService;
pub use auth::AuthService;
pub use business::BusinessService;
pub use catalog::CatalogService;
pub use reconcile::ReconcileService;
pub use reporting::ReportingService;

/// Fallback attribution when no actor display name is available
pub(crate) const GENERIC_ACTOR: &str = "Usuario del sistema";
