//! Insurer staff endpoints, mounted under `/api/admin` behind `require_admin`.

pub mod applications;
pub mod claims;
pub mod payments;
pub mod products;
pub mod reports;
pub mod settings;
pub mod startups;
