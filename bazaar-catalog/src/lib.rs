//! The durable catalog: users, teams, models, permissions, and job
//! messages, plus the shared response envelope and error type every
//! bazaar service returns.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{AppError, Envelope};
