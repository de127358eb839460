//! Repository modules for database access

pub mod reviews;
pub mod threads;
pub mod usage;
