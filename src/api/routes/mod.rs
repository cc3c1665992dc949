//! API route handlers

pub mod dashboard;
pub mod health;
pub mod results;
pub mod targets;
