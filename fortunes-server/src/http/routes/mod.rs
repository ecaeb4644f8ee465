//! Route handlers organized by resource

pub mod fortunes;
pub mod health;
