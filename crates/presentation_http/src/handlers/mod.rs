//! HTTP request handlers

pub mod chaos_admin;
pub mod gateway;
pub mod health;
pub mod metrics;
