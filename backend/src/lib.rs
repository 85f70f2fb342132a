//! # Access Dashboard Backend
//!
//! REST backend for a condominium access-control dashboard. Gate devices
//! record access events; the dashboard browses them, watches the audit log
//! (bitácora) and renders an hour × weekday heatmap of recent traffic.
//!
//! ## Architecture
//!
//! - [`models`]: access events, audit events, pagination
//! - [`services`]: heatmap aggregation, audit recording with dedup, clock
//! - [`db`]: repository traits, in-memory and Postgres backends, factory
//! - [`routes`]: response/request shapes per endpoint group
//! - [`api`]: consolidated DTO re-exports
//! - [`config`]: server settings from the environment
//! - [`http`]: axum router and handlers (feature `http-server`)

// RepositoryError carries a structured context; keep it by value.
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
