//! # tabkeeper Shared Library
//!
//! Types and data access shared by the tabkeeper API server.
//!
//! ## Module Organization
//!
//! - `models`: the four entities (users, tickets, orders, payments) and the `Entity` descriptor
//! - `query`: backend-neutral filters and date/time window parsing
//! - `store`: the generic `Store` trait with PostgreSQL and in-memory backends
//! - `records`: the tickets/users/orders/payments join over a time window
//! - `auth`: password hashing, JWT tokens, and the `Authorization` gate
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod query;
pub mod records;
pub mod store;

/// Current version of the tabkeeper shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
