//! # Tabkeeper API Server Library
//!
//! This library provides the HTTP surface of the tab keeping service: CRUD over users,
//! tickets, orders and payments, date-window lookups, and the records join.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request body and path parameter extraction
//! - `middleware`: Request logging
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
