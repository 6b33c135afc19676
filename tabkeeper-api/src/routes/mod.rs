/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Login (signup reuses the generic user create)
/// - `entities`: Generic list/create/get/update/delete and creation-date range
/// - `users`: Id range and name lookups
/// - `tickets`: Owner, date-time and payment status lookups
/// - `records`: Tickets joined with their users, orders and payments

pub mod auth;
pub mod entities;
pub mod health;
pub mod records;
pub mod tickets;
pub mod users;
