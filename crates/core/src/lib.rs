//! Emporium Core - Shared domain types.
//!
//! This crate provides the types used across all Emporium components:
//! - `api` - The HTTP service (auth, catalog, orders)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. With the `postgres` feature enabled the types
//! also know how to encode and decode themselves through `sqlx`.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, currencies, statuses and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
