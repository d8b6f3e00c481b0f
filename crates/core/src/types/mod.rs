//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod pagination;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Currency, CurrencyError, round_money};
pub use pagination::Pagination;
pub use status::*;
