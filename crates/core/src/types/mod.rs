//! Core types for Fitting Room.
//!
//! This module provides type-safe wrappers for identifiers and pricing.

pub mod id;
pub mod price;

pub use id::*;
pub use price::{CREDIT_PACKAGES, CreditPackage, CurrencyCode, Price};
