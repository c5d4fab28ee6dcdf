//! Fitting Room studio library.
//!
//! The HTTP service behind the virtual try-on studio, as a library so the
//! binary, the CLI and the integration tests share it.
//!
//! - [`services`] - The per-user [`StudioSession`](services::StudioSession),
//!   credit ledger and the seams to generation and storage
//! - [`gemini`], [`supabase`], [`payments`], [`db`] - Adapters for those seams
//! - [`routes`], [`middleware`], [`state`], [`error`] - The axum API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
