//! Crptgate - Rate-Limited CRPT Document Gateway
//!
//! This crate implements a client-side gateway for submitting documents to the
//! CRPT registration API. It enforces a hard cap on the number of outbound
//! requests per fixed time window, blocking excess callers until capacity is
//! replenished by a background scheduler.

pub mod api;
pub mod config;
pub mod error;
pub mod ratelimit;
