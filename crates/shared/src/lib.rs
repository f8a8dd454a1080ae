//! Shared utilities and common types for the Bus Tracker backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Nonce fingerprinting (hashing)
//! - Cursor-based pagination for history queries
//! - Common validation logic

pub mod crypto;
pub mod pagination;
pub mod validation;
