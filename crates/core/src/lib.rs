//! Storefront Cart Core - Shared types library.
//!
//! This crate provides the types shared by the storefront binary and its
//! integration tests:
//! - `storefront` - Cart session layer, backend client and HTTP routes
//! - `integration-tests` - End-to-end tests against the in-memory backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for backend ids and decimal prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
