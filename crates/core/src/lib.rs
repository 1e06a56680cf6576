//! Refectory Core - Shared types library.
//!
//! This crate provides common types used across all Refectory components:
//! - `client` - The ordering client library (session, cart, gateway, checkout)
//! - `cli` - Terminal front-end for browsing the menu and placing orders
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the
//!   menu/cart/order wire types spoken by the campus backend API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
