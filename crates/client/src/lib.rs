//! Refectory ordering client library.
//!
//! Holds everything with an invariant: the session store and guard, the
//! session-scoped cart store, the authenticated request gateway, and the
//! checkout state machine. The `cli` crate renders these stores; no state
//! lives in the view layer.
//!
//! # Architecture
//!
//! - [`storage`] - persistent client-side key/value document (the stand-in
//!   for browser storage)
//! - [`session`] - opaque bearer token lifecycle plus the broadcast channel
//!   other contexts subscribe to for invalidation
//! - [`cart`] - local cart, persisted per session identity
//! - [`api`] - HTTP gateway that attaches the token and centralizes
//!   401-driven session teardown
//! - [`checkout`] - create-order / capture-payment state machine
//! - [`services`] - orchestration above the stores (auth flows)
//! - [`state`] - `AppState` bundle wiring the pieces together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
