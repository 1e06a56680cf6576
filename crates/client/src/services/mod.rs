//! Service layer orchestrating the stores and the gateway.

pub mod auth;
