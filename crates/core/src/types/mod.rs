//! Core types for Refectory.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod menu;
pub mod order;
pub mod status;

pub use cart::CartLine;
pub use email::{Email, EmailError};
pub use id::*;
pub use menu::MenuItem;
pub use order::{Order, OrderItem};
pub use status::OrderStatus;
