//! Tiffin client state layer.
//!
//! This crate owns the persisted, single-restaurant shopping cart and the
//! authenticated session of the Tiffin ordering client. It is an embedded
//! library consumed by a UI layer; it exposes no CLI or HTTP surface of its
//! own.
//!
//! # Architecture
//!
//! - [`cart`] - Cart state manager: line items scoped to one restaurant,
//!   mirrored to a persistent key-value store
//! - [`session`] - Auth token provider backed by the same store
//! - [`profile`] - Network-only profile fetcher with observable state
//! - [`state`] - Session orchestrator composing the pieces (logout,
//!   `is_logged_in`, cart count)
//!
//! Memory is authoritative for the running session; storage is only
//! consulted at cold start.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod api;
pub mod cache;
pub mod cart;
pub mod config;
pub mod error;
pub mod location;
pub mod profile;
pub mod session;
pub mod state;
pub mod storage;
