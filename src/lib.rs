// src/lib.rs

//! afisha-watch library
//!
//! Polls a theater afisha page, extracts show records from one of two
//! layouts, dedups against a Redis-backed novelty store and announces
//! new shows via Telegram, with a daily liveness heartbeat.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod heartbeat;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod server;
pub mod store;
