//! Telegram transport for mediarelay.
//!
//! Receives operator messages via long polling, classifies them into a
//! forwarding session (preview + optional original), and on `/forward_end`
//! republishes the pair to the configured channel and records provenance in
//! the remote store.

pub mod access;
pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod publish;
pub mod session;
pub mod state;

pub use {
    config::BotConfig,
    error::{Error, Result},
};
