//! Core types, config, errors, and relay protocol for Rusty Sprite.

pub mod config;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod types;
