// src/lib.rs

//! board-watcher Library
//!
//! Polls a forum board, picks out posts that appeared since the last poll,
//! and sends a Telegram message for every post whose title matches a keyword.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
