// src/lib.rs

//! Page update checker library.
//!
//! Decides whether watched pages changed since the last run, using the
//! `Last-Modified` header when it can be trusted and a content fingerprint
//! otherwise.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
