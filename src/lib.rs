// src/lib.rs

//! Exposure site watcher library.
//!
//! Scrapes the exposure locations page, detects new sites per category and
//! notifies bot subscribers.

pub mod bot;
pub mod context;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
