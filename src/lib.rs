//! Drinkery - a drink recipe catalog REST API
//!
//! Drinkery serves one resource, drinks, over HTTP/JSON:
//! - A public listing that shows only the colors and proportions of each recipe
//! - Full recipes and all writes behind bearer-token permissions
//! - SQLite persistence through sqlx

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
