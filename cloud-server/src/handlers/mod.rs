//! HTTP handlers

pub mod health;
pub mod auth;
pub mod scan;
pub mod history;
pub mod lists;
pub mod reports;
pub mod admin;
pub mod stats;
pub mod watchlist;
pub mod api_keys;
