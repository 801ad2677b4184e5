//! Stock price and news sentiment dashboard.
//!
//! The query core (`loader`, `filter`, `classify`, `aggregate`, `headline`,
//! `selection`) is pure and synchronous over an immutable [`loader::Dataset`].
//! `tui` and `web` are the two presentation surfaces built on top of it.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod generator;
pub mod headline;
pub mod loader;
pub mod selection;
pub mod tui;
pub mod types;
pub mod views;
pub mod web;
