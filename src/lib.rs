//! Community poll intake, storage and analytics.
//!
//! The analytics core ([`tally`] and [`heatmap`]) is pure: it works on
//! submissions already fetched from storage and never does I/O.

pub mod db;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod models;
pub mod questions;
pub mod report;
pub mod submission;
pub mod tally;
