//! Shared NHL types: upstream model, data-source client, score strategies,
//! display formatters, config and platform paths.

pub mod api;
pub mod config;
pub mod format;
pub mod model;
pub mod platform;
pub mod score;
