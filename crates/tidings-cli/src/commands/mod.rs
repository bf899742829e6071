//! Command handlers

pub mod config;
pub mod news;
pub mod notes;
