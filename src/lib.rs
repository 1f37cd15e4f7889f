//! Booking Assist: a step-based conversational booking wizard.

pub mod api;
pub mod availability;
pub mod config;
pub mod error;
pub mod flow;
pub mod format;
pub mod session;
pub mod ui;
pub mod validation;
