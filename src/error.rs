//! Error types for the booking assistant.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Booking API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Fallback shown when the backend gives no usable message.
pub const GENERIC_API_MESSAGE: &str = "Unable to connect to booking system. Please try again.";

/// Failures talking to the scheduling backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No connectivity; raised before a request is issued when offline.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response. `message` is the backend's own message when it sent one.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The slot was taken between listing and reservation.
    #[error("Slot no longer available: {0}")]
    StaleAvailability(String),

    #[error("Invalid response from booking backend: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Message suitable for showing to the client.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Please check your connection.".to_string(),
            Self::Timeout(_) => "Request timeout. Please try again.".to_string(),
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Api { .. } | Self::InvalidResponse(_) => GENERIC_API_MESSAGE.to_string(),
            Self::StaleAvailability(_) => {
                "Time slot is no longer available. Please select a different time.".to_string()
            }
        }
    }

    /// Backend-provided text used when classifying failures.
    pub fn backend_message(&self) -> &str {
        match self {
            Self::Network(m) | Self::StaleAvailability(m) | Self::InvalidResponse(m) => m,
            Self::Api { message, .. } => message,
            Self::Timeout(_) => "",
        }
    }
}

/// Client-side field checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required { field: &'static str },

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Please enter a valid phone number.")]
    InvalidPhone,
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field } => field,
            Self::InvalidEmail => "email",
            Self::InvalidPhone => "phone",
        }
    }
}

/// Misuse of the step flow by the driver. These never come from the backend.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Action {action} is not valid at step {step}")]
    ActionNotAllowed { action: String, step: String },

    #[error("Step {step} requires a cart but none has been created")]
    MissingCart { step: String },

    #[error("Step {step} requires {field} to be selected")]
    MissingSelection { step: String, field: &'static str },

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Unknown staff member: {0}")]
    UnknownStaff(String),

    #[error("No slot {slot_id} on {date}")]
    UnknownSlot { date: String, slot_id: String },
}

/// Result type alias for the booking assistant.
pub type Result<T> = std::result::Result<T, Error>;
