//! What the client is told once finalization returns.

use crate::api::BookingConfirmation;
use crate::error::ApiError;
use crate::session::Session;

/// Summary shown after a successful booking.
pub fn success_message(session: &Session, confirmation: &BookingConfirmation) -> String {
    let mut lines = vec!["Booking Completed Successfully!".to_string(), String::new()];

    if let Some(location) = &session.selected_location {
        lines.push(format!("Location: {}", location.name()));
    }
    if let Some(service) = &session.selected_service {
        lines.push(format!("Service: {}", service.name));
    }
    if let Some(time) = &session.selected_time {
        lines.push(format!("Date & Time: {} at {}", time.date, time.time));
    }
    if let Some(injector) = &session.selected_injector {
        lines.push(format!("Provider: {}", injector.name()));
    }
    if let Some(client) = &session.client_info {
        lines.push(format!("Client: {}", client.full_name()));
    }
    if let Some(id) = &confirmation.booking_id {
        lines.push(format!("Booking ID: {id}"));
    }
    if let Some(id) = &confirmation.appointment_id {
        lines.push(format!("Appointment ID: {id}"));
    }

    lines.push(String::new());
    lines.push(
        "Your appointment has been confirmed and added to our calendar. \
         You should receive a confirmation email shortly."
            .to_string(),
    );
    lines.join("\n")
}

/// Why finalization failed, as far as the backend's message reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFailure {
    PaymentRequired,
    Permission,
    Unavailable,
    Backend,
    Unknown,
}

impl BookingFailure {
    /// Checked in order: payment, permission, availability, backend error.
    pub fn classify(err: &ApiError) -> Self {
        match err {
            ApiError::Network(_) | ApiError::Timeout(_) => Self::Unknown,
            ApiError::StaleAvailability(_) => Self::Unavailable,
            ApiError::Api { .. } | ApiError::InvalidResponse(_) => {
                let text = err.backend_message().to_lowercase();
                if text.contains("payment") {
                    Self::PaymentRequired
                } else if text.contains("permission") || text.contains("unauthorized") {
                    Self::Permission
                } else if text.contains("time") || text.contains("available") {
                    Self::Unavailable
                } else if text.contains("graphql error") {
                    Self::Backend
                } else {
                    Self::Unknown
                }
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::PaymentRequired => {
                "Payment is required to complete this booking. Please contact us to finalize your appointment."
            }
            Self::Permission => {
                "Unable to complete booking due to system permissions. Please contact us to complete your appointment."
            }
            Self::Unavailable => {
                "The selected time is no longer available. Please choose a different time or contact us."
            }
            Self::Backend => "Booking system error. Please contact us to complete your appointment.",
            Self::Unknown => {
                "We encountered an issue completing your booking. Please contact us and we'll be happy to help."
            }
        }
    }
}
