//! Booking API client: typed access to the external scheduling service.
//!
//! The wizard only talks to the backend through [`BookingApi`], so tests
//! and alternative transports can stand in for the HTTP client.

pub mod client;
pub mod types;

pub use client::HttpBookingClient;
pub use types::*;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ApiError;

/// Operations the wizard needs from the scheduling backend.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Open a cart at a location. The cart lists the location's catalog.
    async fn create_cart(&self, location_id: &str) -> Result<Cart, ApiError>;

    /// Attach a service, optionally pinned to a staff variant.
    async fn add_service(
        &self,
        cart_id: &str,
        service_id: &str,
        staff_variant_id: Option<&str>,
    ) -> Result<Cart, ApiError>;

    async fn get_available_times(
        &self,
        cart_id: &str,
        date: NaiveDate,
        staff_id: Option<&str>,
    ) -> Result<Vec<TimeSlot>, ApiError>;

    /// Provisionally hold a slot on the cart.
    async fn reserve_slot(&self, cart_id: &str, slot_id: &str) -> Result<Cart, ApiError>;

    async fn update_client_info(&self, cart_id: &str, info: &ClientInfo)
    -> Result<Cart, ApiError>;

    /// Finalize the cart into a booking.
    async fn complete_booking(&self, cart_id: &str) -> Result<BookingConfirmation, ApiError>;

    async fn get_booking(&self, booking_id: &str) -> Result<Booking, ApiError>;

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> Result<Booking, ApiError>;
}
