//! HTTP implementation of [`BookingApi`] over reqwest.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use super::types::{Booking, BookingConfirmation, Cart, ClientInfo, TimeSlot};
use super::BookingApi;
use crate::config::ApiConfig;
use crate::error::{ApiError, GENERIC_API_MESSAGE};
use crate::format;

/// Talks to the credential-holding relay in front of the scheduling provider.
///
/// Every call is bounded by the configured timeout. When the shared
/// connectivity flag is down, calls fail with [`ApiError::Network`] without
/// touching the network.
#[derive(Clone)]
pub struct HttpBookingClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    online: Arc<AtomicBool>,
}

impl HttpBookingClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Record a connectivity change reported by the host environment.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        if !self.is_online() {
            return Err(ApiError::Network("no network connection".to_string()));
        }

        let url = self.url(path);
        debug!(%method, %url, "Booking API request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(%method, %url, error = %e, "Booking API transport failure");
                return Err(ApiError::Network(e.to_string()));
            }
            Err(_) => {
                warn!(%method, %url, timeout = ?self.timeout, "Booking API request timed out");
                return Err(ApiError::Timeout(self.timeout));
            }
        };

        debug!(status = status.as_u16(), %url, "Booking API response");

        if !status.is_success() {
            return Err(error_from_response(status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Convert a non-2xx response into a typed error, keeping the backend's message.
fn error_from_response(status: StatusCode, body: &[u8]) -> ApiError {
    let backend_message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty());

    let message = backend_message.unwrap_or_else(|| GENERIC_API_MESSAGE.to_string());

    warn!(
        status = status.as_u16(),
        reason = status.canonical_reason().unwrap_or("Unknown"),
        %message,
        "Booking API returned an error"
    );

    if status == StatusCode::CONFLICT {
        ApiError::StaleAvailability(message)
    } else {
        ApiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl BookingApi for HttpBookingClient {
    async fn create_cart(&self, location_id: &str) -> Result<Cart, ApiError> {
        self.request(
            Method::POST,
            "/cart",
            &[],
            Some(json!({ "locationId": location_id })),
        )
        .await
    }

    async fn add_service(
        &self,
        cart_id: &str,
        service_id: &str,
        staff_variant_id: Option<&str>,
    ) -> Result<Cart, ApiError> {
        self.request(
            Method::POST,
            &format!("/cart/{cart_id}/items"),
            &[],
            Some(json!({ "serviceId": service_id, "staffId": staff_variant_id })),
        )
        .await
    }

    async fn get_available_times(
        &self,
        cart_id: &str,
        date: NaiveDate,
        staff_id: Option<&str>,
    ) -> Result<Vec<TimeSlot>, ApiError> {
        let mut query = vec![
            ("cartId", cart_id.to_string()),
            ("date", format::api_date(date)),
        ];
        if let Some(staff_id) = staff_id {
            query.push(("staffId", staff_id.to_string()));
        }
        self.request(Method::GET, "/availability", &query, None).await
    }

    async fn reserve_slot(&self, cart_id: &str, slot_id: &str) -> Result<Cart, ApiError> {
        self.request(
            Method::POST,
            &format!("/cart/{cart_id}/reserve"),
            &[],
            Some(json!({ "timeSlotId": slot_id })),
        )
        .await
    }

    async fn update_client_info(
        &self,
        cart_id: &str,
        info: &ClientInfo,
    ) -> Result<Cart, ApiError> {
        let body =
            serde_json::to_value(info).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        self.request(Method::PUT, &format!("/cart/{cart_id}/client"), &[], Some(body))
            .await
    }

    async fn complete_booking(&self, cart_id: &str) -> Result<BookingConfirmation, ApiError> {
        self.request(
            Method::POST,
            "/booking",
            &[],
            Some(json!({ "cartId": cart_id, "paymentInfo": null })),
        )
        .await
    }

    async fn get_booking(&self, booking_id: &str) -> Result<Booking, ApiError> {
        self.request(Method::GET, &format!("/booking/{booking_id}"), &[], None)
            .await
    }

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> Result<Booking, ApiError> {
        self.request(
            Method::POST,
            &format!("/booking/{booking_id}/cancel"),
            &[],
            Some(json!({ "reason": reason })),
        )
        .await
    }
}
