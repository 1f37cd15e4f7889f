//! Wire types for the scheduling backend (JSON, camelCase).

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A backend-side booking-in-progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    #[serde(default)]
    pub available_categories: Vec<CartCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCategory {
    pub name: String,
    #[serde(default)]
    pub available_items: Vec<CartItem>,
}

/// A bookable service as listed in a cart's catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in cents.
    #[serde(default)]
    pub list_price: Option<i64>,
    /// Duration in minutes.
    #[serde(default)]
    pub list_duration: Option<u32>,
    /// Explicit category ("injectable" / "skin") when the backend provides one.
    #[serde(default)]
    pub treatment_category: Option<String>,
    #[serde(default)]
    pub staff_variants: Vec<StaffVariant>,
}

/// Binds one staff member to one service's pricing and duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffVariant {
    pub id: String,
    #[serde(default)]
    pub staff: Option<Staff>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A reservable appointment time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub start_time: DateTime<FixedOffset>,
}

/// Contact details attached to the cart before finalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl ClientInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Returned by `POST /booking`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub appointment_id: Option<String>,
}

/// Returned by `GET /booking/{id}` and `POST /booking/{id}/cancel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub location_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_tolerates_missing_collections() {
        let cart: Cart = serde_json::from_str(r#"{"id": "cart-1"}"#).unwrap();
        assert_eq!(cart.id, "cart-1");
        assert!(cart.available_categories.is_empty());

        let item: CartItem =
            serde_json::from_str(r#"{"id": "svc", "name": "Botox", "listPrice": 1200}"#).unwrap();
        assert_eq!(item.list_price, Some(1200));
        assert!(item.staff_variants.is_empty());
    }

    #[test]
    fn client_info_uses_camel_case() {
        let info = ClientInfo {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            phone_number: "(212) 555-0100".into(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["phoneNumber"], "(212) 555-0100");
        assert_eq!(info.full_name(), "Jane Doe");
    }

    #[test]
    fn time_slot_keeps_offset() {
        let slot: TimeSlot = serde_json::from_str(
            r#"{"id": "slot-1", "startTime": "2025-03-10T10:00:00-04:00"}"#,
        )
        .unwrap();
        assert_eq!(slot.start_time.offset().local_minus_utc(), -4 * 3600);
    }
}
