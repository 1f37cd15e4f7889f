//! Selection and catalog values carried by the booking session.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::StaffVariant;

/// Sentinel id for "no specific staff constraint".
pub const FIRST_AVAILABLE_ID: &str = "first-available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientType {
    New,
    Returning,
    Member,
}

impl ClientType {
    pub const ALL: [ClientType; 3] = [Self::New, Self::Returning, Self::Member];

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New Client",
            Self::Returning => "Returning Client",
            Self::Member => "Member",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::New => "First time at Get Plump",
            Self::Returning => "I've been here before",
            Self::Member => "I have a membership",
        }
    }

    /// Greeting used when asking for the treatment type.
    pub fn greeting(&self) -> &'static str {
        match self {
            Self::New => "Welcome to Get Plump!",
            Self::Returning => "Welcome back!",
            Self::Member => "Hello, valued member!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreatmentType {
    Injectable,
    Skin,
    /// Browse one injector's openings across every location they work at.
    InjectorAvailability,
}

impl TreatmentType {
    pub const ALL: [TreatmentType; 3] = [Self::Injectable, Self::Skin, Self::InjectorAvailability];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Injectable => "Injectable Treatments",
            Self::Skin => "Skin Treatments",
            Self::InjectorAvailability => "See a Specific Injector's Availability",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Injectable => "Botox, fillers, and other injectable services",
            Self::Skin => "Laser, microneedling, and skincare services",
            Self::InjectorAvailability => {
                "View open slots for your preferred injector across all locations"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingFlow {
    ByInjector,
    ByLocation,
}

impl BookingFlow {
    pub const ALL: [BookingFlow; 2] = [Self::ByInjector, Self::ByLocation];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ByInjector => "Book by Injector",
            Self::ByLocation => "Book by Location",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ByInjector => "Choose your preferred injector first",
            Self::ByLocation => "Choose your preferred location first",
        }
    }
}

/// The provider the client asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InjectorChoice {
    /// The backend assigns an injector at finalization.
    FirstAvailable,
    Staff { id: String, name: String },
}

impl InjectorChoice {
    /// Backend id, or the `first-available` sentinel.
    pub fn id(&self) -> &str {
        match self {
            Self::FirstAvailable => FIRST_AVAILABLE_ID,
            Self::Staff { id, .. } => id,
        }
    }

    /// Id of a specific staff member, `None` for first available.
    pub fn staff_id(&self) -> Option<&str> {
        match self {
            Self::FirstAvailable => None,
            Self::Staff { id, .. } => Some(id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::FirstAvailable => "First Available",
            Self::Staff { name, .. } => name,
        }
    }
}

/// A staff member aggregated across every location they work at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    /// Location names, in order of first appearance.
    pub locations: Vec<String>,
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn as_choice(&self) -> InjectorChoice {
        InjectorChoice::Staff {
            id: self.id.clone(),
            name: self.full_name(),
        }
    }
}

/// A service offered at the selected location for the selected treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Cents.
    pub price: Option<i64>,
    /// Minutes.
    pub duration: Option<u32>,
    pub category: String,
    pub staff_variants: Vec<StaffVariant>,
}

impl Service {
    /// Variant binding this service to a particular staff member.
    pub fn variant_for(&self, staff_id: &str) -> Option<&StaffVariant> {
        self.staff_variants
            .iter()
            .find(|v| v.staff.as_ref().is_some_and(|s| s.id == staff_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedService {
    pub id: String,
    pub name: String,
}

/// A reserved slot with its display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedTime {
    pub id: String,
    /// e.g. `10:00 AM`
    pub time: String,
    /// e.g. `Mon, Mar 10`
    pub date: String,
    pub start_time: DateTime<FixedOffset>,
}

/// One slot in the calendar; `location` is set in the cross-location view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSlot {
    pub id: String,
    pub start_time: DateTime<FixedOffset>,
    pub location: Option<String>,
}

/// Date → slots for that date. Entries are replaced whole, never merged.
pub type CalendarAvailability = BTreeMap<NaiveDate, Vec<CalendarSlot>>;
