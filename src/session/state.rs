//! The booking session value and its reducer.
//!
//! A `Session` is never edited field by field from the outside. Each
//! transition produces a new value via [`Session::transition`], and a
//! restart replaces it with [`Session::new`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::model::{
    BookingFlow, CalendarAvailability, ClientType, InjectorChoice, SelectedService, SelectedTime,
    Service, StaffMember, TreatmentType,
};
use crate::api::ClientInfo;
use crate::config::Location;
use crate::flow::Step;

/// State accumulated while walking one booking flow.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Minted per flow; results requested under another flow are discarded.
    flow_id: Uuid,
    pub current_step: Step,
    pub client_type: Option<ClientType>,
    pub treatment_type: Option<TreatmentType>,
    /// Only ever set while `treatment_type` is injectable.
    pub booking_flow: Option<BookingFlow>,
    pub selected_location: Option<Location>,
    pub selected_injector: Option<InjectorChoice>,
    pub selected_service: Option<SelectedService>,
    pub selected_time: Option<SelectedTime>,
    pub selected_date: Option<NaiveDate>,
    pub cart_id: Option<String>,
    pub client_info: Option<ClientInfo>,
    pub available_staff: Vec<StaffMember>,
    pub available_services: Vec<Service>,
    pub calendar_availability: CalendarAvailability,
    /// First day of the displayed month.
    pub calendar_month: Option<NaiveDate>,
    /// Locations of the injector whose availability is being viewed.
    pub injector_locations: Vec<String>,
    pub location_colors: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            flow_id: Uuid::new_v4(),
            current_step: Step::Welcome,
            client_type: None,
            treatment_type: None,
            booking_flow: None,
            selected_location: None,
            selected_injector: None,
            selected_service: None,
            selected_time: None,
            selected_date: None,
            cart_id: None,
            client_info: None,
            available_staff: Vec::new(),
            available_services: Vec::new(),
            calendar_availability: BTreeMap::new(),
            calendar_month: None,
            injector_locations: Vec::new(),
            location_colors: BTreeMap::new(),
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// Merge `patch` and move to `step`.
    pub fn transition(&self, step: Step, patch: SessionPatch) -> Session {
        let mut next = self.apply(patch);
        next.current_step = step;
        next
    }

    /// Merge `patch` without changing the current step.
    pub fn apply(&self, patch: SessionPatch) -> Session {
        let mut next = self.clone();

        if let Some(v) = patch.client_type {
            next.client_type = Some(v);
        }
        if let Some(v) = patch.treatment_type {
            next.treatment_type = Some(v);
        }
        if let Some(v) = patch.booking_flow {
            next.booking_flow = Some(v);
        }
        if let Some(v) = patch.selected_location {
            next.selected_location = Some(v);
        }
        if let Some(v) = patch.selected_injector {
            next.selected_injector = Some(v);
        }
        if let Some(v) = patch.selected_service {
            next.selected_service = Some(v);
        }
        if let Some(v) = patch.selected_time {
            next.selected_time = Some(v);
        }
        if let Some(v) = patch.selected_date {
            next.selected_date = Some(v);
        }
        if let Some(v) = patch.cart_id {
            next.cart_id = Some(v);
        }
        if let Some(v) = patch.client_info {
            next.client_info = Some(v);
        }
        if let Some(v) = patch.available_staff {
            next.available_staff = v;
        }
        if let Some(v) = patch.available_services {
            next.available_services = v;
        }
        if let Some(entries) = patch.calendar_entries {
            // Whole-entry replacement per date.
            next.calendar_availability.extend(entries);
        }
        if let Some(v) = patch.calendar_month {
            next.calendar_month = Some(v);
        }
        if let Some(v) = patch.injector_locations {
            next.injector_locations = v;
        }
        if let Some(v) = patch.location_colors {
            next.location_colors = v;
        }

        if next.treatment_type != Some(TreatmentType::Injectable) {
            next.booking_flow = None;
        }

        next
    }

    /// Write availability fetched under `flow_id`, or `None` if the flow has
    /// since been replaced.
    pub fn merge_availability(
        &self,
        flow_id: Uuid,
        entries: CalendarAvailability,
    ) -> Option<Session> {
        if flow_id != self.flow_id {
            return None;
        }
        Some(self.apply(SessionPatch {
            calendar_entries: Some(entries),
            ..Default::default()
        }))
    }

    /// Staff id the client is constrained to, if any.
    pub fn selected_staff_id(&self) -> Option<&str> {
        self.selected_injector.as_ref().and_then(|i| i.staff_id())
    }

    pub fn staff_member(&self, id: &str) -> Option<&StaffMember> {
        self.available_staff.iter().find(|s| s.id == id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields to set on the session. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub client_type: Option<ClientType>,
    pub treatment_type: Option<TreatmentType>,
    pub booking_flow: Option<BookingFlow>,
    pub selected_location: Option<Location>,
    pub selected_injector: Option<InjectorChoice>,
    pub selected_service: Option<SelectedService>,
    pub selected_time: Option<SelectedTime>,
    pub selected_date: Option<NaiveDate>,
    pub cart_id: Option<String>,
    pub client_info: Option<ClientInfo>,
    pub available_staff: Option<Vec<StaffMember>>,
    pub available_services: Option<Vec<Service>>,
    /// Per-date entries to write; dates not listed are left alone.
    pub calendar_entries: Option<CalendarAvailability>,
    pub calendar_month: Option<NaiveDate>,
    pub injector_locations: Option<Vec<String>>,
    pub location_colors: Option<BTreeMap<String, String>>,
}

impl SessionPatch {
    pub fn none() -> Self {
        Self::default()
    }
}
