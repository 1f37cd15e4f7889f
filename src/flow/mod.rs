//! The booking step graph.
//!
//! A flow is a closed set of [`Step`]s. Moving between them always goes
//! through [`Wizard::go_to_step`](router::Wizard::go_to_step): the patch is
//! merged into the session first, then the target step's entry action runs
//! and may hand back another [`Transition`].

pub mod calendar;
pub mod catalog;
pub mod outcome;
pub mod router;
mod steps;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::ClientInfo;
use crate::session::{BookingFlow, ClientType, InjectorChoice, SessionPatch, TreatmentType};
use crate::ui::ContactContext;

pub use router::Wizard;

/// Steps of the booking conversation, in flow order.
///
/// welcome → client-type → treatment-type → (booking-flow) →
/// provider-location → services → calendar → user-info → confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Welcome,
    ClientType,
    TreatmentType,
    BookingFlow,
    ProviderLocation,
    Services,
    Calendar,
    UserInfo,
    Confirmation,
}

impl Step {
    /// Whether the flow ends here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmation)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::ClientType => "client-type",
            Self::TreatmentType => "treatment-type",
            Self::BookingFlow => "booking-flow",
            Self::ProviderLocation => "provider-location",
            Self::Services => "services",
            Self::Calendar => "calendar",
            Self::UserInfo => "user-info",
            Self::Confirmation => "confirmation",
        };
        write!(f, "{s}")
    }
}

/// A move to `step` after merging `patch` into the session.
#[derive(Debug, Clone)]
pub struct Transition {
    pub step: Step,
    pub patch: SessionPatch,
}

impl Transition {
    pub fn new(step: Step, patch: SessionPatch) -> Self {
        Self { step, patch }
    }

    pub fn to(step: Step) -> Self {
        Self::new(step, SessionPatch::none())
    }
}

/// Something the client picked. Every button the wizard offers carries one.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ChooseClientType(ClientType),
    ChooseTreatment(TreatmentType),
    ChooseBookingFlow(BookingFlow),
    ChooseInjector(InjectorChoice),
    /// Show one injector's openings across all their locations.
    ViewInjectorAvailability(String),
    ChooseLocation(String),
    ChooseService(String),
    /// Move the calendar by this many months.
    NavigateMonth(i32),
    ChooseDate(NaiveDate),
    ChooseTime { date: NaiveDate, slot_id: String },
    /// From the availability view: start booking the viewed injector here.
    BookInjectorAt { location: String },
    SubmitContact(ClientInfo),
    Restart,
    Contact(ContactContext),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChooseClientType(_) => "choose-client-type",
            Self::ChooseTreatment(_) => "choose-treatment",
            Self::ChooseBookingFlow(_) => "choose-booking-flow",
            Self::ChooseInjector(_) => "choose-injector",
            Self::ViewInjectorAvailability(_) => "view-injector-availability",
            Self::ChooseLocation(_) => "choose-location",
            Self::ChooseService(_) => "choose-service",
            Self::NavigateMonth(_) => "navigate-month",
            Self::ChooseDate(_) => "choose-date",
            Self::ChooseTime { .. } => "choose-time",
            Self::BookInjectorAt { .. } => "book-injector-at",
            Self::SubmitContact(_) => "submit-contact",
            Self::Restart => "restart",
            Self::Contact(_) => "contact",
        }
    }

    /// Whether this action may be taken while the flow is at `step`.
    pub fn allowed_at(&self, step: Step) -> bool {
        match self {
            Self::Restart | Self::Contact(_) => true,
            Self::ChooseClientType(_) => step == Step::ClientType,
            Self::ChooseTreatment(_) => step == Step::TreatmentType,
            Self::ChooseBookingFlow(_) => step == Step::BookingFlow,
            Self::ChooseInjector(_)
            | Self::ViewInjectorAvailability(_)
            | Self::ChooseLocation(_) => step == Step::ProviderLocation,
            Self::ChooseService(_) => step == Step::Services,
            Self::NavigateMonth(_)
            | Self::ChooseDate(_)
            | Self::ChooseTime { .. }
            | Self::BookInjectorAt { .. } => step == Step::Calendar,
            Self::SubmitContact(_) => step == Step::UserInfo,
        }
    }
}

/// How `provider-location` presents itself. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// Pick an injector to browse their availability across locations.
    AvailabilityView,
    /// Pick an injector (or first available) before a location.
    InjectorFirst,
    LocationPicker,
}

impl ProviderMode {
    pub fn of(
        treatment: Option<TreatmentType>,
        booking_flow: Option<BookingFlow>,
        injector: Option<&InjectorChoice>,
    ) -> Self {
        match (treatment, booking_flow, injector) {
            (Some(TreatmentType::InjectorAvailability), _, _) => Self::AvailabilityView,
            (Some(TreatmentType::Injectable), Some(BookingFlow::ByInjector), None) => {
                Self::InjectorFirst
            }
            _ => Self::LocationPicker,
        }
    }
}

/// Source of "today" for calendar decisions.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always reports the same date.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
