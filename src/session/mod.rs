//! Booking session, the single value a flow accumulates into.

pub mod model;
pub mod state;

pub use model::{
    BookingFlow, CalendarAvailability, CalendarSlot, ClientType, FIRST_AVAILABLE_ID,
    InjectorChoice, SelectedService, SelectedTime, Service, StaffMember, TreatmentType,
};
pub use state::{Session, SessionPatch};
