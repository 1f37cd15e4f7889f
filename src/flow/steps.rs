//! Entry actions and choice handlers, one group per step.

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use super::calendar::{CalendarView, shift_month, slot_choices};
use super::catalog::services_for;
use super::outcome::{BookingFailure, success_message};
use super::router::Wizard;
use super::{Action, ProviderMode, Step, Transition};
use crate::api::ClientInfo;
use crate::availability::month_start;
use crate::error::{ApiError, FlowError, Result, ValidationError};
use crate::format;
use crate::session::{
    BookingFlow, ClientType, InjectorChoice, SelectedService, SelectedTime, Service, SessionPatch,
    TreatmentType,
};
use crate::ui::{Choice, ContactContext, Content, button_grid, compose};
use crate::validation;

type Next = Result<Option<Transition>>;

impl Wizard {
    // -- welcome / client-type / treatment-type / booking-flow ----------------

    pub(super) async fn enter_welcome(&mut self) -> Next {
        self.say("Hi! Welcome to Get Plump.").await;
        self.say("I'll help you book your appointment.").await;
        Ok(Some(Transition::to(Step::ClientType)))
    }

    pub(super) async fn enter_client_type(&mut self) -> Next {
        self.say("Are you a new client or have you visited us before?")
            .await;
        self.show(button_grid(ClientType::ALL.iter().map(|t| {
            Choice::new(t.label(), Action::ChooseClientType(*t)).with_description(t.description())
        })))
        .await;
        Ok(None)
    }

    pub(super) async fn choose_client_type(&mut self, client_type: ClientType) -> Next {
        self.echo(client_type.label()).await;
        Ok(Some(Transition::new(
            Step::TreatmentType,
            SessionPatch {
                client_type: Some(client_type),
                ..Default::default()
            },
        )))
    }

    pub(super) async fn enter_treatment_type(&mut self) -> Next {
        let greeting = self.session.client_type.map_or("Great!", |c| c.greeting());
        self.say(format!(
            "{greeting} What type of treatment are you interested in?"
        ))
        .await;
        self.show(button_grid(TreatmentType::ALL.iter().map(|t| {
            Choice::new(t.label(), Action::ChooseTreatment(*t)).with_description(t.description())
        })))
        .await;
        Ok(None)
    }

    pub(super) async fn choose_treatment(&mut self, treatment: TreatmentType) -> Next {
        self.echo(treatment.label()).await;
        let (message, step) = match treatment {
            TreatmentType::Injectable => (
                "Great! For injectable treatments, would you like to book with a specific injector or choose a location first?",
                Step::BookingFlow,
            ),
            TreatmentType::Skin => (
                "Perfect! Please select your preferred location:",
                Step::ProviderLocation,
            ),
            TreatmentType::InjectorAvailability => (
                "Perfect! Let me load our team of injectors and their availability...",
                Step::ProviderLocation,
            ),
        };
        self.say(message).await;
        Ok(Some(Transition::new(
            step,
            SessionPatch {
                treatment_type: Some(treatment),
                ..Default::default()
            },
        )))
    }

    pub(super) async fn enter_booking_flow(&mut self) -> Next {
        if self.session.treatment_type != Some(TreatmentType::Injectable) {
            warn!(
                treatment = ?self.session.treatment_type,
                "Booking flow entered for a non-injectable treatment; redirecting"
            );
            return Ok(Some(Transition::to(Step::ProviderLocation)));
        }

        self.show(button_grid(BookingFlow::ALL.iter().map(|f| {
            Choice::new(f.label(), Action::ChooseBookingFlow(*f)).with_description(f.description())
        })))
        .await;
        Ok(None)
    }

    pub(super) async fn choose_booking_flow(&mut self, flow: BookingFlow) -> Next {
        self.echo(flow.label()).await;
        self.say(match flow {
            BookingFlow::ByInjector => "Let me show you our available injectors...",
            BookingFlow::ByLocation => "Please select your preferred location:",
        })
        .await;
        Ok(Some(Transition::new(
            Step::ProviderLocation,
            SessionPatch {
                booking_flow: Some(flow),
                ..Default::default()
            },
        )))
    }

    // -- provider-location ----------------------------------------------------

    pub(super) async fn enter_provider_location(&mut self) -> Next {
        let mode = ProviderMode::of(
            self.session.treatment_type,
            self.session.booking_flow,
            self.session.selected_injector.as_ref(),
        );
        debug!(?mode, "Provider step mode");

        match mode {
            ProviderMode::AvailabilityView => self.offer_injectors_for_availability().await,
            ProviderMode::InjectorFirst => self.offer_injectors_for_booking().await,
            ProviderMode::LocationPicker => self.offer_locations().await,
        }
        Ok(None)
    }

    async fn offer_injectors_for_availability(&mut self) {
        self.say("Loading our team of injectors...").await;
        let roster = self.aggregator.load_all_staff().await;
        let colors = self.aggregator.location_colors(&roster);
        self.session = self.session.apply(SessionPatch {
            available_staff: Some(roster),
            location_colors: Some(colors),
            ..Default::default()
        });

        if self.session.available_staff.is_empty() {
            self.ui
                .show_error("Unable to load our injectors right now. Please try again or contact us.")
                .await;
            self.show(button_grid([
                Choice::new("Start Over", Action::Restart),
                Choice::contact("Contact us for assistance", ContactContext::InjectorInquiry),
            ]))
            .await;
            return;
        }

        let options: Vec<Choice> = self
            .session
            .available_staff
            .iter()
            .map(|s| {
                Choice::new(s.full_name(), Action::ViewInjectorAvailability(s.id.clone()))
                    .with_description(s.locations.join(", "))
            })
            .collect();
        self.say("Select an injector to view their availability across all locations:")
            .await;
        self.show(button_grid(options)).await;
    }

    async fn offer_injectors_for_booking(&mut self) {
        self.say("Loading our team of injectors...").await;
        let roster = self.aggregator.load_all_staff().await;
        if roster.is_empty() {
            warn!("No injectors loaded; offering first available only");
        }
        self.session = self.session.apply(SessionPatch {
            available_staff: Some(roster),
            ..Default::default()
        });

        let mut options = vec![
            Choice::new("First Available", Action::ChooseInjector(InjectorChoice::FirstAvailable))
                .with_description("Book with the next available injector"),
        ];
        options.extend(self.session.available_staff.iter().map(|s| {
            Choice::new(s.full_name(), Action::ChooseInjector(s.as_choice()))
                .with_description(s.locations.join(", "))
        }));
        options.push(Choice::contact(
            "Don't see your preferred injector? Contact us",
            ContactContext::InjectorInquiry,
        ));
        self.show(button_grid(options)).await;
    }

    async fn offer_locations(&mut self) {
        // A specific injector limits the choice to where they work.
        let names = match self
            .session
            .selected_staff_id()
            .and_then(|id| self.session.staff_member(id))
        {
            Some(member) if !member.locations.is_empty() => member.locations.clone(),
            _ => self.config.locations.names(),
        };
        self.show(button_grid(
            names
                .into_iter()
                .map(|name| Choice::new(name.clone(), Action::ChooseLocation(name))),
        ))
        .await;
    }

    pub(super) async fn choose_injector(&mut self, choice: InjectorChoice) -> Next {
        if let Some(id) = choice.staff_id() {
            if self.session.staff_member(id).is_none() {
                return Err(FlowError::UnknownStaff(id.to_string()).into());
            }
        }

        self.echo(choice.name()).await;
        self.say("Perfect! Now please select your preferred location:")
            .await;
        Ok(Some(Transition::new(
            Step::ProviderLocation,
            SessionPatch {
                selected_injector: Some(choice),
                ..Default::default()
            },
        )))
    }

    pub(super) async fn view_injector_availability(&mut self, staff_id: String) -> Next {
        let member = self
            .session
            .staff_member(&staff_id)
            .cloned()
            .ok_or(FlowError::UnknownStaff(staff_id))?;

        self.echo(member.full_name()).await;
        Ok(Some(Transition::new(
            Step::Calendar,
            SessionPatch {
                selected_injector: Some(member.as_choice()),
                injector_locations: Some(member.locations),
                ..Default::default()
            },
        )))
    }

    pub(super) async fn choose_location(&mut self, name: String) -> Next {
        let location = self
            .config
            .locations
            .resolve(&name)
            .ok_or(FlowError::UnknownLocation(name))?;

        self.echo(location.name()).await;
        self.say(format!(
            "Perfect! Creating your booking session for {}...",
            location.name()
        ))
        .await;
        Ok(Some(Transition::new(
            Step::Services,
            SessionPatch {
                selected_location: Some(location),
                ..Default::default()
            },
        )))
    }

    // -- services -------------------------------------------------------------

    pub(super) async fn enter_services(&mut self) -> Next {
        let Some(location) = self.session.selected_location.clone() else {
            return Err(FlowError::MissingSelection {
                step: Step::Services.to_string(),
                field: "location",
            }
            .into());
        };

        let cart = match self.api.create_cart(location.id()).await {
            Ok(cart) => cart,
            Err(e) => {
                warn!(location = %location.name(), error = %e, "Cart creation failed");
                self.ui
                    .show_error("Unable to create booking session. Please try again or contact us.")
                    .await;
                self.show(button_grid([Choice::contact(
                    "Contact us for assistance",
                    ContactContext::ServiceInquiry,
                )]))
                .await;
                return Ok(None);
            }
        };
        info!(location = %location.name(), cart_id = %cart.id, "Cart created");

        let services = services_for(
            &cart,
            self.session.treatment_type,
            self.session.selected_staff_id(),
            self.config.max_services_shown,
        );
        self.session = self.session.apply(SessionPatch {
            cart_id: Some(cart.id),
            available_services: Some(services),
            ..Default::default()
        });

        if self.session.available_services.is_empty() {
            self.say("No services found for your selection.").await;
            self.show(button_grid([Choice::contact(
                "Contact us for assistance",
                ContactContext::ServiceInquiry,
            )]))
            .await;
            return Ok(None);
        }

        let treatment = match self.session.treatment_type {
            Some(TreatmentType::Injectable) => "injectable treatments",
            _ => "skin treatments",
        };
        self.say(format!(
            "Here are the available {treatment} at {}:",
            location.name()
        ))
        .await;

        let mut options: Vec<Choice> = self
            .session
            .available_services
            .iter()
            .map(|s| {
                Choice::new(s.name.clone(), Action::ChooseService(s.id.clone()))
                    .with_description(service_summary(s))
            })
            .collect();
        options.push(Choice::contact(
            "Don't see what you're looking for? Contact us",
            ContactContext::ServiceInquiry,
        ));
        self.show(button_grid(options)).await;
        Ok(None)
    }

    pub(super) async fn choose_service(&mut self, service_id: String) -> Next {
        let cart_id = self.require_cart(Step::Services)?;
        let service = self
            .session
            .available_services
            .iter()
            .find(|s| s.id == service_id)
            .cloned()
            .ok_or(FlowError::UnknownService(service_id))?;
        let variant_id = self
            .session
            .selected_staff_id()
            .and_then(|staff| service.variant_for(staff))
            .map(|v| v.id.clone());

        self.echo(service.name.clone()).await;

        if let Err(e) = self
            .api
            .add_service(&cart_id, &service.id, variant_id.as_deref())
            .await
        {
            warn!(cart_id = %cart_id, service = %service.name, error = %e, "Could not add service");
            self.ui
                .show_error("Unable to add service. Please try again or contact us.")
                .await;
            return Ok(None);
        }
        info!(cart_id = %cart_id, service = %service.name, variant = ?variant_id, "Service added");

        self.say(format!(
            "Great! I've added {} to your booking. Now let me find available appointment times...",
            service.name
        ))
        .await;
        Ok(Some(Transition::new(
            Step::Calendar,
            SessionPatch {
                selected_service: Some(SelectedService {
                    id: service.id,
                    name: service.name,
                }),
                ..Default::default()
            },
        )))
    }

    // -- calendar -------------------------------------------------------------

    pub(super) async fn enter_calendar(&mut self) -> Next {
        let month = self
            .session
            .calendar_month
            .unwrap_or_else(|| month_start(self.today()));
        self.session = self.session.apply(SessionPatch {
            calendar_month: Some(month),
            ..Default::default()
        });

        if self.availability_view() {
            let name = self
                .session
                .selected_injector
                .as_ref()
                .map(|i| i.name().to_string())
                .unwrap_or_default();
            self.say(format!(
                "Perfect! Loading {name}'s availability across all locations..."
            ))
            .await;
        } else {
            self.require_cart(Step::Calendar)?;
            self.say("Here are the available appointment times:").await;
        }

        self.load_month(month).await?;
        self.show_calendar().await;
        Ok(None)
    }

    pub(super) async fn navigate_month(&mut self, delta: i32) -> Next {
        let current_month = month_start(self.today());
        let shown = self.session.calendar_month.unwrap_or(current_month);
        // Never earlier than the current month.
        let month = shift_month(shown, delta).max(current_month);

        self.session = self.session.apply(SessionPatch {
            calendar_month: Some(month),
            ..Default::default()
        });
        self.load_month(month).await?;
        self.show_calendar().await;
        Ok(None)
    }

    pub(super) async fn choose_date(&mut self, date: NaiveDate) -> Next {
        self.session = self.session.apply(SessionPatch {
            selected_date: Some(date),
            ..Default::default()
        });
        self.echo(format::calendar_date(date)).await;

        let slots = self
            .session
            .calendar_availability
            .get(&date)
            .cloned()
            .unwrap_or_default();
        if slots.is_empty() || date < self.today() {
            self.say("No available times for this date").await;
        } else {
            let choices = slot_choices(date, &slots, self.availability_view());
            self.show(button_grid(choices)).await;
        }
        self.offer_calendar_choices().await;
        Ok(None)
    }

    pub(super) async fn choose_time(&mut self, date: NaiveDate, slot_id: String) -> Next {
        let cart_id = self.require_cart(Step::Calendar)?;
        let slot = self
            .session
            .calendar_availability
            .get(&date)
            .and_then(|slots| slots.iter().find(|s| s.id == slot_id))
            .cloned()
            .ok_or_else(|| FlowError::UnknownSlot {
                date: format::api_date(date),
                slot_id: slot_id.clone(),
            })?;

        let selected = SelectedTime {
            id: slot.id.clone(),
            time: format::time(&slot.start_time),
            date: format::calendar_date(date),
            start_time: slot.start_time,
        };
        self.echo(format!("{} at {}", selected.date, selected.time))
            .await;
        self.say(format!(
            "Perfect! I've noted your preferred time: {} at {}. Let me reserve this time slot...",
            selected.date, selected.time
        ))
        .await;

        if let Err(e) = self.api.reserve_slot(&cart_id, &slot.id).await {
            warn!(cart_id = %cart_id, slot_id = %slot.id, error = %e, "Slot reservation failed");
            if slot_taken(&e) {
                self.say("I'm sorry, that time slot is no longer available. Please choose a different time.")
                    .await;
                self.ui.show_error(&e.user_message()).await;
            } else {
                self.ui
                    .show_error(&format!("{} You can pick the time again.", e.user_message()))
                    .await;
            }
            self.offer_calendar_choices().await;
            return Ok(None);
        }
        info!(cart_id = %cart_id, slot_id = %slot.id, "Slot reserved");

        self.say("Great! I've reserved your time slot. Now I need your contact information to complete your booking...")
            .await;
        Ok(Some(Transition::new(
            Step::UserInfo,
            SessionPatch {
                selected_time: Some(selected),
                selected_date: Some(date),
                ..Default::default()
            },
        )))
    }

    pub(super) async fn book_injector_at(&mut self, location_name: String) -> Next {
        let location = self
            .config
            .locations
            .resolve(&location_name)
            .ok_or(FlowError::UnknownLocation(location_name))?;
        let injector = self
            .session
            .selected_injector
            .clone()
            .filter(|i| i.staff_id().is_some())
            .ok_or_else(|| FlowError::MissingSelection {
                step: Step::Calendar.to_string(),
                field: "injector",
            })?;

        self.echo(format!("{} at {}", injector.name(), location.name()))
            .await;
        self.say(format!(
            "Perfect! Creating your booking session for {}...",
            location.name()
        ))
        .await;
        Ok(Some(Transition::new(
            Step::Services,
            SessionPatch {
                treatment_type: Some(TreatmentType::Injectable),
                booking_flow: Some(BookingFlow::ByInjector),
                selected_location: Some(location),
                ..Default::default()
            },
        )))
    }

    fn availability_view(&self) -> bool {
        ProviderMode::of(
            self.session.treatment_type,
            self.session.booking_flow,
            self.session.selected_injector.as_ref(),
        ) == ProviderMode::AvailabilityView
    }

    /// Fetch the month for the current mode and merge it into the session.
    async fn load_month(&mut self, month: NaiveDate) -> Result<()> {
        let today = self.today();
        let flow_id = self.session.flow_id();

        let entries = if self.availability_view() {
            let staff_id = self
                .session
                .selected_staff_id()
                .ok_or_else(|| FlowError::MissingSelection {
                    step: Step::Calendar.to_string(),
                    field: "injector",
                })?;
            self.aggregator
                .load_injector_availability(staff_id, &self.session.injector_locations, month, today)
                .await
        } else {
            let cart_id = self.require_cart(Step::Calendar)?;
            self.aggregator
                .load_month(&cart_id, month, today, self.session.selected_staff_id())
                .await
        };

        match self.session.merge_availability(flow_id, entries) {
            Some(session) => self.session = session,
            None => debug!(%flow_id, "Discarding availability from a replaced flow"),
        }
        Ok(())
    }

    async fn show_calendar(&self) {
        let view = self.calendar_view();
        debug!(month = %view.title(), slots = view.total_slots(), "Rendering calendar");
        self.show(Content::Calendar(view)).await;
        self.show(button_grid([Choice::contact(
            "Don't see a good time? Contact us",
            ContactContext::TimeInquiry,
        )]))
        .await;
    }

    /// Month navigation, open dates and the contact link, without the grid.
    async fn offer_calendar_choices(&self) {
        let mut options = self.calendar_view().choices();
        options.push(Choice::contact(
            "Don't see a good time? Contact us",
            ContactContext::TimeInquiry,
        ));
        self.show(button_grid(options)).await;
    }

    fn calendar_view(&self) -> CalendarView {
        let today = self.today();
        let month = self
            .session
            .calendar_month
            .unwrap_or_else(|| month_start(today));
        let legend = if self.availability_view() {
            self.session
                .injector_locations
                .iter()
                .map(|l| {
                    let color = self.session.location_colors.get(l).cloned().unwrap_or_default();
                    (l.clone(), color)
                })
                .collect()
        } else {
            Vec::new()
        };

        CalendarView::build(month, today, &self.session.calendar_availability, legend)
    }

    // -- user-info ------------------------------------------------------------

    pub(super) async fn enter_user_info(&mut self) -> Next {
        self.show(Content::ContactForm).await;
        Ok(None)
    }

    pub(super) async fn submit_contact(&mut self, form: ClientInfo) -> Next {
        let cart_id = self.require_cart(Step::UserInfo)?;

        let client = match validation::client_info(&form) {
            Ok(client) => client,
            Err(errors) => {
                debug!(failed = errors.len(), "Contact form rejected");
                for e in &errors {
                    self.ui.show_error(&field_error(e)).await;
                }
                self.show(Content::ContactForm).await;
                return Ok(None);
            }
        };

        self.echo(format!(
            "{} - {} - {}",
            client.full_name(),
            client.email,
            format::phone(&client.phone_number)
        ))
        .await;

        if let Err(e) = self.api.update_client_info(&cart_id, &client).await {
            warn!(cart_id = %cart_id, error = %e, "Saving client info failed");
            self.ui
                .show_error("Unable to save your information. Please try again or contact us.")
                .await;
            self.show(Content::ContactForm).await;
            self.show(button_grid([Choice::contact(
                "Contact Us for Help",
                ContactContext::Help,
            )]))
            .await;
            return Ok(None);
        }
        info!(cart_id = %cart_id, "Client info saved");

        Ok(Some(Transition::new(
            Step::Confirmation,
            SessionPatch {
                client_info: Some(client),
                ..Default::default()
            },
        )))
    }

    // -- confirmation ---------------------------------------------------------

    /// Finalizes the booking. Arriving here is the commit point.
    pub(super) async fn enter_confirmation(&mut self) -> Next {
        let cart_id = self.require_cart(Step::Confirmation)?;

        match self.api.complete_booking(&cart_id).await {
            Ok(confirmation) => {
                info!(
                    cart_id = %cart_id,
                    booking_id = ?confirmation.booking_id,
                    "Booking completed"
                );
                self.ui
                    .show_success(&success_message(&self.session, &confirmation))
                    .await;
                self.show(button_grid([
                    Choice::new("Book Another Appointment", Action::Restart),
                    Choice::contact("Questions? Contact Us", ContactContext::FollowUp),
                ]))
                .await;
            }
            Err(e) => {
                let failure = BookingFailure::classify(&e);
                error!(cart_id = %cart_id, error = %e, ?failure, "Booking completion failed");
                self.ui.show_error(failure.message()).await;
                self.show(button_grid([
                    Choice::new("Try Again", Action::Restart),
                    Choice::contact("Contact Us for Help", ContactContext::Help),
                ]))
                .await;
            }
        }
        Ok(None)
    }

    // -- any step -------------------------------------------------------------

    pub(super) async fn contact(&self, context: ContactContext) {
        let message = compose(
            context,
            self.session.selected_location.as_ref().map(|l| l.name()),
            self.session.selected_service.as_ref().map(|s| s.name.as_str()),
            &self.config.contact_number,
        );
        info!(context = context.tag(), "Opening contact fallback");
        self.ui.open_contact(&message).await;
    }
}

/// e.g. `45 minutes · $95`
fn service_summary(service: &Service) -> String {
    [format::duration(service.duration), format::price(service.price)]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Whether a reservation failed because someone else got the slot first.
fn slot_taken(err: &ApiError) -> bool {
    match err {
        ApiError::StaleAvailability(_) => true,
        ApiError::Api { message, .. } => message.to_lowercase().contains("available"),
        ApiError::Network(_) | ApiError::Timeout(_) | ApiError::InvalidResponse(_) => false,
    }
}

fn field_error(err: &ValidationError) -> String {
    let label = match err.field() {
        "firstName" => "First Name",
        "lastName" => "Last Name",
        "email" => "Email",
        "phone" => "Phone",
        other => other,
    };
    format!("{label}: {err}")
}
