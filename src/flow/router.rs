//! The booking wizard: owns the session and routes every transition.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::{Action, Clock, Step, SystemClock, Transition};
use crate::api::BookingApi;
use crate::availability::AvailabilityAggregator;
use crate::config::WizardConfig;
use crate::error::{FlowError, Result};
use crate::session::{Session, SessionPatch};
use crate::ui::{Content, Role, Ui};

/// Drives one client through the booking steps.
///
/// Handlers never call each other. Entry actions and choice handlers hand
/// back an optional [`Transition`] and the router performs it, so every
/// move between steps passes through [`Wizard::go_to_step`].
pub struct Wizard {
    pub(super) session: Session,
    pub(super) api: Arc<dyn BookingApi>,
    pub(super) ui: Arc<dyn Ui>,
    pub(super) config: WizardConfig,
    pub(super) aggregator: AvailabilityAggregator,
    clock: Arc<dyn Clock>,
}

impl Wizard {
    pub fn new(api: Arc<dyn BookingApi>, ui: Arc<dyn Ui>, config: WizardConfig) -> Self {
        let aggregator = AvailabilityAggregator::new(
            api.clone(),
            config.locations.clone(),
            config.location_palette.clone(),
        );
        Self {
            session: Session::new(),
            api,
            ui,
            config,
            aggregator,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Replace the session with a fresh one and begin at `welcome`.
    pub async fn start(&mut self) -> Result<()> {
        let previous = self.session.flow_id();
        self.session = Session::new();
        info!(
            flow_id = %self.session.flow_id(),
            previous = %previous,
            "Starting booking flow"
        );
        self.go_to_step(Step::Welcome, SessionPatch::none()).await
    }

    /// Merge `patch`, move to `step` and run its entry action, following
    /// any transitions the entry actions hand back.
    ///
    /// If an entry action fails, the session is restored to what it was
    /// before this call.
    pub async fn go_to_step(&mut self, step: Step, patch: SessionPatch) -> Result<()> {
        let before = self.session.clone();
        let mut next = Some(Transition::new(step, patch));

        while let Some(Transition { step, patch }) = next.take() {
            let from = self.session.current_step;
            self.session = self.session.transition(step, patch);
            info!(
                from = %from,
                to = %step,
                flow_id = %self.session.flow_id(),
                "Step transition"
            );
            next = match self.enter(step).await {
                Ok(next) => next,
                Err(e) => {
                    warn!(
                        step = %step,
                        restored = %before.current_step,
                        error = %e,
                        "Entry action failed; restoring session"
                    );
                    self.session = before;
                    return Err(e);
                }
            };
        }

        Ok(())
    }

    /// Handle a choice the client made at the current step.
    pub async fn select(&mut self, action: Action) -> Result<()> {
        let step = self.session.current_step;
        if !action.allowed_at(step) {
            warn!(action = action.name(), step = %step, "Action not valid at current step");
            return Err(FlowError::ActionNotAllowed {
                action: action.name().to_string(),
                step: step.to_string(),
            }
            .into());
        }
        debug!(action = action.name(), step = %step, "Handling action");

        let next = match action {
            Action::Restart => return self.start().await,
            Action::Contact(context) => {
                self.contact(context).await;
                None
            }
            Action::ChooseClientType(t) => self.choose_client_type(t).await?,
            Action::ChooseTreatment(t) => self.choose_treatment(t).await?,
            Action::ChooseBookingFlow(f) => self.choose_booking_flow(f).await?,
            Action::ChooseInjector(choice) => self.choose_injector(choice).await?,
            Action::ViewInjectorAvailability(id) => self.view_injector_availability(id).await?,
            Action::ChooseLocation(name) => self.choose_location(name).await?,
            Action::ChooseService(id) => self.choose_service(id).await?,
            Action::NavigateMonth(delta) => self.navigate_month(delta).await?,
            Action::ChooseDate(date) => self.choose_date(date).await?,
            Action::ChooseTime { date, slot_id } => self.choose_time(date, slot_id).await?,
            Action::BookInjectorAt { location } => self.book_injector_at(location).await?,
            Action::SubmitContact(info) => self.submit_contact(info).await?,
        };

        if let Some(Transition { step, patch }) = next {
            self.go_to_step(step, patch).await?;
        }
        Ok(())
    }

    async fn enter(&mut self, step: Step) -> Result<Option<Transition>> {
        match step {
            Step::Welcome => self.enter_welcome().await,
            Step::ClientType => self.enter_client_type().await,
            Step::TreatmentType => self.enter_treatment_type().await,
            Step::BookingFlow => self.enter_booking_flow().await,
            Step::ProviderLocation => self.enter_provider_location().await,
            Step::Services => self.enter_services().await,
            Step::Calendar => self.enter_calendar().await,
            Step::UserInfo => self.enter_user_info().await,
            Step::Confirmation => self.enter_confirmation().await,
        }
    }

    pub(super) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(super) fn require_cart(&self, step: Step) -> std::result::Result<String, FlowError> {
        self.session
            .cart_id
            .clone()
            .ok_or_else(|| FlowError::MissingCart {
                step: step.to_string(),
            })
    }

    pub(super) async fn say(&self, text: impl Into<String>) {
        self.ui.add(Role::System, Content::text(text)).await;
    }

    /// Echo the client's choice into the transcript.
    pub(super) async fn echo(&self, text: impl Into<String>) {
        self.ui.add(Role::User, Content::text(text)).await;
    }

    pub(super) async fn show(&self, content: Content) {
        self.ui.add(Role::System, content).await;
    }
}
