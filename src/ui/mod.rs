//! The conversation surface the wizard writes to.
//!
//! The wizard never renders anything itself. It hands [`Content`] to a
//! [`Ui`] implementation and learns about client choices through the
//! [`Action`]s carried by the [`Choice`]s it offered.

pub mod cli;
pub mod contact;

pub use cli::CliUi;
pub use contact::{ContactContext, ContactMessage, compose};

use async_trait::async_trait;

use crate::flow::Action;
use crate::flow::calendar::CalendarView;

/// Who a message is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// A selectable option.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub description: Option<String>,
    pub action: Action,
}

impl Choice {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            description: None,
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A contact-us link for `context`.
    pub fn contact(label: impl Into<String>, context: ContactContext) -> Self {
        Self::new(label, Action::Contact(context))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    /// A grid of buttons.
    Choices(Vec<Choice>),
    Calendar(CalendarView),
    /// Request for first name, last name, email and phone.
    ContactForm,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Build a button grid from options.
pub fn button_grid(options: impl IntoIterator<Item = Choice>) -> Content {
    Content::Choices(options.into_iter().collect())
}

/// Rendering collaborator.
///
/// `add` resolves once the message is delivered, so awaiting it in sequence
/// keeps messages in order.
#[async_trait]
pub trait Ui: Send + Sync {
    async fn add(&self, role: Role, content: Content);

    async fn show_error(&self, message: &str);

    async fn show_success(&self, message: &str);

    /// Hand the composed message to whatever sends it.
    async fn open_contact(&self, message: &ContactMessage);
}
