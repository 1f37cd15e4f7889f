//! Out-of-band contact: a pre-filled SMS to the front desk.

use serde::{Deserialize, Serialize};

/// Why the client wants to reach a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactContext {
    FollowUp,
    InjectorInquiry,
    ServiceInquiry,
    TimeInquiry,
    Help,
    General,
}

impl ContactContext {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FollowUp => "follow-up",
            Self::InjectorInquiry => "injector-inquiry",
            Self::ServiceInquiry => "service-inquiry",
            Self::TimeInquiry => "time-inquiry",
            Self::Help => "help",
            Self::General => "general",
        }
    }
}

/// A composed outbound message and the URI that opens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub context: ContactContext,
    pub body: String,
    /// `sms:<number>?body=<percent-encoded body>`
    pub uri: String,
}

/// Build the message for `context`, interpolating the current selections.
pub fn compose(
    context: ContactContext,
    location: Option<&str>,
    service: Option<&str>,
    number: &str,
) -> ContactMessage {
    let location = location.unwrap_or("Get Plump");
    let mut body = match context {
        ContactContext::FollowUp => "I just completed a booking and have a question".to_string(),
        ContactContext::InjectorInquiry => {
            "I'm looking for a specific injector that wasn't listed".to_string()
        }
        ContactContext::ServiceInquiry => {
            format!("I'm looking for services at {location} but need different options")
        }
        ContactContext::TimeInquiry => format!(
            "I'm looking for {} at {location} but need different time options",
            service.unwrap_or("a treatment")
        ),
        ContactContext::Help => "I need help with booking".to_string(),
        ContactContext::General => "I'd like to book an appointment at Get Plump".to_string(),
    };
    body.push('.');

    let uri = format!("sms:{number}?body={}", encode_component(&body));
    ContactMessage { context, body, uri }
}

/// Percent-encode everything outside the URI-component unreserved set.
fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
