//! Terminal front end. Numbered options on stdout, answers from stdin.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Datelike;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{Choice, ContactMessage, Content, Role, Ui};
use crate::api::ClientInfo;
use crate::flow::Action;
use crate::flow::calendar::CalendarView;

/// Starts the conversation over from any step.
const RESTART_COMMAND: &str = "/restart";

/// Options currently on screen and whether the contact form is open.
#[derive(Debug, Default)]
struct Pending {
    options: Vec<Action>,
    /// Set once the client picks; the next batch of options replaces these.
    stale: bool,
    form: bool,
}

impl Pending {
    /// Register `choices`, returning the number of the first one.
    fn offer(&mut self, choices: &[Choice]) -> usize {
        if self.stale {
            self.options.clear();
            self.stale = false;
        }
        let first = self.options.len() + 1;
        self.options.extend(choices.iter().map(|c| c.action.clone()));
        first
    }

    fn pick(&mut self, number: usize) -> Option<Action> {
        let action = number
            .checked_sub(1)
            .and_then(|i| self.options.get(i))
            .cloned()?;
        self.stale = true;
        Some(action)
    }
}

/// A [`Ui`] for a terminal session.
pub struct CliUi {
    input: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
    pending: Mutex<Pending>,
}

impl CliUi {
    pub fn new() -> Self {
        Self {
            input: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            pending: Mutex::new(Pending::default()),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for the client's next decision. `None` on EOF or `/quit`.
    pub async fn next_action(&self) -> io::Result<Option<Action>> {
        loop {
            if self.pending().form {
                return self.read_contact_form().await;
            }

            let Some(line) = self.read_line("> ").await? else {
                return Ok(None);
            };
            if line == "/quit" {
                return Ok(None);
            }
            if line == RESTART_COMMAND {
                return Ok(Some(Action::Restart));
            }
            if line.is_empty() {
                continue;
            }

            match line.parse::<usize>() {
                Ok(n) => match self.pending().pick(n) {
                    Some(action) => return Ok(Some(action)),
                    None => println!("There is no option {n}."),
                },
                Err(_) => println!("Type the number of an option, /restart to start over or /quit to leave."),
            }
        }
    }

    async fn read_contact_form(&self) -> io::Result<Option<Action>> {
        let Some(first_name) = self.read_line("First Name: ").await? else {
            return Ok(None);
        };
        if first_name == "/quit" {
            return Ok(None);
        }
        if first_name == RESTART_COMMAND {
            self.pending().form = false;
            return Ok(Some(Action::Restart));
        }
        // A number picks one of the options shown alongside the form.
        if let Ok(n) = first_name.parse::<usize>() {
            if let Some(action) = self.pending().pick(n) {
                return Ok(Some(action));
            }
        }

        let mut fields = Vec::with_capacity(3);
        for label in ["Last Name: ", "Email Address: ", "Phone Number: "] {
            match self.read_line(label).await? {
                Some(value) if value != "/quit" => fields.push(value),
                _ => return Ok(None),
            }
        }
        let [last_name, email, phone_number]: [String; 3] = match fields.try_into() {
            Ok(fields) => fields,
            Err(_) => return Ok(None),
        };

        self.pending().form = false;
        Ok(Some(Action::SubmitContact(ClientInfo {
            first_name,
            last_name,
            email,
            phone_number,
        })))
    }

    async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut input = self.input.lock().await;
        Ok(input.next_line().await?.map(|l| l.trim().to_string()))
    }

    fn print_choices(&self, choices: &[Choice]) {
        let first = self.pending().offer(choices);
        for (i, choice) in choices.iter().enumerate() {
            match &choice.description {
                Some(d) => println!("  [{}] {} ({d})", first + i, choice.label),
                None => println!("  [{}] {}", first + i, choice.label),
            }
        }
    }
}

impl Default for CliUi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ui for CliUi {
    async fn add(&self, role: Role, content: Content) {
        match (role, content) {
            (Role::User, Content::Text(text)) => println!("  › {text}"),
            (_, Content::Text(text)) => println!("{text}"),
            (_, Content::Choices(choices)) => self.print_choices(&choices),
            (_, Content::Calendar(view)) => {
                print!("{}", render_calendar(&view));
                self.print_choices(&view.choices());
            }
            (_, Content::ContactForm) => {
                println!("Contact Information");
                self.pending().form = true;
            }
        }
    }

    async fn show_error(&self, message: &str) {
        println!("! {message}");
    }

    async fn show_success(&self, message: &str) {
        println!("\n{message}\n");
    }

    async fn open_contact(&self, message: &ContactMessage) {
        println!("Text us: {}", message.uri);
        println!("  \"{}\"", message.body);
    }
}

/// Sunday-first month grid. `*` marks days with open times.
fn render_calendar(view: &CalendarView) -> String {
    let mut out = format!("{:^28}\n", view.title());
    out.push_str("  Su  Mo  Tu  We  Th  Fr  Sa\n");

    let mut column = view.leading_blanks as usize;
    out.push_str(&"    ".repeat(column));
    for day in &view.days {
        let marker = if day.selectable && day.slot_count > 0 { '*' } else { ' ' };
        out.push_str(&format!("{:>3}{marker}", day.date.day()));
        column += 1;
        if column == 7 {
            out.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        out.push('\n');
    }

    for (location, color) in &view.legend {
        out.push_str(&format!("  {location} {color}\n"));
    }
    out
}
