//! Display formatting for dates, times, prices and phone numbers.

use chrono::{DateTime, FixedOffset, NaiveDate};

/// `YYYY-MM-DD`, as the backend expects.
pub fn api_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Short calendar label, e.g. `Mon, Mar 10`.
pub fn calendar_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

/// Slot start time in the slot's own offset, e.g. `10:00 AM`.
pub fn time(start: &DateTime<FixedOffset>) -> String {
    start.format("%-I:%M %p").to_string()
}

/// Month header, e.g. `March 2025`.
pub fn month_title(month: NaiveDate) -> String {
    month.format("%B %Y").to_string()
}

/// Whole dollars from cents; missing or zero prices are quoted on request.
pub fn price(cents: Option<i64>) -> String {
    match cents {
        Some(c) if c != 0 => format!("${}", (c as f64 / 100.0).round() as i64),
        _ => "Contact for pricing".to_string(),
    }
}

pub fn duration(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{m} minutes"),
        _ => String::new(),
    }
}

/// `(212) 555-0100` for ten-digit numbers; anything else is returned as typed.
pub fn phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        raw.to_string()
    }
}
