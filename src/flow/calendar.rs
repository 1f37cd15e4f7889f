//! Month view of slot availability.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::availability::{month_days, month_start};
use crate::format;
use crate::session::{CalendarAvailability, CalendarSlot};
use crate::ui::Choice;

use super::Action;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub slot_count: usize,
    /// Past days are never selectable.
    pub selectable: bool,
}

/// One rendered month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub month: NaiveDate,
    /// Empty cells before the 1st in a Sunday-first grid.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
    /// False while showing the current month.
    pub can_go_back: bool,
    /// `(location, colour)` pairs, only in the cross-location view.
    pub legend: Vec<(String, String)>,
}

impl CalendarView {
    pub fn build(
        month: NaiveDate,
        today: NaiveDate,
        availability: &CalendarAvailability,
        legend: Vec<(String, String)>,
    ) -> Self {
        let month = month_start(month);
        let days = month_days(month)
            .into_iter()
            .map(|date| CalendarDay {
                date,
                slot_count: availability.get(&date).map_or(0, Vec::len),
                selectable: date >= today,
            })
            .collect();

        Self {
            month,
            leading_blanks: month.weekday().num_days_from_sunday(),
            days,
            can_go_back: month > month_start(today),
            legend,
        }
    }

    pub fn title(&self) -> String {
        format::month_title(self.month)
    }

    /// Navigation plus every selectable day that has openings.
    pub fn choices(&self) -> Vec<Choice> {
        let mut choices = Vec::new();
        if self.can_go_back {
            choices.push(Choice::new("← Previous", Action::NavigateMonth(-1)));
        }
        choices.push(Choice::new("Next →", Action::NavigateMonth(1)));

        for day in self.days.iter().filter(|d| d.selectable && d.slot_count > 0) {
            let count = match day.slot_count {
                1 => "1 slot".to_string(),
                n => format!("{n} slots"),
            };
            choices.push(
                Choice::new(format::calendar_date(day.date), Action::ChooseDate(day.date))
                    .with_description(count),
            );
        }
        choices
    }

    pub fn total_slots(&self) -> usize {
        self.days.iter().map(|d| d.slot_count).sum()
    }
}

/// One choice per slot. Location-tagged slots in the cross-location view
/// start a booking at that location instead of reserving directly.
pub fn slot_choices(date: NaiveDate, slots: &[CalendarSlot], availability_view: bool) -> Vec<Choice> {
    slots
        .iter()
        .map(|slot| {
            let label = format::time(&slot.start_time);
            match &slot.location {
                Some(location) if availability_view => Choice::new(
                    label,
                    Action::BookInjectorAt {
                        location: location.clone(),
                    },
                )
                .with_description(location.clone()),
                _ => Choice::new(
                    label,
                    Action::ChooseTime {
                        date,
                        slot_id: slot.id.clone(),
                    },
                ),
            }
        })
        .collect()
}

/// First day of the month `delta` months away from `month`.
pub fn shift_month(month: NaiveDate, delta: i32) -> NaiveDate {
    let month = month_start(month);
    let shifted = if delta >= 0 {
        month.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        month.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn slot(id: &str, at: &str, location: Option<&str>) -> CalendarSlot {
        CalendarSlot {
            id: id.into(),
            start_time: DateTime::parse_from_rfc3339(at).unwrap(),
            location: location.map(str::to_string),
        }
    }

    #[test]
    fn builds_month_grid() {
        let mut availability = CalendarAvailability::new();
        availability.insert(
            date(3, 10),
            vec![
                slot("a", "2025-03-10T10:00:00-04:00", None),
                slot("b", "2025-03-10T11:00:00-04:00", None),
            ],
        );
        availability.insert(date(3, 2), vec![slot("old", "2025-03-02T10:00:00-05:00", None)]);

        let view = CalendarView::build(date(3, 15), date(3, 5), &availability, Vec::new());

        assert_eq!(view.month, date(3, 1));
        assert_eq!(view.title(), "March 2025");
        // 2025-03-01 is a Saturday.
        assert_eq!(view.leading_blanks, 6);
        assert_eq!(view.days.len(), 31);
        assert!(!view.days[3].selectable);
        assert!(view.days[4].selectable);
        assert_eq!(view.days[9].slot_count, 2);
        assert!(!view.can_go_back);

        let choices = view.choices();
        assert_eq!(choices[0].action, Action::NavigateMonth(1));
        // Past days with slots are not offered.
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[1].label, "Mon, Mar 10");
        assert_eq!(choices[1].description.as_deref(), Some("2 slots"));
    }

    #[test]
    fn later_months_can_go_back() {
        let view = CalendarView::build(date(4, 1), date(3, 5), &CalendarAvailability::new(), Vec::new());
        assert!(view.can_go_back);
        assert_eq!(view.choices()[0].action, Action::NavigateMonth(-1));
        assert_eq!(view.total_slots(), 0);
    }

    #[test]
    fn slot_choices_route_by_mode() {
        let slots = vec![slot("a", "2025-03-10T10:00:00-04:00", Some("SoHo"))];

        let regular = slot_choices(date(3, 10), &slots, false);
        assert_eq!(regular[0].label, "10:00 AM");
        assert_eq!(
            regular[0].action,
            Action::ChooseTime {
                date: date(3, 10),
                slot_id: "a".into()
            }
        );

        let viewing = slot_choices(date(3, 10), &slots, true);
        assert_eq!(
            viewing[0].action,
            Action::BookInjectorAt {
                location: "SoHo".into()
            }
        );
        assert_eq!(viewing[0].description.as_deref(), Some("SoHo"));
    }

    #[test]
    fn month_shifting() {
        assert_eq!(shift_month(date(1, 31), 1), date(2, 1));
        assert_eq!(shift_month(date(1, 15), -1), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(shift_month(date(3, 9), 0), date(3, 1));
    }
}
