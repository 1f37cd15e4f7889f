//! Availability aggregation across locations and dates.
//!
//! Every fan-out here issues its requests concurrently and waits for the
//! whole batch. A failing source is logged and degrades to "nothing from
//! this source"; the batch itself never fails. Callers decide what an empty
//! result means for the conversation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::{BookingApi, Cart, TimeSlot};
use crate::config::{Location, LocationDirectory};
use crate::session::{CalendarAvailability, CalendarSlot, StaffMember};

/// Result of opening a cart at one location; `cart` is `None` if that failed.
#[derive(Debug, Clone)]
pub struct LocationCart {
    pub location: Location,
    pub cart: Option<Cart>,
}

/// Gathers rosters and slot availability spanning several locations or dates.
pub struct AvailabilityAggregator {
    api: Arc<dyn BookingApi>,
    locations: LocationDirectory,
    palette: Vec<String>,
}

impl AvailabilityAggregator {
    pub fn new(api: Arc<dyn BookingApi>, locations: LocationDirectory, palette: Vec<String>) -> Self {
        Self {
            api,
            locations,
            palette,
        }
    }

    /// Open one cart per configured location and merge their staff rosters.
    pub async fn load_all_staff(&self) -> Vec<StaffMember> {
        let carts = join_all(self.locations.all().iter().map(|l| self.open_cart(l))).await;
        let loaded = carts.iter().filter(|c| c.cart.is_some()).count();
        let roster = merge_rosters(&carts);
        info!(
            locations = carts.len(),
            loaded,
            staff = roster.len(),
            "Loaded staff roster"
        );
        roster
    }

    async fn open_cart(&self, location: &Location) -> LocationCart {
        let cart = match self.api.create_cart(location.id()).await {
            Ok(cart) => Some(cart),
            Err(e) => {
                warn!(location = %location.name(), error = %e, "Cart creation failed; skipping location");
                None
            }
        };
        LocationCart {
            location: location.clone(),
            cart,
        }
    }

    /// Colour per location touched by `roster`, derived fresh each call.
    pub fn location_colors(&self, roster: &[StaffMember]) -> BTreeMap<String, String> {
        assign_location_colors(roster, &self.palette)
    }

    /// Slots for every bookable day of `month` on an existing cart.
    ///
    /// Each date is fetched independently; a failed date is recorded as an
    /// empty list. Days before `today` are never queried.
    pub async fn load_month(
        &self,
        cart_id: &str,
        month: NaiveDate,
        today: NaiveDate,
        staff_id: Option<&str>,
    ) -> CalendarAvailability {
        let dates = bookable_dates(month, today);
        let results = join_all(dates.iter().map(|&date| async move {
            (date, self.api.get_available_times(cart_id, date, staff_id).await)
        }))
        .await;

        results
            .into_iter()
            .map(|(date, result)| match result {
                Ok(slots) => (date, slots.into_iter().map(untagged).collect()),
                Err(e) => {
                    warn!(%date, cart_id, error = %e, "Availability fetch failed; recording no slots");
                    (date, Vec::new())
                }
            })
            .collect()
    }

    /// One injector's openings across `locations`, merged per date and
    /// tagged with the location supplying each slot.
    ///
    /// Every bookable day of the month is present in the result, possibly
    /// empty. A location that fails at any stage contributes nothing.
    pub async fn load_injector_availability(
        &self,
        staff_id: &str,
        locations: &[String],
        month: NaiveDate,
        today: NaiveDate,
    ) -> CalendarAvailability {
        let per_location = join_all(
            locations
                .iter()
                .map(|name| self.injector_availability_at(staff_id, name, month, today)),
        )
        .await;

        let mut merged: CalendarAvailability = bookable_dates(month, today)
            .into_iter()
            .map(|d| (d, Vec::new()))
            .collect();

        for availability in per_location.into_iter().flatten() {
            for (date, slots) in availability {
                merged.entry(date).or_default().extend(slots);
            }
        }
        for slots in merged.values_mut() {
            slots.sort_by_key(|s| s.start_time);
        }

        merged
    }

    async fn injector_availability_at(
        &self,
        staff_id: &str,
        location_name: &str,
        month: NaiveDate,
        today: NaiveDate,
    ) -> Option<CalendarAvailability> {
        let Some(location) = self.locations.resolve(location_name) else {
            warn!(location = location_name, "Injector listed at an unknown location");
            return None;
        };

        let cart = match self.api.create_cart(location.id()).await {
            Ok(cart) => cart,
            Err(e) => {
                warn!(location = location_name, error = %e, "Cart creation failed; skipping location");
                return None;
            }
        };

        let Some((item_id, variant_id)) = first_item_for_staff(&cart, staff_id) else {
            debug!(location = location_name, staff_id, "Injector offers no services here");
            return None;
        };

        if let Err(e) = self
            .api
            .add_service(&cart.id, &item_id, Some(&variant_id))
            .await
        {
            warn!(location = location_name, error = %e, "Could not attach service; skipping location");
            return None;
        }

        let mut availability = self.load_month(&cart.id, month, today, Some(staff_id)).await;
        for slot in availability.values_mut().flatten() {
            slot.location = Some(location_name.to_string());
        }
        Some(availability)
    }
}

fn untagged(slot: TimeSlot) -> CalendarSlot {
    CalendarSlot {
        id: slot.id,
        start_time: slot.start_time,
        location: None,
    }
}

/// First catalog item with a variant for `staff_id`, as `(item id, variant id)`.
fn first_item_for_staff(cart: &Cart, staff_id: &str) -> Option<(String, String)> {
    cart.available_categories
        .iter()
        .flat_map(|c| &c.available_items)
        .find_map(|item| {
            item.staff_variants
                .iter()
                .find(|v| v.staff.as_ref().is_some_and(|s| s.id == staff_id))
                .map(|v| (item.id.clone(), v.id.clone()))
        })
}

/// De-duplicate staff across location carts, accumulating their locations
/// in order of first appearance. Failed locations are skipped.
pub fn merge_rosters(carts: &[LocationCart]) -> Vec<StaffMember> {
    let mut roster: Vec<StaffMember> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for LocationCart { location, cart } in carts {
        let Some(cart) = cart else { continue };
        let staff = cart
            .available_categories
            .iter()
            .flat_map(|c| &c.available_items)
            .flat_map(|i| &i.staff_variants)
            .filter_map(|v| v.staff.as_ref());

        for s in staff {
            match index.get(&s.id) {
                Some(&i) => {
                    let member = &mut roster[i];
                    if !member.locations.iter().any(|l| l == location.name()) {
                        member.locations.push(location.name().to_string());
                    }
                }
                None => {
                    index.insert(s.id.clone(), roster.len());
                    roster.push(StaffMember {
                        id: s.id.clone(),
                        first_name: s.first_name.clone(),
                        last_name: s.last_name.clone(),
                        nickname: s.nickname.clone(),
                        avatar_url: s.avatar.clone(),
                        locations: vec![location.name().to_string()],
                    });
                }
            }
        }
    }

    roster
}

/// Palette colour per location in first-seen order, cycling the palette.
pub fn assign_location_colors(roster: &[StaffMember], palette: &[String]) -> BTreeMap<String, String> {
    let mut colors = BTreeMap::new();
    if palette.is_empty() {
        return colors;
    }
    let mut seen = 0;
    for location in roster.iter().flat_map(|s| &s.locations) {
        if !colors.contains_key(location) {
            colors.insert(location.clone(), palette[seen % palette.len()].clone());
            seen += 1;
        }
    }
    colors
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Every day of the month starting at `month`.
pub fn month_days(month: NaiveDate) -> Vec<NaiveDate> {
    let first = month_start(month);
    first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .collect()
}

/// Days of the month that are today or later.
pub fn bookable_dates(month: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    month_days(month).into_iter().filter(|d| *d >= today).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        Booking, BookingConfirmation, CartCategory, CartItem, ClientInfo, Staff, StaffVariant,
    };
    use crate::error::ApiError;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn staff(id: &str, first: &str) -> Staff {
        Staff {
            id: id.into(),
            first_name: first.into(),
            last_name: "Test".into(),
            ..Default::default()
        }
    }

    fn cart(id: &str, staff: &[Staff]) -> Cart {
        Cart {
            id: id.into(),
            available_categories: vec![CartCategory {
                name: "Injectables".into(),
                available_items: vec![CartItem {
                    id: format!("{id}-botox"),
                    name: "Botox".into(),
                    staff_variants: staff
                        .iter()
                        .map(|s| StaffVariant {
                            id: format!("{id}-{}", s.id),
                            staff: Some(s.clone()),
                        })
                        .collect(),
                    ..Default::default()
                }],
            }],
        }
    }

    /// Backend stub keyed by location id / date; anything missing fails.
    #[derive(Default)]
    struct StubApi {
        carts: HashMap<String, Cart>,
        slots: HashMap<(String, NaiveDate), Vec<TimeSlot>>,
        queried: Mutex<Vec<NaiveDate>>,
    }

    #[async_trait]
    impl BookingApi for StubApi {
        async fn create_cart(&self, location_id: &str) -> Result<Cart, ApiError> {
            self.carts
                .get(location_id)
                .cloned()
                .ok_or_else(|| ApiError::Network("down".into()))
        }
        async fn add_service(&self, cart_id: &str, _: &str, _: Option<&str>) -> Result<Cart, ApiError> {
            Ok(Cart {
                id: cart_id.into(),
                ..Default::default()
            })
        }
        async fn get_available_times(
            &self,
            cart_id: &str,
            date: NaiveDate,
            _staff_id: Option<&str>,
        ) -> Result<Vec<TimeSlot>, ApiError> {
            self.queried.lock().unwrap().push(date);
            self.slots
                .get(&(cart_id.to_string(), date))
                .cloned()
                .ok_or_else(|| ApiError::Api {
                    status: 500,
                    message: "boom".into(),
                })
        }
        async fn reserve_slot(&self, _: &str, _: &str) -> Result<Cart, ApiError> {
            unimplemented!()
        }
        async fn update_client_info(&self, _: &str, _: &ClientInfo) -> Result<Cart, ApiError> {
            unimplemented!()
        }
        async fn complete_booking(&self, _: &str) -> Result<BookingConfirmation, ApiError> {
            unimplemented!()
        }
        async fn get_booking(&self, _: &str) -> Result<Booking, ApiError> {
            unimplemented!()
        }
        async fn cancel_booking(&self, _: &str, _: &str) -> Result<Booking, ApiError> {
            unimplemented!()
        }
    }

    fn directory() -> LocationDirectory {
        LocationDirectory::new([("West Village", "wv"), ("SoHo", "soho"), ("Tribeca", "tri")])
    }

    fn slot(id: &str, at: &str) -> TimeSlot {
        TimeSlot {
            id: id.into(),
            start_time: DateTime::parse_from_rfc3339(at).unwrap(),
        }
    }

    fn aggregator(api: StubApi) -> (AvailabilityAggregator, Arc<StubApi>) {
        let api = Arc::new(api);
        let agg = AvailabilityAggregator::new(
            api.clone(),
            directory(),
            vec!["#111".into(), "#222".into()],
        );
        (agg, api)
    }

    #[tokio::test]
    async fn roster_skips_failed_locations_and_dedupes() {
        let sarah = staff("s1", "Sarah");
        let mike = staff("s2", "Michael");
        let mut api = StubApi::default();
        api.carts.insert("wv".into(), cart("c-wv", &[sarah.clone()]));
        api.carts.insert("tri".into(), cart("c-tri", &[mike.clone(), sarah.clone()]));
        // "soho" fails.

        let (agg, _) = aggregator(api);
        let roster = agg.load_all_staff().await;

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, "s1");
        assert_eq!(roster[0].locations, vec!["West Village", "Tribeca"]);
        assert_eq!(roster[1].id, "s2");
        assert_eq!(roster[1].locations, vec!["Tribeca"]);
    }

    #[tokio::test]
    async fn roster_is_empty_when_every_location_fails() {
        let (agg, _) = aggregator(StubApi::default());
        assert!(agg.load_all_staff().await.is_empty());
    }

    #[test]
    fn colors_cycle_in_first_seen_order() {
        let member = |id: &str, locs: &[&str]| StaffMember {
            id: id.into(),
            first_name: id.into(),
            last_name: String::new(),
            nickname: None,
            avatar_url: None,
            locations: locs.iter().map(|l| l.to_string()).collect(),
        };
        let roster = vec![member("a", &["SoHo", "Tribeca"]), member("b", &["Miami", "SoHo"])];
        let palette = vec!["#111".to_string(), "#222".to_string()];
        let colors = assign_location_colors(&roster, &palette);
        assert_eq!(colors["SoHo"], "#111");
        assert_eq!(colors["Tribeca"], "#222");
        assert_eq!(colors["Miami"], "#111");
        assert!(assign_location_colors(&roster, &[]).is_empty());
    }

    #[tokio::test]
    async fn month_load_records_failures_as_empty_and_skips_past() {
        let mut api = StubApi::default();
        api.slots.insert(
            ("cart".into(), date(3, 30)),
            vec![slot("a", "2025-03-30T10:00:00-04:00")],
        );
        // 2025-03-31 is not stubbed and fails.
        let (agg, api) = aggregator(api);

        let month = agg.load_month("cart", date(3, 1), date(3, 30), None).await;

        assert_eq!(month.len(), 2);
        assert_eq!(month[&date(3, 30)].len(), 1);
        assert!(month[&date(3, 31)].is_empty());
        let mut queried = api.queried.lock().unwrap().clone();
        queried.sort();
        assert_eq!(queried, vec![date(3, 30), date(3, 31)]);
    }

    #[tokio::test]
    async fn injector_availability_merges_and_tags_locations() {
        let sarah = staff("s1", "Sarah");
        let mut api = StubApi::default();
        api.carts.insert("wv".into(), cart("c-wv", &[sarah.clone()]));
        api.carts.insert("soho".into(), cart("c-soho", &[sarah.clone()]));
        api.slots.insert(
            ("c-wv".into(), date(3, 31)),
            vec![slot("wv-2", "2025-03-31T14:00:00-04:00")],
        );
        api.slots.insert(
            ("c-soho".into(), date(3, 31)),
            vec![slot("soho-1", "2025-03-31T09:00:00-04:00")],
        );
        let (agg, _) = aggregator(api);

        let merged = agg
            .load_injector_availability(
                "s1",
                &["West Village".into(), "SoHo".into(), "Tribeca".into()],
                date(3, 1),
                date(3, 31),
            )
            .await;

        let day = &merged[&date(3, 31)];
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].id, "soho-1");
        assert_eq!(day[0].location.as_deref(), Some("SoHo"));
        assert_eq!(day[1].location.as_deref(), Some("West Village"));
    }

    #[test]
    fn month_helpers() {
        assert_eq!(month_days(date(2, 14)).len(), 28);
        assert_eq!(month_start(date(2, 14)), date(2, 1));
        assert_eq!(bookable_dates(date(3, 1), date(3, 29)).len(), 3);
        assert!(bookable_dates(date(2, 1), date(3, 1)).is_empty());
    }
}
