//! Turning a cart's catalog into the services offered for a treatment.

use crate::api::{Cart, CartItem};
use crate::session::{Service, TreatmentType};

const INJECTABLE_KEYWORDS: &[&str] = &["botox", "filler", "inject", "dysport"];
const SKIN_KEYWORDS: &[&str] = &["laser", "microneedling", "facial", "peel"];

/// Services from `cart` matching `treatment`, at most `limit` of them.
///
/// With a specific `staff_id`, each service's staff variants are narrowed to
/// that staff member.
pub fn services_for(
    cart: &Cart,
    treatment: Option<TreatmentType>,
    staff_id: Option<&str>,
    limit: usize,
) -> Vec<Service> {
    cart.available_categories
        .iter()
        .flat_map(|category| {
            category
                .available_items
                .iter()
                .filter(move |item| matches_treatment(&category.name, item, treatment))
                .map(move |item| Service {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    description: item.description.clone(),
                    price: item.list_price,
                    duration: item.list_duration,
                    category: category.name.clone(),
                    staff_variants: item
                        .staff_variants
                        .iter()
                        .filter(|v| match staff_id {
                            Some(id) => v.staff.as_ref().is_some_and(|s| s.id == id),
                            None => true,
                        })
                        .cloned()
                        .collect(),
                })
        })
        .take(limit)
        .collect()
}

/// An explicit `treatmentCategory` decides; otherwise fall back to keywords
/// on the item and category names. Items matching nothing are excluded.
fn matches_treatment(category: &str, item: &CartItem, treatment: Option<TreatmentType>) -> bool {
    let (tag, keywords, category_hint) = match treatment {
        Some(TreatmentType::Injectable) => ("injectable", INJECTABLE_KEYWORDS, "inject"),
        Some(TreatmentType::Skin) => ("skin", SKIN_KEYWORDS, "skin"),
        // No treatment constraint.
        Some(TreatmentType::InjectorAvailability) | None => return true,
    };

    if let Some(explicit) = &item.treatment_category {
        return explicit.trim().eq_ignore_ascii_case(tag);
    }

    let name = item.name.to_lowercase();
    keywords.iter().any(|k| name.contains(k)) || category.to_lowercase().contains(category_hint)
}
