//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default backend base URL (the credential-holding relay).
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Default number for the out-of-band contact fallback.
pub const DEFAULT_CONTACT_NUMBER: &str = "+16463468809";

/// Colours assigned to locations in the cross-location availability view.
pub const DEFAULT_LOCATION_PALETTE: &[&str] = &[
    "#007AFF", "#34C759", "#FF9500", "#FF3B30", "#5856D6", "#AF52DE", "#FF2D92", "#64D2FF",
];

const DEFAULT_LOCATIONS: &[(&str, &str)] = &[
    ("West Village", "ffaaff3c-d5ba-408e-ba3b-455554b77116"),
    ("SoHo", "89763e68-2454-429c-ae9c-c1b4d91e7b81"),
    ("Tribeca", "43dfb866-a872-4f01-9491-6c6584e3c3e7"),
    ("Williamsburg", "93566b17-c023-4fe1-9a84-462f143bd024"),
    ("Hoboken", "a885e859-21ef-43c7-8a63-bb242db98de2"),
    ("Uptown", "b146c47b-6de8-475a-8ebd-8a1d2b36546d"),
    ("Miami", "1cbb848e-138b-4142-bc3d-b9f4ea9a42db"),
];

/// A bookable location: display name paired with its backend id.
///
/// Only obtainable from a [`LocationDirectory`], so the pair never drifts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Location {
    name: String,
    id: String,
}

impl Location {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Read-only mapping from location display name to backend location id.
#[derive(Debug, Clone)]
pub struct LocationDirectory {
    locations: Vec<Location>,
}

impl LocationDirectory {
    /// Build a directory from `(name, id)` pairs, keeping their order.
    pub fn new<I, N, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        Self {
            locations: entries
                .into_iter()
                .map(|(name, id)| Location {
                    name: name.into(),
                    id: id.into(),
                })
                .collect(),
        }
    }

    /// Look up a location by display name.
    pub fn resolve(&self, name: &str) -> Option<Location> {
        self.locations.iter().find(|l| l.name == name).cloned()
    }

    /// All locations in configured order.
    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    pub fn names(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.name.clone()).collect()
    }
}

impl Default for LocationDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATIONS.iter().copied())
    }
}

/// Booking backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request deadline.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Wizard configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub api: ApiConfig,
    pub locations: LocationDirectory,
    pub location_palette: Vec<String>,
    /// Phone number used for the SMS contact fallback.
    pub contact_number: String,
    /// Maximum number of services offered at once.
    pub max_services_shown: usize,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            locations: LocationDirectory::default(),
            location_palette: DEFAULT_LOCATION_PALETTE.iter().map(|c| c.to_string()).collect(),
            contact_number: DEFAULT_CONTACT_NUMBER.to_string(),
            max_services_shown: 10,
        }
    }
}

impl WizardConfig {
    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// - `BOOKING_API_BASE_URL`
    /// - `BOOKING_API_TIMEOUT_MS`
    /// - `BOOKING_CONTACT_NUMBER`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("BOOKING_API_BASE_URL") {
            config.api.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("BOOKING_API_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "BOOKING_API_TIMEOUT_MS".to_string(),
                message: format!("{e}"),
            })?;
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "BOOKING_API_TIMEOUT_MS".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.api.timeout = Duration::from_millis(ms);
        }

        if let Some(number) = lookup("BOOKING_CONTACT_NUMBER") {
            config.contact_number = number;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = WizardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.location_palette.len(), 8);
        assert_eq!(config.locations.all().len(), 7);
    }

    #[test]
    fn env_overrides() {
        let config = WizardConfig::from_lookup(lookup(&[
            ("BOOKING_API_BASE_URL", "https://relay.example.com/api/"),
            ("BOOKING_API_TIMEOUT_MS", "2500"),
            ("BOOKING_CONTACT_NUMBER", "+15550001111"),
        ]))
        .unwrap();
        assert_eq!(config.api.base_url, "https://relay.example.com/api");
        assert_eq!(config.api.timeout, Duration::from_millis(2500));
        assert_eq!(config.contact_number, "+15550001111");
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = WizardConfig::from_lookup(lookup(&[("BOOKING_API_TIMEOUT_MS", "soon")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));

        let err = WizardConfig::from_lookup(lookup(&[("BOOKING_API_TIMEOUT_MS", "0")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn directory_resolves_name_to_id() {
        let dir = LocationDirectory::default();
        let soho = dir.resolve("SoHo").unwrap();
        assert_eq!(soho.name(), "SoHo");
        assert_eq!(soho.id(), "89763e68-2454-429c-ae9c-c1b4d91e7b81");
        assert!(dir.resolve("Brooklyn Heights").is_none());
        assert_eq!(dir.names()[0], "West Village");
        assert_eq!(dir.names()[6], "Miami");
    }
}
