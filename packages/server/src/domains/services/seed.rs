//! Default directory contents.

use super::models::{EmergencyService, ServiceCategory};
use crate::common::fold_key;

pub const SEED_CITIES: [&str; 10] = [
    "Warsaw", "Krakow", "Lodz", "Wroclaw", "Poznan", "Gdansk", "Szczecin", "Lublin", "Katowice",
    "Bialystok",
];

const CONTACT_DOMAIN: &str = "gov.pl";

/// Routes every category of one city to a single inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityOverride {
    pub city: String,
    pub contact: String,
}

/// What `seed` and `reset` write into an empty directory.
#[derive(Debug, Clone, Default)]
pub struct DirectorySeed {
    pub city_override: Option<CityOverride>,
}

impl DirectorySeed {
    pub fn with_override(city: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            city_override: Some(CityOverride {
                city: city.into(),
                contact: contact.into(),
            }),
        }
    }

    /// One entry per (city, category), cities in `SEED_CITIES` order.
    pub fn services(&self) -> Vec<EmergencyService> {
        SEED_CITIES
            .iter()
            .flat_map(|city| {
                ServiceCategory::ALL
                    .into_iter()
                    .map(move |category| EmergencyService::new(category, *city, self.contact_for(city, category)))
            })
            .collect()
    }

    fn contact_for(&self, city: &str, category: ServiceCategory) -> String {
        if let Some(city_override) = &self.city_override {
            if fold_key(&city_override.city) == fold_key(city) {
                return city_override.contact.clone();
            }
        }
        format!("{}@{}.{}", mailbox(category), city.to_lowercase(), CONTACT_DOMAIN)
    }
}

fn mailbox(category: ServiceCategory) -> &'static str {
    match category {
        ServiceCategory::Hospital => "hospital",
        ServiceCategory::Firestation => "firestation",
        ServiceCategory::Policestation => "police",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed_has_every_city_and_category() {
        let services = DirectorySeed::default().services();
        assert_eq!(services.len(), SEED_CITIES.len() * 3);
        assert_eq!(
            services[0],
            EmergencyService::new(ServiceCategory::Hospital, "Warsaw", "hospital@warsaw.gov.pl")
        );
        assert!(services.contains(&EmergencyService::new(
            ServiceCategory::Policestation,
            "Krakow",
            "police@krakow.gov.pl"
        )));
        assert!(services.contains(&EmergencyService::new(
            ServiceCategory::Firestation,
            "Gdansk",
            "firestation@gdansk.gov.pl"
        )));
    }

    #[test]
    fn test_override_replaces_one_city() {
        let services = DirectorySeed::with_override("bialystok", "duty@example.org").services();
        let bialystok: Vec<_> = services.iter().filter(|s| s.city == "Bialystok").collect();
        assert_eq!(bialystok.len(), 3);
        assert!(bialystok.iter().all(|s| s.contact == "duty@example.org"));
        assert!(services
            .iter()
            .any(|s| s.city == "Lublin" && s.contact == "hospital@lublin.gov.pl"));
    }

    #[test]
    fn test_override_matches_local_spelling() {
        let services = DirectorySeed::with_override("  Białystok ", "duty@example.org").services();
        let routed: Vec<_> = services
            .iter()
            .filter(|s| s.contact == "duty@example.org")
            .collect();
        assert_eq!(routed.len(), 3);
        assert!(routed.iter().all(|s| s.city == "Bialystok"));
    }
}
