//! Three-tier contact resolution.
//!
//! 1. The city the caller named.
//! 2. The city reverse-geocoded from the caller's coordinates.
//! 3. The first entry of the category anywhere.
//!
//! A failure inside a tier (storage or geocoder) only skips that tier.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::directory::ServiceDirectory;
use super::models::ServiceCategory;
use super::normalizer::CategoryNormalizer;
use crate::common::Coordinates;
use crate::kernel::BaseGeocoder;

/// Which tier produced a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionTier {
    ExactCity,
    GeocodedCity { city: String },
    /// Any entry of the category. May be in a different city than the incident.
    CategoryFallback,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::ExactCity => "exact_city",
            ResolutionTier::GeocodedCity { .. } => "geocoded_city",
            ResolutionTier::CategoryFallback => "category_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub category: ServiceCategory,
    pub contact: String,
    pub tier: ResolutionTier,
}

#[derive(Clone)]
pub struct ServiceResolver {
    normalizer: CategoryNormalizer,
    directory: ServiceDirectory,
    geocoder: Arc<dyn BaseGeocoder>,
}

impl ServiceResolver {
    pub fn new(directory: ServiceDirectory, geocoder: Arc<dyn BaseGeocoder>) -> Self {
        Self {
            normalizer: CategoryNormalizer::default(),
            directory,
            geocoder,
        }
    }

    pub fn with_normalizer(mut self, normalizer: CategoryNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &CategoryNormalizer {
        &self.normalizer
    }

    /// Resolve a free-text service request to a contact.
    ///
    /// `None` when the request names no known category, or the directory has
    /// no entry of that category at all.
    pub async fn resolve(
        &self,
        raw_service: &str,
        city: &str,
        coordinates: Option<Coordinates>,
    ) -> Option<Resolution> {
        let Some(category) = self.normalizer.normalize(raw_service) else {
            info!(service = %raw_service, "Requested service matches no known category");
            return None;
        };

        let resolved = |contact: String, tier: ResolutionTier| Resolution {
            category,
            contact,
            tier,
        };

        if let Some(contact) = self.exact_city(category, city).await {
            return Some(resolved(contact, ResolutionTier::ExactCity));
        }

        if let Some(coordinates) = coordinates {
            if let Some((geocoded, contact)) = self.geocoded_city(category, coordinates).await {
                return Some(resolved(contact, ResolutionTier::GeocodedCity { city: geocoded }));
            }
        }

        let contact = self.any_city(category).await?;
        warn!(
            category = %category,
            city = %city,
            contact = %contact,
            "No contact for incident city, falling back to first entry of category (may be a different city)"
        );
        Some(resolved(contact, ResolutionTier::CategoryFallback))
    }

    /// Like [`resolve`](Self::resolve), returning only the contact.
    pub async fn resolve_contact(
        &self,
        raw_service: &str,
        city: &str,
        coordinates: Option<Coordinates>,
    ) -> Option<String> {
        self.resolve(raw_service, city, coordinates)
            .await
            .map(|resolution| resolution.contact)
    }

    async fn exact_city(&self, category: ServiceCategory, city: &str) -> Option<String> {
        if city.trim().is_empty() {
            debug!("No city supplied, skipping exact-city lookup");
            return None;
        }

        match self.directory.lookup(category, Some(city)).await {
            Ok(contact) => contact,
            Err(e) => {
                error!(error = %e, city = %city, "Exact-city lookup failed");
                None
            }
        }
    }

    async fn geocoded_city(
        &self,
        category: ServiceCategory,
        coordinates: Coordinates,
    ) -> Option<(String, String)> {
        let geocoded = match self.geocoder.reverse_city(coordinates).await {
            Ok(Some(city)) => city,
            Ok(None) => {
                debug!(%coordinates, "Geocoder found no city at coordinates");
                return None;
            }
            Err(e) => {
                warn!(error = %e, %coordinates, "Reverse geocoding failed");
                return None;
            }
        };

        match self.directory.lookup(category, Some(&geocoded)).await {
            Ok(Some(contact)) => {
                info!(city = %geocoded, %coordinates, "Resolved contact via geocoded city");
                Some((geocoded, contact))
            }
            Ok(None) => {
                debug!(city = %geocoded, "No directory entry for geocoded city");
                None
            }
            Err(e) => {
                error!(error = %e, city = %geocoded, "Geocoded-city lookup failed");
                None
            }
        }
    }

    async fn any_city(&self, category: ServiceCategory) -> Option<String> {
        match self.directory.lookup_any(category).await {
            Ok(contact) => contact,
            Err(e) => {
                error!(error = %e, category = %category, "Category fallback lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::services::DirectorySeed;
    use crate::kernel::MockGeocoder;

    async fn resolver(geocoder: Arc<MockGeocoder>) -> ServiceResolver {
        let directory = ServiceDirectory::in_memory().await.unwrap();
        directory.seed(&DirectorySeed::default()).await.unwrap();
        ServiceResolver::new(directory, geocoder)
    }

    #[tokio::test]
    async fn test_exact_city_skips_geocoder() {
        let geocoder = Arc::new(MockGeocoder::returning("Gdansk"));
        let resolver = resolver(geocoder.clone()).await;

        let resolution = resolver
            .resolve("police", "Krakow", Coordinates::new(54.35, 18.64))
            .await
            .unwrap();

        assert_eq!(resolution.contact, "police@krakow.gov.pl");
        assert_eq!(resolution.tier, ResolutionTier::ExactCity);
        assert_eq!(geocoder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_service_resolves_to_nothing() {
        let resolver = resolver(Arc::new(MockGeocoder::returning("Krakow"))).await;
        assert_eq!(resolver.resolve("coast guard", "Krakow", None).await, None);
    }

    #[tokio::test]
    async fn test_blank_city_goes_to_fallback() {
        let resolver = resolver(Arc::new(MockGeocoder::empty())).await;
        let resolution = resolver.resolve("ambulance", "  ", None).await.unwrap();
        assert_eq!(resolution.contact, "hospital@warsaw.gov.pl");
        assert_eq!(resolution.tier, ResolutionTier::CategoryFallback);
    }

    #[tokio::test]
    async fn test_storage_failure_in_every_tier_resolves_to_nothing() {
        let geocoder = Arc::new(MockGeocoder::returning("Gdansk"));
        let directory = ServiceDirectory::in_memory().await.unwrap();
        directory.seed(&DirectorySeed::default()).await.unwrap();
        let resolver = ServiceResolver::new(directory.clone(), geocoder.clone());

        directory.pool().close().await;

        let resolution = resolver
            .resolve("fire", "Krakow", Coordinates::new(54.35, 18.64))
            .await;
        assert_eq!(resolution, None);
        assert_eq!(geocoder.call_count(), 1);
    }
}
