use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::common::Coordinates;
use crate::domains::services::{Resolution, ResolutionTier};

pub const ALERT_SUBJECT_PREFIX: &str = "112 Alert: ";

/// What the assistant reported, before routing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentReport {
    pub incident_type: String,
    pub city: String,
    pub address: String,
    pub casualties: String,
    pub details: String,
    pub recommended_service: String,
    pub coordinates: Option<Coordinates>,
    /// Scene description supplied with the call. Loses to a stored image analysis.
    pub photo_summary: String,
}

/// A routed incident, serialized as the notification body.
#[derive(Debug, Clone, Serialize)]
pub struct Incident {
    pub incident_id: Uuid,
    pub reported_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub city: String,
    pub address: String,
    /// `"lat,lng"`, or empty when no position is known
    pub coords: String,
    pub casualties: String,
    pub details: String,
    pub photo_analysis: String,
    pub service: String,
    pub category: &'static str,
    pub contact: String,
    pub resolution_tier: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_note: Option<String>,
}

impl Incident {
    /// Compose the outgoing incident from the report and its routing.
    pub fn compose(
        report: IncidentReport,
        coordinates: Option<Coordinates>,
        photo_analysis: String,
        resolution: &Resolution,
    ) -> Self {
        let routing_note = match resolution.tier {
            ResolutionTier::CategoryFallback => Some(format!(
                "No {} is registered for '{}'; routed to the first available {} contact, which may serve a different city.",
                resolution.category, report.city, resolution.category
            )),
            ResolutionTier::GeocodedCity { ref city } if !city.eq_ignore_ascii_case(&report.city) => {
                Some(format!("Routed by caller position to {}.", city))
            }
            _ => None,
        };

        Self {
            incident_id: Uuid::new_v4(),
            reported_at: Utc::now(),
            incident_type: report.incident_type,
            city: report.city,
            address: report.address,
            coords: coordinates.map(|c| c.to_string()).unwrap_or_default(),
            casualties: report.casualties,
            details: report.details,
            photo_analysis,
            service: report.recommended_service,
            category: resolution.category.as_str(),
            contact: resolution.contact.clone(),
            resolution_tier: resolution.tier.as_str(),
            routing_note,
        }
    }

    pub fn subject(&self) -> String {
        format!("{}{}", ALERT_SUBJECT_PREFIX, self.incident_type)
    }

    /// Pretty-printed JSON body.
    pub fn body(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Terminal state of one incident-filing call.
///
/// `Display` renders the message handed back to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentOutcome {
    NoContact { service: String, city: String },
    Delivered { contact: String },
    DeliveryFailed { contact: String, reason: String },
}

impl std::fmt::Display for IncidentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentOutcome::NoContact { service, city } => {
                write!(f, "Error: No email found for {} in {}.", service, city)
            }
            IncidentOutcome::Delivered { contact } => write!(f, "Report sent to {}.", contact),
            IncidentOutcome::DeliveryFailed { .. } => {
                write!(f, "Report generated but email failed.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::services::ServiceCategory;

    fn report() -> IncidentReport {
        IncidentReport {
            incident_type: "car crash".to_string(),
            city: "Krakow".to_string(),
            address: "Rynek Glowny 1".to_string(),
            casualties: "2".to_string(),
            details: "two cars".to_string(),
            recommended_service: "ambulance".to_string(),
            ..Default::default()
        }
    }

    fn resolution(tier: ResolutionTier) -> Resolution {
        Resolution {
            category: ServiceCategory::Hospital,
            contact: "hospital@krakow.gov.pl".to_string(),
            tier,
        }
    }

    #[test]
    fn test_body_carries_report_fields() {
        let incident = Incident::compose(
            report(),
            Coordinates::new(50.06, 19.94),
            "smoke".to_string(),
            &resolution(ResolutionTier::ExactCity),
        );
        let body: serde_json::Value = serde_json::from_str(&incident.body().unwrap()).unwrap();

        assert_eq!(body["type"], "car crash");
        assert_eq!(body["city"], "Krakow");
        assert_eq!(body["address"], "Rynek Glowny 1");
        assert_eq!(body["coords"], "50.06,19.94");
        assert_eq!(body["casualties"], "2");
        assert_eq!(body["photo_analysis"], "smoke");
        assert_eq!(body["service"], "ambulance");
        assert_eq!(body["category"], "hospital");
        assert_eq!(body["resolution_tier"], "exact_city");
        assert!(body.get("routing_note").is_none());
        assert_eq!(incident.subject(), "112 Alert: car crash");
    }

    #[test]
    fn test_fallback_is_flagged_in_body() {
        let incident = Incident::compose(
            report(),
            None,
            String::new(),
            &resolution(ResolutionTier::CategoryFallback),
        );
        assert_eq!(incident.coords, "");
        assert!(incident
            .routing_note
            .as_deref()
            .unwrap()
            .contains("different city"));
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            IncidentOutcome::NoContact {
                service: "coast guard".to_string(),
                city: "Krakow".to_string()
            }
            .to_string(),
            "Error: No email found for coast guard in Krakow."
        );
        assert_eq!(
            IncidentOutcome::Delivered {
                contact: "police@krakow.gov.pl".to_string()
            }
            .to_string(),
            "Report sent to police@krakow.gov.pl."
        );
        assert_eq!(
            IncidentOutcome::DeliveryFailed {
                contact: "police@krakow.gov.pl".to_string(),
                reason: "timeout".to_string()
            }
            .to_string(),
            "Report generated but email failed."
        );
    }
}
