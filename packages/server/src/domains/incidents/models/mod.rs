pub mod incident;

pub use incident::{Incident, IncidentOutcome, IncidentReport, ALERT_SUBJECT_PREFIX};
