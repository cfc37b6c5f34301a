pub mod category;
pub mod emergency_service;

pub use category::ServiceCategory;
pub use emergency_service::{EmergencyService, EmergencyServiceRow};
