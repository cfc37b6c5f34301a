// Business domains
pub mod incidents;
pub mod notifications;
pub mod services;
