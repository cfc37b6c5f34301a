//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod geocoder;
pub mod mailer;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use geocoder::{NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use mailer::{SmtpConfig, SmtpMailer};
pub use test_dependencies::{MockGeocoder, MockMailer, TestDependencies};
pub use traits::*;
