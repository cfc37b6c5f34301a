pub mod directory;
pub mod models;
pub mod normalizer;
pub mod resolver;
pub mod seed;

// Re-export commonly used types
pub use directory::ServiceDirectory;
pub use models::{EmergencyService, ServiceCategory};
pub use normalizer::{CategoryNormalizer, SERVICE_KEYWORDS};
pub use resolver::{Resolution, ResolutionTier, ServiceResolver};
pub use seed::{CityOverride, DirectorySeed, SEED_CITIES};
