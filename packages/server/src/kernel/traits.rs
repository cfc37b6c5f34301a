// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Routing and incident composition live in the domains and use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseGeocoder, BaseMailer)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::Coordinates;

// =============================================================================
// Geocoder Trait (Infrastructure - reverse geocoding)
// =============================================================================

#[async_trait]
pub trait BaseGeocoder: Send + Sync {
    /// Resolve coordinates to the name of the city containing them.
    ///
    /// `Ok(None)` means the provider answered but knows no city there.
    async fn reverse_city(&self, coordinates: Coordinates) -> Result<Option<String>>;
}

// =============================================================================
// Mailer Trait (Infrastructure - outbound mail)
// =============================================================================

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Blocking mail transport.
///
/// `send` opens a session, authenticates and transmits in one call, and may
/// block for the whole network round trip. Callers on the async runtime must
/// go through the notification dispatcher rather than call it directly.
pub trait BaseMailer: Send + Sync {
    fn send(&self, message: &OutgoingMessage) -> Result<()>;
}
