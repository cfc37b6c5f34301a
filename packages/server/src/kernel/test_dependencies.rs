// TestDependencies - mock implementations for testing
//
// Provides mock infrastructure that can be injected into ServerDeps for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use knowledge::KnowledgeBase;

use super::{BaseGeocoder, BaseMailer, OutgoingMessage, ServerDeps};
use crate::common::Coordinates;
use crate::domains::services::ServiceDirectory;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Mock Geocoder
// =============================================================================

#[derive(Debug, Clone)]
enum GeocodeResponse {
    City(Option<String>),
    Failure(String),
}

pub struct MockGeocoder {
    response: GeocodeResponse,
    calls: Mutex<Vec<Coordinates>>,
}

impl MockGeocoder {
    /// Geocoder that resolves every position to `city`.
    pub fn returning(city: &str) -> Self {
        Self::with_response(GeocodeResponse::City(Some(city.to_string())))
    }

    /// Geocoder that answers but knows no city.
    pub fn empty() -> Self {
        Self::with_response(GeocodeResponse::City(None))
    }

    /// Geocoder whose provider is unreachable.
    pub fn failing() -> Self {
        Self::with_response(GeocodeResponse::Failure("geocoder unreachable".to_string()))
    }

    fn with_response(response: GeocodeResponse) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Coordinates> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl BaseGeocoder for MockGeocoder {
    async fn reverse_city(&self, coordinates: Coordinates) -> Result<Option<String>> {
        lock(&self.calls).push(coordinates);
        match &self.response {
            GeocodeResponse::City(city) => Ok(city.clone()),
            GeocodeResponse::Failure(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }
}

// =============================================================================
// Mock Mailer
// =============================================================================

/// Records every message instead of delivering it.
pub struct MockMailer {
    sent: Mutex<Vec<OutgoingMessage>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: None,
        }
    }

    /// Every send fails as if the relay rejected the session.
    pub fn failing() -> Self {
        let mailer = Self::new();
        mailer.set_failing(true);
        mailer
    }

    /// Block the calling thread for `delay` on every send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages that were delivered successfully.
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        lock(&self.sent).clone()
    }

    pub fn sent_to(&self, recipient: &str) -> bool {
        lock(&self.sent).iter().any(|m| m.to == recipient)
    }

    /// Delivery attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl BaseMailer for MockMailer {
    fn send(&self, message: &OutgoingMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("535 authentication rejected by mock relay");
        }

        lock(&self.sent).push(message.clone());
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for a [`ServerDeps`] wired to mocks and an in-memory directory.
pub struct TestDependencies {
    pub geocoder: Arc<MockGeocoder>,
    pub mailer: Arc<MockMailer>,
    knowledge: Option<KnowledgeBase>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            geocoder: Arc::new(MockGeocoder::empty()),
            mailer: Arc::new(MockMailer::new()),
            knowledge: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: MockGeocoder) -> Self {
        self.geocoder = Arc::new(geocoder);
        self
    }

    pub fn with_mailer(mut self, mailer: MockMailer) -> Self {
        self.mailer = Arc::new(mailer);
        self
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Build deps around a seeded in-memory directory.
    pub async fn into_server_deps(self) -> Result<ServerDeps> {
        let directory = ServiceDirectory::in_memory().await?;
        directory.seed(&Default::default()).await?;
        Ok(self.into_server_deps_with(directory))
    }

    /// Build deps around an existing directory.
    pub fn into_server_deps_with(self, directory: ServiceDirectory) -> ServerDeps {
        let knowledge = self
            .knowledge
            .unwrap_or_else(|| KnowledgeBase::unavailable("no index in tests"));
        ServerDeps::new(directory, self.geocoder, self.mailer, knowledge)
    }
}
