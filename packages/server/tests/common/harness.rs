//! Test harness wiring the coordinator to mocks and an in-memory directory.

use std::sync::Arc;

use dispatch_core::domains::incidents::{Conversation, IncidentCoordinator};
use dispatch_core::domains::notifications::NotificationDispatcher;
use dispatch_core::domains::services::{DirectorySeed, ServiceDirectory};
use dispatch_core::kernel::{MockGeocoder, MockMailer, ServerDeps, TestDependencies};
use knowledge::{build_index, ChunkConfig, Document, KnowledgeBase, MockEmbedder};
use tokio::task::JoinHandle;

pub struct TestHarness {
    pub deps: ServerDeps,
    pub geocoder: Arc<MockGeocoder>,
    pub mailer: Arc<MockMailer>,
    pub coordinator: Arc<IncidentCoordinator>,
    _worker: JoinHandle<()>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with(TestDependencies::new()).await
    }

    /// Mocks plus a directory seeded with the default cities.
    pub async fn with(test_deps: TestDependencies) -> Self {
        let directory = ServiceDirectory::in_memory()
            .await
            .expect("Failed to open in-memory directory");
        directory
            .seed(&DirectorySeed::default())
            .await
            .expect("Failed to seed directory");
        Self::with_directory(test_deps, directory)
    }

    pub fn with_directory(test_deps: TestDependencies, directory: ServiceDirectory) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let geocoder = test_deps.geocoder.clone();
        let mailer = test_deps.mailer.clone();
        let deps = test_deps.into_server_deps_with(directory);

        let (dispatcher, worker) = NotificationDispatcher::spawn(deps.mailer.clone());
        let coordinator = Arc::new(IncidentCoordinator::from_deps(&deps, dispatcher));

        Self {
            deps,
            geocoder,
            mailer,
            coordinator,
            _worker: worker,
        }
    }

    pub fn conversation(&self, id: &str) -> Conversation {
        Conversation::new(id, self.coordinator.clone())
    }
}

/// Arguments for a `send_incident_note` call, as the model would send them.
pub fn incident_args(service: &str, city: &str, coordinates: &str, photo_summary: &str) -> String {
    serde_json::json!({
        "incident_type": "fire",
        "city": city,
        "location": "ul. Florianska 3",
        "casualties": "none",
        "details": "smoke from second floor",
        "recommended_service": service,
        "coordinates": coordinates,
        "photo_summary": photo_summary,
    })
    .to_string()
}

/// A small guideline index embedded with the mock embedder.
pub async fn guideline_knowledge_base() -> KnowledgeBase {
    let embedder = MockEmbedder::new();
    let documents = vec![
        Document::new(
            "bleeding.txt",
            "To stop bleeding apply firm pressure on the wound with a clean cloth.",
        ),
        Document::new(
            "cpr.txt",
            "For CPR push hard and fast in the center of the chest.",
        ),
        Document::new("burns.txt", "Cool burns under running water for twenty minutes."),
    ];

    let index = build_index(&documents, &embedder, ChunkConfig::default())
        .await
        .expect("Failed to build test index");
    KnowledgeBase::new(index, Arc::new(embedder))
}
