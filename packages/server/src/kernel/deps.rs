//! Server dependencies (using traits for testability)
//!
//! The central dependency container handed to the incident coordinator and
//! the HTTP layer. External services sit behind trait objects so tests can
//! swap in mocks from `test_dependencies`.

use std::sync::Arc;

use knowledge::KnowledgeBase;

use crate::domains::services::ServiceDirectory;
use crate::kernel::{BaseGeocoder, BaseMailer};

#[derive(Clone)]
pub struct ServerDeps {
    pub directory: ServiceDirectory,
    pub geocoder: Arc<dyn BaseGeocoder>,
    pub mailer: Arc<dyn BaseMailer>,
    pub knowledge: KnowledgeBase,
}

impl ServerDeps {
    pub fn new(
        directory: ServiceDirectory,
        geocoder: Arc<dyn BaseGeocoder>,
        mailer: Arc<dyn BaseMailer>,
        knowledge: KnowledgeBase,
    ) -> Self {
        Self {
            directory,
            geocoder,
            mailer,
            knowledge,
        }
    }
}
