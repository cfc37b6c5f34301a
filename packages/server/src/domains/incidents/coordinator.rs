//! The assistant's tool surface.
//!
//! Composes the incident, resolves its contact and hands it to the
//! notification dispatcher. Every path ends in a plain string for the model;
//! nothing here propagates an error to the conversation.

use tracing::{info, warn};

use knowledge::{KnowledgeBase, DEFAULT_TOP_K};

use super::context::ConversationContext;
use super::models::{Incident, IncidentOutcome, IncidentReport};
use super::tools::{SendIncidentNoteArgs, ToolCommand};
use crate::common::Coordinates;
use crate::domains::notifications::{DispatchOutcome, NotificationDispatcher};
use crate::domains::services::ServiceResolver;
use crate::kernel::ServerDeps;

pub const NO_GUIDELINES: &str = "No guidelines found.";
pub const IMAGE_STORED: &str = "Image stored.";
pub const LOCATION_UPDATED: &str = "Location updated.";
pub const INVALID_LOCATION: &str = "Error: invalid coordinates.";

pub struct IncidentCoordinator {
    resolver: ServiceResolver,
    dispatcher: NotificationDispatcher,
    knowledge: KnowledgeBase,
    top_k: usize,
}

impl IncidentCoordinator {
    pub fn new(
        resolver: ServiceResolver,
        dispatcher: NotificationDispatcher,
        knowledge: KnowledgeBase,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            knowledge,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Wire a coordinator from the shared dependencies.
    pub fn from_deps(deps: &ServerDeps, dispatcher: NotificationDispatcher) -> Self {
        Self::new(
            ServiceResolver::new(deps.directory.clone(), deps.geocoder.clone()),
            dispatcher,
            deps.knowledge.clone(),
        )
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub async fn consult_guidelines(&self, query: &str) -> String {
        let text = self.knowledge.search(query, self.top_k).await;
        if text.trim().is_empty() {
            NO_GUIDELINES.to_string()
        } else {
            text
        }
    }

    /// Store the newest image and its analysis.
    pub async fn record_image(&self, ctx: &ConversationContext, image_url: &str, analysis: &str) {
        ctx.record_image(image_url, analysis).await;
        info!(
            conversation_id = %ctx.id(),
            analysis_chars = analysis.trim().len(),
            "Image analysis stored"
        );
    }

    pub async fn save_image_url(&self, ctx: &ConversationContext, url: &str) -> String {
        ctx.record_image_url(url).await;
        info!(conversation_id = %ctx.id(), url = %url, "Image URL saved");
        IMAGE_STORED.to_string()
    }

    /// Record the caller's GPS position. Invalid positions are ignored.
    pub async fn update_location(&self, ctx: &ConversationContext, lat: f64, lng: f64) -> Option<Coordinates> {
        match Coordinates::new(lat, lng) {
            Some(coordinates) => {
                ctx.set_location(coordinates).await;
                Some(coordinates)
            }
            None => {
                warn!(conversation_id = %ctx.id(), lat, lng, "Ignoring out-of-range location");
                None
            }
        }
    }

    /// Compose, route and deliver one incident report.
    pub async fn file_incident(
        &self,
        ctx: &ConversationContext,
        report: IncidentReport,
    ) -> IncidentOutcome {
        let (stored_analysis, stored_location) = ctx.snapshot().await;

        let coordinates = report.coordinates.or(stored_location);
        let photo_analysis = match stored_analysis {
            Some(analysis) => {
                info!(conversation_id = %ctx.id(), "Using stored image analysis for incident");
                analysis
            }
            None => report.photo_summary.clone(),
        };

        let Some(resolution) = self
            .resolver
            .resolve(&report.recommended_service, &report.city, coordinates)
            .await
        else {
            warn!(
                conversation_id = %ctx.id(),
                service = %report.recommended_service,
                city = %report.city,
                "No contact for incident"
            );
            return IncidentOutcome::NoContact {
                service: report.recommended_service,
                city: report.city,
            };
        };

        let incident = Incident::compose(report, coordinates, photo_analysis, &resolution);
        let contact = incident.contact.clone();

        let body = match incident.body() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize incident");
                return IncidentOutcome::DeliveryFailed {
                    contact,
                    reason: e.to_string(),
                };
            }
        };

        info!(
            conversation_id = %ctx.id(),
            incident_id = %incident.incident_id,
            contact = %contact,
            resolution = incident.resolution_tier,
            "Dispatching incident report"
        );

        match self.dispatcher.send(&contact, &incident.subject(), &body).await {
            DispatchOutcome::Delivered => IncidentOutcome::Delivered { contact },
            DispatchOutcome::Failed { reason } => IncidentOutcome::DeliveryFailed { contact, reason },
        }
    }

    /// Execute one tool command and render its result for the model.
    pub async fn handle(&self, ctx: &ConversationContext, command: ToolCommand) -> String {
        match command {
            ToolCommand::ConsultGuidelines(args) => self.consult_guidelines(&args.query).await,
            ToolCommand::SendIncidentNote(args) => self
                .file_incident(ctx, report_from_args(args))
                .await
                .to_string(),
            ToolCommand::SaveImageUrl(args) => self.save_image_url(ctx, &args.url).await,
            ToolCommand::UpdateLocation(args) => {
                match self.update_location(ctx, args.lat, args.lng).await {
                    Some(_) => LOCATION_UPDATED.to_string(),
                    None => INVALID_LOCATION.to_string(),
                }
            }
        }
    }
}

fn report_from_args(args: SendIncidentNoteArgs) -> IncidentReport {
    let coordinates = Coordinates::parse(&args.coordinates);
    if coordinates.is_none() && !args.coordinates.trim().is_empty() {
        warn!(coordinates = %args.coordinates, "Ignoring unparseable coordinates");
    }

    IncidentReport {
        incident_type: args.incident_type,
        city: args.city,
        address: args.location,
        casualties: args.casualties,
        details: args.details,
        recommended_service: args.recommended_service,
        coordinates,
        photo_summary: args.photo_summary,
    }
}
