//! External AI collaborators and the calls made to them.
//!
//! Providers are opaque async services. This module owns what happens
//! around a call: validating and assembling the request, enforcing the
//! response ceiling, and handing back something the session can adopt.
//! Nothing here mutates the session; a timed-out or failed call leaves the
//! previous image and baseline authoritative.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::customization::{AnalysisPass, EditingSession};
use crate::errors::Service;
use crate::prelude::Result;
use crate::prompt::{check_free_text, render_prompt, EditInstruction};
use crate::types::{BaselineAnalysis, DesignState, ImageData};
use crate::Error;

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Image analysis service.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Full structural analysis of a cake image.
    async fn analyze(&self, image: &ImageData) -> Result<BaselineAnalysis>;

    /// Additive pass that fills in item coordinates for a prior analysis.
    async fn enrich_coordinates(
        &self,
        image: &ImageData,
        prior: &BaselineAnalysis,
    ) -> Result<BaselineAnalysis>;
}

/// Image regeneration service.
#[async_trait]
pub trait RenderProvider: Send + Sync {
    async fn render(
        &self,
        source: &ImageData,
        references: &[ImageData],
        prompt: &str,
    ) -> Result<ImageData>;
}

/// Run one analysis pass under a response ceiling.
pub async fn run_analysis(
    provider: &dyn AnalysisProvider,
    image: &ImageData,
    pass: AnalysisPass,
    prior: Option<&BaselineAnalysis>,
    timeout: Duration,
) -> Result<BaselineAnalysis> {
    let call = async {
        match pass {
            AnalysisPass::Full => provider.analyze(image).await,
            AnalysisPass::Coordinates => {
                let prior = prior.ok_or(Error::MissingState("prior analysis"))?;
                let enriched = provider.enrich_coordinates(image, prior).await?;
                if !prior.same_structure(&enriched) {
                    warn!(
                        target: "cake_customizer::providers",
                        "Coordinate pass changed more than coordinates"
                    );
                }
                Ok(enriched)
            }
        }
    };
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(target: "cake_customizer::providers", ?pass, ?timeout, "Analysis timed out");
            Err(Error::timeout(Service::Analysis, timeout))
        }
    }
}

/// A validated render call, ready to send.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub source: ImageData,
    pub references: Vec<ImageData>,
    pub instructions: Vec<EditInstruction>,
    pub prompt: String,
    /// State the prompt was synthesized from.
    pub rendered: DesignState,
}

impl RenderRequest {
    /// Check the free text, synthesize the prompt and collect references.
    ///
    /// Fails synchronously, before any provider call, on a policy violation.
    /// `three_tier_reference` is attached only when the cake has three tiers.
    pub fn prepare(
        session: &EditingSession,
        source: ImageData,
        three_tier_reference: Option<ImageData>,
    ) -> Result<Self> {
        let state = session.state();
        check_free_text(&state.free_text)?;
        let instructions = session.synthesize_prompt()?;
        let prompt = render_prompt(&instructions);

        let mut references = state.replacement_images();
        if state.cake_info.cake_type.tier_count() == 3 {
            references.extend(three_tier_reference);
        }

        Ok(Self {
            source,
            references,
            instructions,
            prompt,
            rendered: state.clone(),
        })
    }

    /// Await the render under `timeout`.
    pub async fn send(self, provider: &dyn RenderProvider, timeout: Duration) -> Result<RenderOutcome> {
        info!(
            target: "cake_customizer::providers",
            instructions = self.instructions.len(),
            references = self.references.len(),
            "Requesting render"
        );
        let call = provider.render(&self.source, &self.references, &self.prompt);
        let image = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(target: "cake_customizer::providers", ?timeout, "Render timed out");
                return Err(Error::timeout(Service::Render, timeout));
            }
        };
        Ok(RenderOutcome {
            image,
            prompt: self.prompt,
            instructions: self.instructions,
            rendered: self.rendered,
        })
    }
}

/// A successful render, to be adopted with [`EditingSession::accept_render`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderOutcome {
    pub image: ImageData,
    pub prompt: String,
    pub instructions: Vec<EditInstruction>,
    pub rendered: DesignState,
}

/// Prepare and send a render for the session's current state.
pub async fn render_design(
    session: &EditingSession,
    provider: &dyn RenderProvider,
    source: ImageData,
    timeout: Duration,
) -> Result<RenderOutcome> {
    RenderRequest::prepare(session, source, None)?
        .send(provider, timeout)
        .await
}
