use std::time::Instant;

use crate::config::{ConfigSnapshot, LanguageConfig};
use crate::error::GatewayError;

use super::context::RequestContext;
use super::stages::{AuthStage, LanguageStage, RoutingStage};
use super::traits::StageBox;

/// A request the pipeline refused, with the context as it stood at that point
#[derive(Debug)]
pub struct Halted {
    pub stage: &'static str,
    pub error: GatewayError,
    pub context: RequestContext,
}

/// Ordered stage list run for every proxied request
pub struct Pipeline {
    stages: Vec<StageBox>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Language validation, route resolution, then auth classification
    pub fn standard(language: LanguageConfig) -> Self {
        Self::new()
            .with_stage(Box::new(LanguageStage::new(language)))
            .with_stage(Box::new(RoutingStage))
            .with_stage(Box::new(AuthStage))
    }

    pub fn with_stage(mut self, stage: StageBox) -> Self {
        tracing::debug!("Registered pipeline stage '{}' at position {}", stage.name(), self.stages.len());
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first error.
    pub fn run(&self, mut ctx: RequestContext, snapshot: &ConfigSnapshot) -> Result<RequestContext, Halted> {
        let start = Instant::now();

        for stage in &self.stages {
            if let Err(error) = stage.apply(&mut ctx, snapshot) {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    stage = stage.name(),
                    elapsed = ?start.elapsed(),
                    "Pipeline halted"
                );
                return Err(Halted {
                    stage: stage.name(),
                    error,
                    context: ctx,
                });
            }
        }

        tracing::trace!(request_id = %ctx.request_id, elapsed = ?start.elapsed(), "Pipeline completed");
        Ok(ctx)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
