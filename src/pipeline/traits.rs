use crate::config::ConfigSnapshot;
use crate::error::GatewayError;

use super::context::RequestContext;

/// One step of the request pipeline.
///
/// Stages are synchronous and must not perform I/O; everything they read
/// comes from the context or the immutable configuration snapshot.
pub trait Stage: Send + Sync {
    /// Stage name for logging and debugging
    fn name(&self) -> &'static str;

    /// Refine `ctx`, or return the terminal error for this request
    fn apply(&self, ctx: &mut RequestContext, snapshot: &ConfigSnapshot) -> Result<(), GatewayError>;
}

pub type StageBox = Box<dyn Stage>;
