use crate::config::ConfigSnapshot;
use crate::error::GatewayError;
use crate::gateway::route_table::normalize_path;
use crate::pipeline::context::RequestContext;
use crate::pipeline::traits::Stage;

/// Resolves the route rule; the auth stage needs it to know whether auth applies.
pub struct RoutingStage;

impl Stage for RoutingStage {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn apply(&self, ctx: &mut RequestContext, snapshot: &ConfigSnapshot) -> Result<(), GatewayError> {
        let not_found = || GatewayError::NoRouteFound {
            method: ctx.method.to_string(),
            path: ctx.path.clone(),
        };

        let path = normalize_path(&ctx.path).ok_or_else(not_found)?;
        let rule = snapshot.routes.resolve(&ctx.method, &path).ok_or_else(not_found)?;

        ctx.normalized_path = Some(path);
        ctx.route = Some(rule);
        Ok(())
    }
}
