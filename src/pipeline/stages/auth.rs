use crate::auth::classify;
use crate::config::ConfigSnapshot;
use crate::error::GatewayError;
use crate::pipeline::context::{RequestContext, ResolvedIdentity};
use crate::pipeline::traits::Stage;

/// Classifies the caller for the resolved route. Requires the routing stage first.
pub struct AuthStage;

impl Stage for AuthStage {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn apply(&self, ctx: &mut RequestContext, snapshot: &ConfigSnapshot) -> Result<(), GatewayError> {
        let rule = ctx
            .route
            .clone()
            .ok_or_else(|| GatewayError::Internal("auth stage ran before a route was resolved".to_string()))?;

        let outcome = classify(
            rule.requires_auth,
            &rule.service,
            ctx.raw_authorization.as_deref(),
            &snapshot.credentials,
        );

        match ResolvedIdentity::try_from(outcome) {
            Ok(identity) => {
                ctx.identity = identity;
                Ok(())
            }
            Err(rejection) => {
                let error = GatewayError::from(rejection);
                tracing::warn!(
                    request_id = %ctx.request_id,
                    route = %rule.pattern,
                    service = %rule.service,
                    reason = %error_detail(&error),
                    "Request rejected by auth classification"
                );
                Err(error)
            }
        }
    }
}

// Internal reason for logs; clients only ever see the collapsed message.
fn error_detail(error: &GatewayError) -> String {
    match error {
        GatewayError::InvalidUserToken(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
