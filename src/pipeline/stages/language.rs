use crate::config::{ConfigSnapshot, LanguageConfig};
use crate::error::GatewayError;
use crate::pipeline::context::RequestContext;
use crate::pipeline::traits::Stage;

/// Normalise a locale header value against the allow-list.
///
/// Absent or blank -> default language. `HI`, `hi-IN` and `hi_IN` all become `hi`.
pub fn normalize_language(raw: Option<&str>, config: &LanguageConfig) -> Result<String, GatewayError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(config.default_language.clone()),
        Some(value) => value,
    };

    let primary = value
        .split(['-', '_'])
        .next()
        .unwrap_or(value)
        .to_ascii_lowercase();

    if config.supported.iter().any(|lang| *lang == primary) {
        Ok(primary)
    } else {
        Err(GatewayError::InvalidLanguage {
            value: value.to_string(),
            supported: config.supported.clone(),
        })
    }
}

pub struct LanguageStage {
    config: LanguageConfig,
}

impl LanguageStage {
    pub fn new(config: LanguageConfig) -> Self {
        Self { config }
    }
}

impl Stage for LanguageStage {
    fn name(&self) -> &'static str {
        "language"
    }

    fn apply(&self, ctx: &mut RequestContext, _snapshot: &ConfigSnapshot) -> Result<(), GatewayError> {
        let language = normalize_language(ctx.raw_language.as_deref(), &self.config)?;
        ctx.normalized_language = Some(language);
        Ok(())
    }
}
