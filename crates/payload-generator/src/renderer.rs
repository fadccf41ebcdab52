//! Compiled payload template.

use crate::error::GeneratorError;
use crate::helpers::register_helpers;
use crate::session::GenerationSession;
use handlebars::Handlebars;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const TEMPLATE_NAME: &str = "payload";

/// A template compiled once and rendered once per record.
///
/// Rendering takes `&self`, so one renderer can be shared across generator
/// threads; sequential fields stay consistent through the session registry.
pub struct PayloadRenderer {
    handlebars: Handlebars<'static>,
    session: Arc<GenerationSession>,
}

impl PayloadRenderer {
    /// Read and compile the template at `path`.
    pub fn from_file(
        path: impl AsRef<Path>,
        session: Arc<GenerationSession>,
    ) -> Result<Self, GeneratorError> {
        let path = path.as_ref();
        let template =
            std::fs::read_to_string(path).map_err(|source| GeneratorError::TemplateRead {
                path: path.display().to_string(),
                source,
            })?;
        debug!("Loaded payload template from {}", path.display());
        Self::from_template(&template, session)
    }

    /// Compile `template` directly.
    pub fn from_template(
        template: &str,
        session: Arc<GenerationSession>,
    ) -> Result<Self, GeneratorError> {
        let mut handlebars = Handlebars::new();
        // Payloads are JSON/text, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);
        register_helpers(&mut handlebars, &session);
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| GeneratorError::Template(e.to_string()))?;

        Ok(Self {
            handlebars,
            session,
        })
    }

    /// Render one payload.
    ///
    /// Sequential helpers advance even when a later helper in the same
    /// template fails.
    pub fn render(&self) -> Result<String, GeneratorError> {
        self.handlebars
            .render(TEMPLATE_NAME, &json!({}))
            .map_err(|e| GeneratorError::Render(e.to_string()))
    }

    pub fn session(&self) -> &Arc<GenerationSession> {
        &self.session
    }
}
