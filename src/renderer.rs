//! Template renderer and rendering functionality for kiln.
//! Wraps a MiniJinja environment whose loader resolves `extends`/`include`
//! names through the packaged resource loaders.
use crate::context::Context;
use crate::error::{Error, Result};
use crate::resources::{Resource, ResourceLoader};
use cruet::Inflector;
use minijinja::{Environment, ErrorKind};
use std::fmt;
use std::sync::Arc;

/// Trait for template rendering engines.
pub trait TemplateRenderer: Send + Sync {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &Context) -> Result<String>;

    /// Loads a packaged resource through the same loaders templates inherit from.
    fn load_resource(&self, resource: &Resource) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
    resources: Arc<dyn ResourceLoader>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer resolving resources through `resources`.
    pub fn new(resources: Arc<dyn ResourceLoader>) -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_filter("snake_case", |value: String| value.to_snake_case());
        env.add_filter("kebab_case", |value: String| value.to_kebab_case());
        env.add_filter("pascal_case", |value: String| value.to_pascal_case());
        env.add_filter("camel_case", |value: String| value.to_camel_case());

        let loader = Arc::clone(&resources);
        env.set_loader(move |name| {
            let Ok(resource) = Resource::new(name) else {
                return Ok(None);
            };
            match loader.load(&resource) {
                Ok(source) => Ok(Some(source)),
                Err(Error::TemplateNotFound { .. }) => Ok(None),
                Err(e) => Err(minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string())),
            }
        });

        Self { env, resources }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new(Arc::new(crate::recipes::builtin_resources()))
    }
}

impl fmt::Debug for MiniJinjaRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaRenderer").finish_non_exhaustive()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if the template extends or includes an unknown resource
    /// * `Error::MinijinjaError` for any other compile or render failure
    fn render(&self, template: &str, context: &Context) -> Result<String> {
        self.env.render_str(template, context).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                Error::TemplateNotFound {
                    reference: e.detail().unwrap_or("<unknown>").to_string(),
                }
            } else {
                Error::MinijinjaError(e)
            }
        })
    }

    fn load_resource(&self, resource: &Resource) -> Result<String> {
        self.resources.load(resource)
    }
}

/// True if `value` carries template syntax (`{{ }}` or `{% %}`).
pub fn is_template(value: &str) -> bool {
    (value.contains("{{") && value.contains("}}")) || (value.contains("{%") && value.contains("%}"))
}

/// A string known to contain template syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStr(String);

impl TemplateStr {
    /// Wraps `value`, failing if it has no template syntax.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if is_template(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidTemplateStr { value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the template with `context` as the substitution scope.
    pub fn render(&self, renderer: &dyn TemplateRenderer, context: &Context) -> Result<String> {
        renderer.render(&self.0, context)
    }
}

impl fmt::Display for TemplateStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::EmbeddedResources;
    use serde_json::json;

    fn context(value: serde_json::Value) -> Context {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Context::new(),
        }
    }

    #[test]
    fn test_template_str_detection() {
        assert!(TemplateStr::new("{{ name }}").is_ok());
        assert!(TemplateStr::new("{% if x %}a{% endif %}").is_ok());
        assert!(matches!(
            TemplateStr::new("plain.txt"),
            Err(Error::InvalidTemplateStr { .. })
        ));
        assert!(!is_template("{{ unclosed"));
    }

    #[test]
    fn test_extends_through_resources() {
        let resources = EmbeddedResources::new()
            .with("base", "page.txt", "[{% block body %}{% endblock %}]");
        let renderer = MiniJinjaRenderer::new(Arc::new(resources));
        let rendered = renderer
            .render(
                "{% extends 'base:page.txt' %}{% block body %}{{ x }}{% endblock %}",
                &context(json!({"x": 1})),
            )
            .unwrap();
        assert_eq!(rendered, "[1]");
    }

    #[test]
    fn test_missing_parent_is_template_not_found() {
        let renderer = MiniJinjaRenderer::new(Arc::new(EmbeddedResources::new()));
        let result = renderer.render("{% extends 'base:missing.txt' %}", &Context::new());
        assert!(matches!(result, Err(Error::TemplateNotFound { .. })));
    }

    #[test]
    fn test_case_filters() {
        let renderer = MiniJinjaRenderer::new(Arc::new(EmbeddedResources::new()));
        let rendered = renderer
            .render("{{ name | snake_case }}", &context(json!({"name": "My Package"})))
            .unwrap();
        assert_eq!(rendered, "my_package");
    }
}
