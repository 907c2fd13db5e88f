//! Asynchronous template loading for templated fields.
//!
//! Each templated field yields one [`TemplateTask`]. Tasks own their fetch
//! future and never borrow the tree, so they can be awaited in any order and
//! their outcomes applied afterwards through
//! [`RenderedForm::apply_template`](crate::RenderedForm::apply_template).

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use futures::future::{self, BoxFuture, FutureExt};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::markup::build_fragment;
use crate::node::{NodeFactory, NodeId};

/// Attribute marking a slot whose template has not been applied yet.
pub const PENDING_ATTRIBUTE: &str = "data-template-pending";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("failed to read template '{path}': {message}")]
    Io { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("template render failed: {0}")]
    Render(String),
}

/// Retrieves template markup for a resolved path.
pub trait TemplateFetcher: Send + Sync {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>>;
}

/// Templates held in memory, keyed by resolved path.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    entries: HashMap<String, String>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, markup: impl Into<String>) {
        self.entries.insert(path.into(), markup.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, M: Into<String>> FromIterator<(P, M)> for StaticTemplates {
    fn from_iter<I: IntoIterator<Item = (P, M)>>(iter: I) -> Self {
        let mut templates = StaticTemplates::new();
        for (path, markup) in iter {
            templates.insert(path, markup);
        }
        templates
    }
}

impl TemplateFetcher for StaticTemplates {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>> {
        let result = self
            .entries
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()));
        future::ready(result).boxed()
    }
}

/// Templates read from a directory; resolved paths are taken relative to it
/// and may not step outside it.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateFetcher for DirTemplates {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes_root = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        let file = self.root.join(relative);
        let path = path.to_string();
        async move {
            if escapes_root {
                warn!(path = %path, "template path leaves the template directory");
                return Err(FetchError::NotFound(path));
            }
            if !file.is_file() {
                return Err(FetchError::NotFound(path));
            }
            fs::read_to_string(&file).map_err(|err| FetchError::Io {
                path,
                message: err.to_string(),
            })
        }
        .boxed()
    }
}

/// Everything needed to fill one templated field once its markup arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRequest {
    pub field: String,
    pub path: String,
    pub slot: NodeId,
    /// Values substituted into the template (`label`, `name`, `id`, `class`
    /// and the field's pass-through attributes).
    pub context: Value,
}

impl TemplateRequest {
    fn class(&self) -> Option<&str> {
        self.context
            .get("class")
            .and_then(Value::as_str)
            .filter(|class| !class.is_empty())
    }
}

/// An issued template fetch for one field.
pub struct TemplateTask {
    request: TemplateRequest,
    fetch: BoxFuture<'static, Result<String, FetchError>>,
}

impl TemplateTask {
    pub(crate) fn issue(request: TemplateRequest, fetcher: &dyn TemplateFetcher) -> Self {
        debug!(field = %request.field, path = %request.path, "issuing template fetch");
        let fetch = fetcher.fetch(&request.path);
        Self { request, fetch }
    }

    pub fn request(&self) -> &TemplateRequest {
        &self.request
    }

    pub async fn resolve(self) -> TemplateOutcome {
        let markup = self.fetch.await;
        TemplateOutcome {
            request: self.request,
            markup,
        }
    }
}

impl std::fmt::Debug for TemplateTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateTask")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// A finished fetch, ready to be applied to the tree.
#[derive(Debug, Clone)]
pub struct TemplateOutcome {
    pub request: TemplateRequest,
    pub markup: Result<String, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum TemplateStatus {
    Settled,
    Failed(String),
    /// No fetcher was configured when the form was built.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateReport {
    pub field: String,
    pub path: String,
    pub status: TemplateStatus,
}

impl TemplateReport {
    pub(crate) fn new(request: &TemplateRequest, status: TemplateStatus) -> Self {
        Self {
            field: request.field.clone(),
            path: request.path.clone(),
            status,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status == TemplateStatus::Settled
    }
}

/// Renders fetched markup with the field's substitution context.
pub fn render_markup(source: &str, context: &Value) -> Result<String, TemplateError> {
    let handlebars = Handlebars::new();
    handlebars
        .render_template(source, context)
        .map_err(|err| TemplateError::Render(err.to_string()))
}

/// Parses the outcome's markup into nodes under its slot; the field class goes
/// on the first element. Only that slot is touched.
pub(crate) fn apply_outcome<F: NodeFactory>(
    factory: &mut F,
    outcome: TemplateOutcome,
) -> TemplateReport {
    let TemplateOutcome { request, markup } = outcome;
    let rendered = markup
        .map_err(TemplateError::from)
        .and_then(|source| render_markup(&source, &request.context));

    match rendered {
        Ok(html) => {
            let nodes = build_fragment(factory, &html);
            if let Some(class) = request.class()
                && let Some(first) = nodes.iter().find(|node| factory.tag(**node).is_some())
            {
                for class in class.split_whitespace() {
                    factory.add_class(*first, class);
                }
            }
            for node in nodes {
                factory.append(request.slot, node);
            }
            factory.remove_attribute(request.slot, PENDING_ATTRIBUTE);
            debug!(field = %request.field, "template applied");
            TemplateReport::new(&request, TemplateStatus::Settled)
        }
        Err(err) => {
            warn!(field = %request.field, path = %request.path, error = %err, "template left pending");
            TemplateReport::new(&request, TemplateStatus::Failed(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn static_templates_report_missing_paths() {
        let templates = StaticTemplates::from_iter([("a.hbs", "<p>a</p>")]);
        assert_eq!(block_on(templates.fetch("a.hbs")).as_deref(), Ok("<p>a</p>"));
        assert_eq!(
            block_on(templates.fetch("b.hbs")),
            Err(FetchError::NotFound("b.hbs".into()))
        );
    }

    #[test]
    fn dir_templates_read_relative_to_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir_all(dir.path().join("fields")).expect("mkdir");
        fs::write(dir.path().join("fields/city.hbs"), "<input name=\"{{name}}\">").expect("write");

        let templates = DirTemplates::new(dir.path());
        let markup = block_on(templates.fetch("/fields/city.hbs")).expect("markup");
        assert_eq!(markup, "<input name=\"{{name}}\">");
    }

    #[test]
    fn dir_templates_refuse_paths_outside_root() {
        let outer = tempfile::tempdir().expect("temp dir");
        fs::write(outer.path().join("secret.txt"), "secret").expect("write");
        let root = outer.path().join("templates");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(root.join("ok.hbs"), "<p>ok</p>").expect("write");

        let templates = DirTemplates::new(&root);
        assert_eq!(
            block_on(templates.fetch("/../secret.txt")),
            Err(FetchError::NotFound("/../secret.txt".into()))
        );
        assert_eq!(
            block_on(templates.fetch("fields/../../secret.txt")),
            Err(FetchError::NotFound("fields/../../secret.txt".into()))
        );
        assert_eq!(block_on(templates.fetch("/./ok.hbs")).as_deref(), Ok("<p>ok</p>"));
    }

    #[test]
    fn markup_substitutes_label() {
        let html = render_markup("<label>{{label}}</label>", &json!({ "label": "City" }))
            .expect("render");
        assert_eq!(html, "<label>City</label>");
    }
}
