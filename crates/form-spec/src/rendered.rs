use futures::future::join_all;
use serde_json::Value;

use crate::document::Document;
use crate::node::{NodeFactory, NodeId};
use crate::plan::Diagnostic;
use crate::render::sections::ComposedSections;
use crate::spec::form::FormConfig;
use crate::template::{
    TemplateOutcome, TemplateReport, TemplateRequest, TemplateStatus, TemplateTask, apply_outcome,
};

/// The tree produced by [`FormAssembler`](crate::FormAssembler).
///
/// Its shape is fixed once built; only values, attributes, option lists,
/// image clones and template slots change afterwards.
#[derive(Debug)]
pub struct RenderedForm<F: NodeFactory = Document> {
    pub(crate) factory: F,
    pub(crate) config: FormConfig,
    pub(crate) root: NodeId,
    pub(crate) title: NodeId,
    pub(crate) navigation: Option<NodeId>,
    pub(crate) form: NodeId,
    pub(crate) sections: ComposedSections,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) templates: Vec<TemplateTask>,
    pub(crate) unavailable: Vec<TemplateRequest>,
}

impl<F: NodeFactory> RenderedForm<F> {
    /// Parent node holding the title, the navigation menu and the form.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read-only snapshot of the configuration the form was built from.
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn title(&self) -> NodeId {
        self.title
    }

    /// Navigation menu, present only for sectioned forms.
    pub fn navigation(&self) -> Option<NodeId> {
        self.navigation
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    pub fn sections(&self) -> &[NodeId] {
        &self.sections.sections
    }

    pub fn nav_entries(&self) -> &[NodeId] {
        &self.sections.nav_entries
    }

    /// Descriptors that were skipped while building.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Mutable access for the interaction layer (visibility toggling etc).
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn into_factory(self) -> F {
        self.factory
    }

    /// Number of template fetches issued but not yet taken or settled.
    pub fn pending_templates(&self) -> usize {
        self.templates.len()
    }

    /// Hands the outstanding template tasks to the caller, who applies each
    /// outcome with [`apply_template`](Self::apply_template).
    pub fn take_template_tasks(&mut self) -> Vec<TemplateTask> {
        std::mem::take(&mut self.templates)
    }

    /// Fills the slot the outcome was issued for. Failed fetches leave the
    /// slot pending.
    pub fn apply_template(&mut self, outcome: TemplateOutcome) -> TemplateReport {
        apply_outcome(&mut self.factory, outcome)
    }

    /// Waits for every outstanding template fetch and applies the results.
    ///
    /// Fields that could not be fetched because no fetcher was configured are
    /// reported as [`TemplateStatus::Unavailable`].
    pub async fn settle_templates(&mut self) -> Vec<TemplateReport> {
        let tasks = self.take_template_tasks();
        let outcomes = join_all(tasks.into_iter().map(TemplateTask::resolve)).await;
        let mut reports = outcomes
            .into_iter()
            .map(|outcome| self.apply_template(outcome))
            .collect::<Vec<_>>();
        reports.extend(
            self.unavailable
                .iter()
                .map(|request| TemplateReport::new(request, TemplateStatus::Unavailable)),
        );
        reports
    }
}

impl RenderedForm<Document> {
    pub fn to_html(&self) -> String {
        self.factory.to_html(self.root)
    }

    pub fn to_json(&self) -> Value {
        self.factory.to_json(self.root)
    }
}
