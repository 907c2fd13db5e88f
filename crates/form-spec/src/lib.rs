#![allow(missing_docs)]

pub mod assemble;
pub mod bind;
pub mod document;
pub mod error;
pub mod markup;
pub mod node;
pub mod plan;
pub mod render;
pub mod rendered;
pub mod schema;
pub mod spec;
pub mod template;
pub mod validate;

pub use assemble::{FormAssembler, ROOT_ID, build};
pub use bind::{ControlRef, IMAGE_CLONE_ATTRIBUTE};
pub use document::Document;
pub use error::ConfigError;
pub use node::{NodeFactory, NodeId, Selector};
pub use plan::{Diagnostic, FieldStrategy, Layout, RenderPlan, SkipReason};
pub use render::fields::{IMAGE_FOR_ATTRIBUTE, IMAGE_SOURCE_ATTRIBUTE, TEMPLATE_FOR_ATTRIBUTE};
pub use render::sections::TARGET_ATTRIBUTE;
pub use rendered::RenderedForm;
pub use schema::config_schema;
pub use spec::{
    ButtonConfig, Content, FieldConfig, FieldKind, FormConfig, OptionConfig, SectionConfig,
    TitleBlock, TitleConfig,
};
pub use template::{
    DirTemplates, FetchError, PENDING_ATTRIBUTE, StaticTemplates, TemplateError, TemplateFetcher,
    TemplateOutcome, TemplateReport, TemplateRequest, TemplateStatus, TemplateTask,
};
pub use validate::{parse_config, validate};
