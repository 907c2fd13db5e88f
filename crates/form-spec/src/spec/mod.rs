pub mod button;
pub mod field;
pub mod form;
mod lenient;
pub mod section;

pub use button::ButtonConfig;
pub use field::{Content, FieldConfig, FieldKind, OptionConfig};
pub use form::{DEFAULT_STOP_IMAGE_CLASS, FormConfig, TitleBlock, TitleConfig};
pub use section::SectionConfig;
