//! Node type definitions and the template engine
//!
//! A node type ([`NodeFormat`]) owns an ordered field table plus compiled
//! title and output-line templates. Template text embeds field references
//! of the form `{*name*}`; compilation is context free and resolution
//! against the field table happens at render time, so formats can safely
//! carry references to fields that do not exist yet (they pass through as
//! literal text).

pub mod field;
pub mod node_format;
pub mod registry;
pub mod template;

pub use field::{FieldDef, FieldKind};
pub use node_format::{NodeFormat, DEFAULT_FIELD_NAME, DEFAULT_OUTPUT_SEPARATOR};
pub use registry::{FormatChanges, FormatRegistry, FormatScratch, DEFAULT_TYPE_NAME};
pub use template::{FieldModifier, FieldTemplate, RenderedLine, TemplateToken};
