pub mod formatter;
pub mod template;
pub mod view;
pub mod writer;

pub use template::{Template, TemplateSource, DEFAULT_TEMPLATE};
pub use view::ReportView;
pub use writer::{artifact_path, artifact_timestamp, ArtifactSummary, ArtifactWriter};
