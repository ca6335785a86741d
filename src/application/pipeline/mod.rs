pub mod context;
pub mod stage;
pub mod stages;

pub use context::{ScanContext, UserConfigSnapshot};
pub use stage::{Pipeline, PipelineStage};
