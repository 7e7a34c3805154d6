pub mod codecheck;
pub mod engine;
pub mod front_matter;
pub mod layout;
pub mod markdown;
pub mod pipeline;

pub use crate::domain::model::{
    CodeBlock, CodeCheckMode, Document, FrontMatter, RenderResult, RenderedPage, SourceDoc,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
