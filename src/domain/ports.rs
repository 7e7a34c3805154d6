use crate::domain::model::{RenderResult, SourceDoc};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn list_files(
        &self,
        dir: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<String>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn site_title(&self) -> &str;
    fn base_url(&self) -> &str;
    fn content_dir(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn layouts_dir(&self) -> Option<&str>;
    fn default_layout(&self) -> &str;
    fn content_extensions(&self) -> &[String];
    fn include_drafts(&self) -> bool;
    fn single_file(&self) -> Option<&str>;
    fn code_check(&self) -> &str;
    fn index_limit(&self) -> usize;
    fn archive_enabled(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceDoc>>;
    async fn transform(&self, docs: Vec<SourceDoc>) -> Result<RenderResult>;
    async fn load(&self, result: RenderResult) -> Result<String>;
}
