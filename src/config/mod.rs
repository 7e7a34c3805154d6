pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::CodeCheckMode;
#[cfg(feature = "cli")]
use crate::utils::error::{PressError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const ALLOWED_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "small-press")]
#[command(about = "A small static renderer for markdown posts with front matter")]
pub struct CliConfig {
    #[arg(long, default_value = "./content")]
    pub content_dir: String,

    #[arg(long, default_value = "./site")]
    pub output_dir: String,

    #[arg(long, default_value = "Notes")]
    pub site_title: String,

    #[arg(long, default_value = "/")]
    pub base_url: String,

    #[arg(long, help = "Directory of <name>.html layout overrides")]
    pub layouts_dir: Option<String>,

    #[arg(long, default_value = "post")]
    pub default_layout: String,

    #[arg(long, value_delimiter = ',', default_values_t = [String::from("md"), String::from("markdown")])]
    pub extensions: Vec<String>,

    #[arg(long, help = "Render drafts too")]
    pub drafts: bool,

    #[arg(long, help = "Build a single content file by name")]
    pub single: Option<String>,

    #[arg(long, default_value = "warn", help = "Fenced code validation: off, warn or strict")]
    pub code_check: String,

    #[arg(long, default_value = "20", help = "Number of posts on the index page")]
    pub index_limit: usize,

    #[arg(long, help = "Skip the site.zip archive")]
    pub no_archive: bool,

    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, help = "Show what would be built without writing anything")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON instead of human-readable lines")]
    pub log_json: bool,

    #[arg(long, help = "Log per-phase CPU and memory stats")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn site_title(&self) -> &str {
        &self.site_title
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn content_dir(&self) -> &str {
        &self.content_dir
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn layouts_dir(&self) -> Option<&str> {
        self.layouts_dir.as_deref()
    }

    fn default_layout(&self) -> &str {
        &self.default_layout
    }

    fn content_extensions(&self) -> &[String] {
        &self.extensions
    }

    fn include_drafts(&self) -> bool {
        self.drafts
    }

    fn single_file(&self) -> Option<&str> {
        self.single.as_deref()
    }

    fn code_check(&self) -> &str {
        &self.code_check
    }

    fn index_limit(&self) -> usize {
        self.index_limit
    }

    fn archive_enabled(&self) -> bool {
        !self.no_archive
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("site_title", &self.site_title)?;
        validation::validate_base_url("base_url", &self.base_url)?;
        validation::validate_path("content_dir", &self.content_dir)?;
        validation::validate_path("output_dir", &self.output_dir)?;
        if let Some(dir) = &self.layouts_dir {
            validation::validate_path("layouts_dir", dir)?;
        }
        if self.extensions.is_empty() {
            return Err(PressError::MissingConfigError {
                field: "extensions".to_string(),
            });
        }
        validation::validate_file_extensions("extensions", &self.extensions, ALLOWED_EXTENSIONS)?;
        validation::validate_choice("code_check", &self.code_check, &CodeCheckMode::CHOICES)?;
        validation::validate_positive_number("index_limit", self.index_limit, 1)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn base_config() -> CliConfig {
        CliConfig::parse_from(["small-press"])
    }

    #[test]
    fn test_default_cli_config_is_valid() {
        let config = base_config();

        assert!(config.validate().is_ok());
        assert_eq!(config.content_dir(), "./content");
        assert_eq!(config.code_check(), "warn");
        assert!(config.archive_enabled());
    }

    #[test]
    fn test_invalid_code_check_rejected() {
        let mut config = base_config();
        config.code_check = "loud".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let mut config = base_config();
        config.extensions = vec!["rst".to_string()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_extensions_rejected() {
        let mut config = base_config();
        config.extensions.clear();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, PressError::MissingConfigError { .. }));
    }

    #[test]
    fn test_flags_map_to_provider() {
        let config = CliConfig::parse_from([
            "small-press",
            "--single",
            "2013-09-28-scoped-object.md",
            "--drafts",
            "--no-archive",
            "--code-check",
            "strict",
        ]);

        assert_eq!(config.single_file(), Some("2013-09-28-scoped-object.md"));
        assert!(config.include_drafts());
        assert!(!config.archive_enabled());
        assert_eq!(config.code_check(), "strict");
    }
}
