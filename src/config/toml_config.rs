use crate::config::ALLOWED_EXTENSIONS;
use crate::core::ConfigProvider;
use crate::domain::model::CodeCheckMode;
use crate::utils::error::{PressError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub site: SiteConfig,
    pub content: ContentConfig,
    pub render: Option<RenderConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    pub dir: String,
    pub extensions: Option<Vec<String>>,
    pub include_drafts: Option<bool>,
    pub single_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub default_layout: Option<String>,
    pub layouts_dir: Option<String>,
    pub code_check: Option<String>,
    pub index_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    pub archive: Option<bool>,
}

const DEFAULT_EXTENSIONS: [&str; 2] = ["md", "markdown"];

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PressError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: TomlConfig =
            toml::from_str(&processed_content).map_err(|e| PressError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        if config.content.extensions.is_none() {
            config.content.extensions =
                Some(DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect());
        }

        Ok(config)
    }

    /// 替換環境變數 (例如 ${SITE_TITLE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PressError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("site.title", &self.site.title)?;

        if let Some(base_url) = &self.site.base_url {
            validation::validate_base_url("site.base_url", base_url)?;
        }

        validation::validate_path("content.dir", &self.content.dir)?;
        validation::validate_path("output.dir", &self.output.dir)?;

        if let Some(extensions) = &self.content.extensions {
            // 空清單會讓所有來源檔都被濾掉
            if extensions.is_empty() {
                return Err(PressError::MissingConfigError {
                    field: "content.extensions".to_string(),
                });
            }
            validation::validate_file_extensions(
                "content.extensions",
                extensions,
                ALLOWED_EXTENSIONS,
            )?;
        }

        if let Some(render) = &self.render {
            if let Some(layouts_dir) = &render.layouts_dir {
                validation::validate_path("render.layouts_dir", layouts_dir)?;
            }
            if let Some(code_check) = &render.code_check {
                validation::validate_choice(
                    "render.code_check",
                    code_check,
                    &CodeCheckMode::CHOICES,
                )?;
            }
            if let Some(index_limit) = render.index_limit {
                validation::validate_positive_number("render.index_limit", index_limit, 1)?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn site_title(&self) -> &str {
        &self.site.title
    }

    fn base_url(&self) -> &str {
        self.site.base_url.as_deref().unwrap_or("/")
    }

    fn content_dir(&self) -> &str {
        &self.content.dir
    }

    fn output_dir(&self) -> &str {
        &self.output.dir
    }

    fn layouts_dir(&self) -> Option<&str> {
        self.render.as_ref().and_then(|r| r.layouts_dir.as_deref())
    }

    fn default_layout(&self) -> &str {
        self.render
            .as_ref()
            .and_then(|r| r.default_layout.as_deref())
            .unwrap_or("post")
    }

    fn content_extensions(&self) -> &[String] {
        self.content.extensions.as_deref().unwrap_or(&[])
    }

    fn include_drafts(&self) -> bool {
        self.content.include_drafts.unwrap_or(false)
    }

    fn single_file(&self) -> Option<&str> {
        self.content.single_file.as_deref()
    }

    fn code_check(&self) -> &str {
        self.render
            .as_ref()
            .and_then(|r| r.code_check.as_deref())
            .unwrap_or("warn")
    }

    fn index_limit(&self) -> usize {
        self.render
            .as_ref()
            .and_then(|r| r.index_limit)
            .unwrap_or(20)
    }

    fn archive_enabled(&self) -> bool {
        self.output.archive.unwrap_or(true)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
