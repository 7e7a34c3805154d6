use thiserror::Error;

#[derive(Error, Debug)]
pub enum PressError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Front matter error in {path}: {message}")]
    FrontMatterError { path: String, message: String },

    #[error("Render error in {path}: {message}")]
    RenderError { path: String, message: String },

    #[error("Code check failed in {path}: {message}")]
    CodeCheckError { path: String, message: String },

    #[error("Build lock held at {path}: {message}")]
    BuildLockError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Content,
    Render,
    Storage,
    System,
}

impl PressError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 輸出目錄被其他建置鎖定，稍後重試即可
            PressError::BuildLockError { .. } => ErrorSeverity::Medium,
            PressError::FrontMatterError { .. }
            | PressError::RenderError { .. }
            | PressError::CodeCheckError { .. }
            | PressError::ProcessingError { .. } => ErrorSeverity::High,
            PressError::ConfigError { .. }
            | PressError::ConfigValidationError { .. }
            | PressError::InvalidConfigValueError { .. }
            | PressError::MissingConfigError { .. } => ErrorSeverity::High,
            PressError::IoError(_) | PressError::ZipError(_) | PressError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PressError::ConfigError { .. }
            | PressError::ConfigValidationError { .. }
            | PressError::InvalidConfigValueError { .. }
            | PressError::MissingConfigError { .. } => ErrorCategory::Config,
            PressError::FrontMatterError { .. } | PressError::CodeCheckError { .. } => {
                ErrorCategory::Content
            }
            PressError::RenderError { .. } | PressError::ProcessingError { .. } => {
                ErrorCategory::Render
            }
            PressError::IoError(_) | PressError::ZipError(_) | PressError::BuildLockError { .. } => {
                ErrorCategory::Storage
            }
            PressError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PressError::FrontMatterError { path, message } => {
                format!("The front matter of '{}' could not be parsed: {}", path, message)
            }
            PressError::RenderError { path, message } => {
                format!("'{}' could not be rendered to HTML: {}", path, message)
            }
            PressError::CodeCheckError { path, message } => {
                format!("A code illustration in '{}' failed validation: {}", path, message)
            }
            PressError::BuildLockError { path, .. } => {
                format!("Another build is writing to '{}'", path)
            }
            PressError::ConfigError { message }
            | PressError::ConfigValidationError { message, .. } => {
                format!("Configuration problem: {}", message)
            }
            PressError::InvalidConfigValueError { field, value, .. } => {
                format!("Configuration value '{}' is not valid for {}", value, field)
            }
            PressError::MissingConfigError { field } => {
                format!("Configuration is missing '{}'", field)
            }
            other => format!("{}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PressError::FrontMatterError { .. } => {
                "Check that the front matter block starts and ends with '---' (or '+++') and contains key: value lines".to_string()
            }
            PressError::CodeCheckError { .. } => {
                "Fix the fenced code block, or lower --code-check to 'warn'".to_string()
            }
            PressError::RenderError { .. } => {
                "Check the front matter values of the named file".to_string()
            }
            PressError::BuildLockError { .. } => {
                "Wait for the running build to finish, or remove a stale .press-lock file".to_string()
            }
            PressError::ConfigError { .. }
            | PressError::ConfigValidationError { .. }
            | PressError::InvalidConfigValueError { .. }
            | PressError::MissingConfigError { .. } => {
                "Review the site.toml / CLI flags against the documented configuration keys".to_string()
            }
            PressError::IoError(_) => {
                "Check that the content directory exists and the output directory is writable".to_string()
            }
            PressError::ZipError(_) => "Disable the archive output and rebuild".to_string(),
            _ => "Re-run with --verbose for details".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PressError>;
