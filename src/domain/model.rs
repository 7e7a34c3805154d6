use crate::utils::error::PressError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed front matter. Typed fields cover the keys the renderer acts on;
/// `raw` keeps every key→value pair exactly as written so callers can query
/// metadata without alteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub draft: bool,
    pub raw: BTreeMap<String, String>,
}

impl FrontMatter {
    /// 從原始 key→value 對建立型別化視圖；raw 內容原封不動保留
    pub fn from_raw(raw: BTreeMap<String, String>) -> Self {
        let layout = raw.get("layout").cloned();
        let title = raw.get("title").cloned();
        let date = raw.get("date").and_then(|v| parse_date_value(v));
        let categories = raw.get("categories").map(|v| split_list(v)).unwrap_or_default();
        let tags = raw.get("tags").map(|v| split_list(v)).unwrap_or_default();
        let draft = raw
            .get("draft")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            layout,
            title,
            date,
            categories,
            tags,
            draft,
            raw,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn parse_date_value(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    // 允許帶時間的日期值，只取前段
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn split_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'));

    match inner {
        Some(inner) => inner
            .split(',')
            .map(|item| item.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        None => trimmed
            .split_whitespace()
            .map(|item| item.to_string())
            .collect(),
    }
}

/// 讀入但尚未解析的來源檔
#[derive(Debug, Clone)]
pub struct SourceDoc {
    pub path: String,
    pub text: String,
}

/// A parsed content document: front matter plus markdown body, with slug and
/// date resolved from the `YYYY-MM-DD-slug.md` filename convention when the
/// front matter omits them.
#[derive(Debug, Clone)]
pub struct Document {
    pub source_path: String,
    pub slug: String,
    pub date: Option<NaiveDate>,
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Document {
    pub fn assemble(source_path: &str, front_matter: FrontMatter, body: String) -> Self {
        let stem = Path::new(source_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");
        let (file_date, file_slug) = split_dated_stem(stem);

        let date = front_matter.date.or(file_date);
        let slug = front_matter
            .get("slug")
            .map(|s| s.to_string())
            .unwrap_or_else(|| file_slug.to_string());

        Self {
            source_path: source_path.to_string(),
            slug,
            date,
            front_matter,
            body,
        }
    }

    pub fn title(&self) -> &str {
        self.front_matter.title.as_deref().unwrap_or(&self.slug)
    }
}

fn split_dated_stem(stem: &str) -> (Option<NaiveDate>, &str) {
    if let (Some(prefix), Some(rest)) = (stem.get(..10), stem.get(10..)) {
        if let Some(slug) = rest.strip_prefix('-') {
            if !slug.is_empty() {
                if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                    return (Some(date), slug);
                }
            }
        }
    }
    (None, stem)
}

/// 渲染過程中收集到的圍欄程式碼區塊
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
    pub line: usize,
}

/// One rendered page. Everything except `html` lands in `site.json`, so the
/// field order here is the metadata's serialized order.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub slug: String,
    pub output_path: String,
    pub title: String,
    pub layout: String,
    pub date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub word_count: usize,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip)]
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub pages: Vec<RenderedPage>,
    pub index_html: String,
    pub skipped_drafts: usize,
    pub code_diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheckMode {
    Off,
    Warn,
    Strict,
}

impl CodeCheckMode {
    pub const CHOICES: [&'static str; 3] = ["off", "warn", "strict"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeCheckMode::Off => "off",
            CodeCheckMode::Warn => "warn",
            CodeCheckMode::Strict => "strict",
        }
    }
}

impl std::str::FromStr for CodeCheckMode {
    type Err = PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(CodeCheckMode::Off),
            "warn" => Ok(CodeCheckMode::Warn),
            "strict" => Ok(CodeCheckMode::Strict),
            other => Err(PressError::InvalidConfigValueError {
                field: "render.code_check".to_string(),
                value: other.to_string(),
                reason: format!("expected one of: {}", Self::CHOICES.join(", ")),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter_from_raw_keeps_values_unaltered() {
        let mut raw = BTreeMap::new();
        raw.insert("layout".to_string(), "post".to_string());
        raw.insert("title".to_string(), "Scoped object".to_string());
        raw.insert("categories".to_string(), "cpp".to_string());

        let fm = FrontMatter::from_raw(raw);

        assert_eq!(fm.get("layout"), Some("post"));
        assert_eq!(fm.get("title"), Some("Scoped object"));
        assert_eq!(fm.get("categories"), Some("cpp"));
        assert_eq!(fm.categories, vec!["cpp"]);
        assert!(!fm.draft);
    }

    #[test]
    fn test_front_matter_list_values() {
        let mut raw = BTreeMap::new();
        raw.insert("tags".to_string(), "[raii, \"c++\", idiom]".to_string());
        raw.insert("categories".to_string(), "cpp patterns".to_string());

        let fm = FrontMatter::from_raw(raw);

        assert_eq!(fm.tags, vec!["raii", "c++", "idiom"]);
        assert_eq!(fm.categories, vec!["cpp", "patterns"]);
        // raw 查詢仍回傳原始字面值
        assert_eq!(fm.get("tags"), Some("[raii, \"c++\", idiom]"));
    }

    #[test]
    fn test_document_slug_and_date_from_filename() {
        let doc = Document::assemble(
            "posts/2013-09-28-scoped-object.md",
            FrontMatter::default(),
            "body".to_string(),
        );

        assert_eq!(doc.slug, "scoped-object");
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2013, 9, 28));
        assert_eq!(doc.title(), "scoped-object");
    }

    #[test]
    fn test_front_matter_date_wins_over_filename() {
        let mut raw = BTreeMap::new();
        raw.insert("date".to_string(), "2014-01-02".to_string());
        let doc = Document::assemble(
            "2013-09-28-scoped-object.md",
            FrontMatter::from_raw(raw),
            String::new(),
        );

        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2014, 1, 2));
    }

    #[test]
    fn test_plain_filename_has_no_date() {
        let doc = Document::assemble("about.md", FrontMatter::default(), String::new());

        assert_eq!(doc.slug, "about");
        assert_eq!(doc.date, None);
    }

    #[test]
    fn test_code_check_mode_parsing() {
        assert_eq!("warn".parse::<CodeCheckMode>().unwrap(), CodeCheckMode::Warn);
        assert!("loud".parse::<CodeCheckMode>().is_err());
    }
}
