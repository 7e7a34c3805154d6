use crate::domain::model::FrontMatter;
use crate::utils::error::{PressError, Result};
use std::collections::BTreeMap;

/// Split a source text into front matter and body.
///
/// Two block dialects are recognized: `---` fences holding flat `key: value`
/// lines, and `+++` fences holding TOML. A document without an opening fence
/// on its first line has empty front matter and the whole text as body.
pub fn parse(path: &str, text: &str) -> Result<(FrontMatter, String)> {
    if let Some(rest) = strip_fence_line(text, "---") {
        let (block, body) = split_block(path, rest, "---")?;
        let raw = parse_flat_block(path, block)?;
        return Ok((FrontMatter::from_raw(raw), body));
    }

    if let Some(rest) = strip_fence_line(text, "+++") {
        let (block, body) = split_block(path, rest, "+++")?;
        let raw = parse_toml_block(path, block)?;
        return Ok((FrontMatter::from_raw(raw), body));
    }

    Ok((FrontMatter::default(), text.to_string()))
}

fn strip_fence_line<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(fence)?;
    if let Some(rest) = rest.strip_prefix("\r\n") {
        return Some(rest);
    }
    if let Some(rest) = rest.strip_prefix('\n') {
        return Some(rest);
    }
    if rest.is_empty() {
        return Some(rest);
    }
    None
}

fn split_block<'a>(path: &str, rest: &'a str, fence: &str) -> Result<(&'a str, String)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == fence {
            let block = &rest[..offset];
            let body = rest[offset + line.len()..].to_string();
            return Ok((block, body));
        }
        offset += line.len();
    }

    Err(PressError::FrontMatterError {
        path: path.to_string(),
        message: format!("front matter opened with `{fence}` is never closed"),
    })
}

fn parse_flat_block(path: &str, block: &str) -> Result<BTreeMap<String, String>> {
    let mut raw = BTreeMap::new();

    for (idx, line) in block.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(PressError::FrontMatterError {
                path: path.to_string(),
                message: format!("line {}: expected `key: value`, got `{}`", idx + 2, trimmed),
            });
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(PressError::FrontMatterError {
                path: path.to_string(),
                message: format!("line {}: empty key", idx + 2),
            });
        }

        raw.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    Ok(raw)
}

fn parse_toml_block(path: &str, block: &str) -> Result<BTreeMap<String, String>> {
    let table: toml::Table = block.parse().map_err(|e: toml::de::Error| {
        PressError::FrontMatterError {
            path: path.to_string(),
            message: format!("invalid TOML front matter: {}", e),
        }
    })?;

    let mut raw = BTreeMap::new();
    flatten_table(&table, "", &mut raw);
    Ok(raw)
}

fn flatten_table(table: &toml::Table, prefix: &str, raw: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten_table(inner, &full_key, raw),
            other => {
                raw.insert(full_key, toml_value_to_string(other));
            }
        }
    }
}

fn toml_value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(toml_value_to_string).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_layout_title_categories() {
        let text = "---\nlayout: post\ntitle: \"Scoped object\"\ncategories: cpp\n---\n\nBody text.\n";
        let (fm, body) = parse("2013-09-28-scoped-object.md", text).unwrap();

        assert_eq!(fm.get("layout"), Some("post"));
        assert_eq!(fm.get("title"), Some("Scoped object"));
        assert_eq!(fm.get("categories"), Some("cpp"));
        assert_eq!(body, "\nBody text.\n");
    }

    #[test]
    fn test_no_front_matter_means_empty_metadata() {
        let (fm, body) = parse("plain.md", "Just a paragraph.\n").unwrap();

        assert!(fm.is_empty());
        assert_eq!(body, "Just a paragraph.\n");
    }

    #[test]
    fn test_dashes_later_in_text_are_not_a_fence() {
        let text = "Intro\n---\nnot front matter\n";
        let (fm, body) = parse("plain.md", text).unwrap();

        assert!(fm.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "---\n# a comment\n\ntitle: Hello\n---\nbody";
        let (fm, _) = parse("a.md", text).unwrap();

        assert_eq!(fm.get("title"), Some("Hello"));
        assert_eq!(fm.raw.len(), 1);
    }

    #[test]
    fn test_unterminated_block_is_an_error() {
        let text = "---\ntitle: Broken\n";
        let err = parse("broken.md", text).unwrap_err();

        assert!(matches!(err, PressError::FrontMatterError { .. }));
        assert!(err.to_string().contains("never closed"));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let text = "---\njust words\n---\nbody";
        let err = parse("bad.md", text).unwrap_err();

        assert!(err.to_string().contains("key: value"));
    }

    #[test]
    fn test_toml_block() {
        let text = "+++\ntitle = \"Scoped object\"\ndraft = true\ntags = [\"raii\", \"cpp\"]\n+++\nbody";
        let (fm, body) = parse("t.md", text).unwrap();

        assert_eq!(fm.get("title"), Some("Scoped object"));
        assert!(fm.draft);
        assert_eq!(fm.tags, vec!["raii", "cpp"]);
        assert_eq!(body, "body");
    }

    #[test]
    fn test_toml_date_value() {
        let text = "+++\ndate = 2013-09-28\n+++\n";
        let (fm, _) = parse("t.md", text).unwrap();

        assert_eq!(
            fm.date,
            chrono::NaiveDate::from_ymd_opt(2013, 9, 28)
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "---\r\ntitle: Windows\r\n---\r\nbody\r\n";
        let (fm, body) = parse("w.md", text).unwrap();

        assert_eq!(fm.get("title"), Some("Windows"));
        assert_eq!(body, "body\r\n");
    }
}
