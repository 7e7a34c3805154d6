use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::Path;

const DEFAULT_LAYOUT_NAME: &str = "default";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }} | {{ site_title }}</title>
</head>
<body>
<header><a href="{{ base_url }}index.html">{{ site_title }}</a></header>
<main>
{{ content }}
</main>
</body>
</html>
"#;

const POST_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }} | {{ site_title }}</title>
</head>
<body>
<header><a href="{{ base_url }}index.html">{{ site_title }}</a></header>
<main>
<article>
<header>
<h1>{{ title }}</h1>
<p class="meta">{{ date }} {{ categories }}</p>
</header>
{{ content }}
</article>
</main>
</body>
</html>
"#;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }} | {{ site_title }}</title>
</head>
<body>
<header><a href="{{ base_url }}index.html">{{ site_title }}</a></header>
<main>
<article>
<h1>{{ title }}</h1>
{{ content }}
</article>
</main>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ site_title }}</title>
</head>
<body>
<header><h1>{{ site_title }}</h1></header>
<main>
{{ content }}
</main>
</body>
</html>
"#;

/// Template variables as a push-down stack: later entries shadow earlier
/// ones, and [`VarStack::scoped`] hands out a guard that rolls the stack back
/// to its current depth on drop.
#[derive(Debug, Default)]
pub struct VarStack {
    vars: Vec<(String, String)>,
}

impl VarStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.vars.push((key.to_string(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 開一層變數作用域;guard 離開時還原到目前深度
    pub fn scoped(&mut self) -> VarScope<'_> {
        let depth = self.vars.len();
        VarScope { stack: self, depth }
    }

    /// Substitute every `{{ key }}` placeholder. Unresolved keys render as
    /// the empty string.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = after[..end].trim();
                    if let Some(value) = self.get(key) {
                        out.push_str(value);
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Variable scope guard. Every push through the guard is undone when it
/// drops, on any exit path, so page variables never leak into the next page.
pub struct VarScope<'a> {
    stack: &'a mut VarStack,
    depth: usize,
}

impl Deref for VarScope<'_> {
    type Target = VarStack;

    fn deref(&self) -> &VarStack {
        self.stack
    }
}

impl DerefMut for VarScope<'_> {
    fn deref_mut(&mut self) -> &mut VarStack {
        self.stack
    }
}

impl Drop for VarScope<'_> {
    fn drop(&mut self) {
        self.stack.vars.truncate(self.depth);
    }
}

/// Named layouts: the four built-ins, optionally overridden or extended by
/// `<name>.html` files in a layouts directory.
pub struct LayoutEngine {
    layouts: BTreeMap<String, String>,
}

impl LayoutEngine {
    pub fn new(layouts_dir: Option<&Path>) -> Result<Self> {
        let mut layouts = BTreeMap::new();
        layouts.insert(DEFAULT_LAYOUT_NAME.to_string(), DEFAULT_TEMPLATE.to_string());
        layouts.insert("post".to_string(), POST_TEMPLATE.to_string());
        layouts.insert("page".to_string(), PAGE_TEMPLATE.to_string());
        layouts.insert("index".to_string(), INDEX_TEMPLATE.to_string());

        if let Some(dir) = layouts_dir {
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                    let template = std::fs::read_to_string(&path)?;
                    tracing::debug!("📁 Loaded layout '{}' from {}", name, path.display());
                    layouts.insert(name.to_string(), template);
                }
            }
        }

        Ok(Self { layouts })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Apply a named layout; unknown names fall back to `default` with a
    /// warning.
    pub fn apply(&self, name: &str, vars: &VarStack) -> String {
        let template = match self.layouts.get(name) {
            Some(template) => template.as_str(),
            None => {
                tracing::warn!(
                    "🔶 Unknown layout '{}', falling back to '{}'",
                    name,
                    DEFAULT_LAYOUT_NAME
                );
                self.layouts
                    .get(DEFAULT_LAYOUT_NAME)
                    .map(|t| t.as_str())
                    .unwrap_or(DEFAULT_TEMPLATE)
            }
        };

        vars.render(template)
    }
}
