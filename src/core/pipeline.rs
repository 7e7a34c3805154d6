use crate::core::codecheck::CodeChecker;
use crate::core::front_matter;
use crate::core::layout::{LayoutEngine, VarStack};
use crate::core::markdown::{self, html_escape};
use crate::core::{ConfigProvider, Pipeline, RenderResult, RenderedPage, SourceDoc, Storage};
use crate::domain::model::{CodeCheckMode, Document};
use crate::utils::error::{PressError, Result};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

pub struct PostPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    layouts: LayoutEngine,
}

impl<S: Storage, C: ConfigProvider> PostPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let layouts = LayoutEngine::new(config.layouts_dir().map(Path::new))?;
        Ok(Self {
            storage,
            config,
            layouts,
        })
    }

    fn wants(&self, path: &str) -> bool {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        self.config
            .content_extensions()
            .iter()
            .any(|allowed| allowed == ext)
    }

    fn render_index(&self, pages: &[RenderedPage], site_vars: &mut VarStack) -> String {
        let mut items = String::from("<ul class=\"post-list\">\n");
        for page in pages.iter().take(self.config.index_limit()) {
            let date = page
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            items.push_str(&format!(
                "<li><a href=\"{}\">{}</a> <span class=\"date\">{}</span></li>\n",
                page.output_path,
                html_escape(&page.title),
                date
            ));
        }
        items.push_str("</ul>\n");

        let mut scope = site_vars.scoped();
        scope.push("content", &items);
        self.layouts.apply("index", &scope)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PostPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDoc>> {
        let content_dir = self.config.content_dir();
        tracing::info!("📥 Scanning content directory: {}", content_dir);

        let mut paths: Vec<String> = self
            .storage
            .list_files(content_dir)
            .await?
            .into_iter()
            .filter(|path| self.wants(path))
            .collect();

        if let Some(single) = self.config.single_file() {
            paths.retain(|path| {
                path == single
                    || Path::new(path).file_name().and_then(|n| n.to_str()) == Some(single)
            });
            if paths.is_empty() {
                return Err(PressError::ProcessingError {
                    message: format!("single file '{single}' not found under {content_dir}"),
                });
            }
        }

        // 路徑排序是輸出順序穩定的前提
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            tracing::debug!("📥 Reading {}", path);
            let text = self.storage.read_file(&path).await?;
            docs.push(SourceDoc { path, text });
        }

        tracing::info!("📥 Extracted {} source documents", docs.len());
        Ok(docs)
    }

    async fn transform(&self, docs: Vec<SourceDoc>) -> Result<RenderResult> {
        tracing::info!("🔄 Rendering {} documents", docs.len());

        let mode: CodeCheckMode = self.config.code_check().parse()?;
        let checker = CodeChecker::new(mode);
        let include_drafts = self.config.include_drafts();

        let mut site_vars = VarStack::new();
        site_vars.push("site_title", self.config.site_title());
        site_vars.push("base_url", self.config.base_url());

        let mut pages = Vec::new();
        let mut seen_outputs = BTreeSet::new();
        let mut skipped_drafts = 0;
        let mut code_diagnostics = Vec::new();

        for doc in docs {
            let (front_matter, body) = front_matter::parse(&doc.path, &doc.text)?;
            let doc = Document::assemble(&doc.path, front_matter, body);

            if doc.front_matter.draft && !include_drafts {
                tracing::debug!("🔶 Skipping draft: {}", doc.source_path);
                skipped_drafts += 1;
                continue;
            }

            // date 有寫但解析不出來就整個中止,不默默當成無日期頁面
            if let Some(raw_date) = doc.front_matter.get("date") {
                if doc.front_matter.date.is_none() {
                    return Err(PressError::RenderError {
                        path: doc.source_path.clone(),
                        message: format!("date '{}' is not a YYYY-MM-DD value", raw_date),
                    });
                }
            }

            let output_path = format!("{}.html", doc.slug);
            if !seen_outputs.insert(output_path.clone()) {
                return Err(PressError::ProcessingError {
                    message: format!(
                        "duplicate slug '{}' (from {}) would overwrite an earlier page",
                        doc.slug, doc.source_path
                    ),
                });
            }

            let rendered = markdown::render(&doc.body);
            code_diagnostics.extend(checker.check(&doc.source_path, &rendered.code_blocks)?);

            let layout_name = doc
                .front_matter
                .layout
                .clone()
                .unwrap_or_else(|| self.config.default_layout().to_string());
            let date_str = doc
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let categories = doc.front_matter.categories.join(", ");
            let tags = doc.front_matter.tags.join(", ");

            // 頁面變數只活在這個 scope;離開時自動還原成站台變數
            let html = {
                let mut scope = site_vars.scoped();
                for (key, value) in &doc.front_matter.raw {
                    scope.push(key, &html_escape(value));
                }
                scope.push("title", &html_escape(doc.title()));
                scope.push("date", &date_str);
                scope.push("categories", &html_escape(&categories));
                scope.push("tags", &html_escape(&tags));
                scope.push("content", &rendered.html);
                self.layouts.apply(&layout_name, &scope)
            };

            pages.push(RenderedPage {
                slug: doc.slug.clone(),
                output_path,
                title: doc.title().to_string(),
                layout: layout_name,
                date: doc.date,
                categories: doc.front_matter.categories.clone(),
                tags: doc.front_matter.tags.clone(),
                word_count: rendered.word_count,
                metadata: doc.front_matter.raw.clone(),
                html,
            });
        }

        // 固定順序:日期新到舊,同日期以 slug 排序
        pages.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        let index_html = self.render_index(&pages, &mut site_vars);

        if !code_diagnostics.is_empty() {
            tracing::warn!(
                "🔶 {} code block diagnostic(s) collected",
                code_diagnostics.len()
            );
        }

        tracing::info!(
            "🔄 Rendered {} pages ({} drafts skipped)",
            pages.len(),
            skipped_drafts
        );

        Ok(RenderResult {
            pages,
            index_html,
            skipped_drafts,
            code_diagnostics,
        })
    }

    async fn load(&self, result: RenderResult) -> Result<String> {
        let output_dir = self.config.output_dir();
        tracing::info!("💾 Writing {} pages to {}", result.pages.len(), output_dir);

        for page in &result.pages {
            let path = format!("{}/{}", output_dir, page.output_path);
            self.storage.write_file(&path, page.html.as_bytes()).await?;
        }

        self.storage
            .write_file(
                &format!("{}/index.html", output_dir),
                result.index_html.as_bytes(),
            )
            .await?;

        // 每頁中繼資料,欄位與頁面順序都是固定的
        let metadata_json = serde_json::to_string_pretty(&result.pages)?;
        self.storage
            .write_file(&format!("{}/site.json", output_dir), metadata_json.as_bytes())
            .await?;

        if self.config.archive_enabled() {
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                for page in &result.pages {
                    zip.start_file(page.output_path.as_str(), archive_options())?;
                    zip.write_all(page.html.as_bytes())?;
                }

                zip.start_file("index.html", archive_options())?;
                zip.write_all(result.index_html.as_bytes())?;

                zip.start_file("site.json", archive_options())?;
                zip.write_all(metadata_json.as_bytes())?;

                // 完成並取回底層 Vec<u8>
                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("💾 Writing site archive ({} bytes)", zip_data.len());
            self.storage
                .write_file(&format!("{}/site.zip", output_dir), &zip_data)
                .await?;
        }

        if result.skipped_drafts > 0 {
            tracing::info!("🔶 {} draft(s) were skipped", result.skipped_drafts);
        }

        tracing::info!("💾 Load completed successfully");
        Ok(output_dir.to_string())
    }
}

// 壓縮檔內的時間戳固定,重複建置才會產生相同的位元組
fn archive_options() -> FileOptions<'static, ()> {
    FileOptions::default().last_modified_time(zip::DateTime::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(BTreeMap::new())),
            }
        }

        async fn seed(&self, path: &str, text: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), text.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
            let files = self.files.lock().await;
            let prefix = format!("{}/", dir.trim_end_matches('/'));
            Ok(files
                .keys()
                .filter(|key| key.starts_with(&prefix))
                .cloned()
                .collect())
        }

        async fn read_file(&self, path: &str) -> Result<String> {
            let files = self.files.lock().await;
            let data = files.get(path).cloned().ok_or_else(|| {
                PressError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })?;
            String::from_utf8(data).map_err(|e| {
                PressError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        site_title: String,
        base_url: String,
        content_dir: String,
        output_dir: String,
        default_layout: String,
        extensions: Vec<String>,
        include_drafts: bool,
        single_file: Option<String>,
        code_check: String,
        index_limit: usize,
        archive: bool,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                site_title: "Test Notes".to_string(),
                base_url: "https://example.test/".to_string(),
                content_dir: "content".to_string(),
                output_dir: "site".to_string(),
                default_layout: "post".to_string(),
                extensions: vec!["md".to_string(), "markdown".to_string()],
                include_drafts: false,
                single_file: None,
                code_check: "warn".to_string(),
                index_limit: 20,
                archive: true,
            }
        }
    }

    impl ConfigProvider for MockConfig {
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
            None
        }

        fn default_layout(&self) -> &str {
            &self.default_layout
        }

        fn content_extensions(&self) -> &[String] {
            &self.extensions
        }

        fn include_drafts(&self) -> bool {
            self.include_drafts
        }

        fn single_file(&self) -> Option<&str> {
            self.single_file.as_deref()
        }

        fn code_check(&self) -> &str {
            &self.code_check
        }

        fn index_limit(&self) -> usize {
            self.index_limit
        }

        fn archive_enabled(&self) -> bool {
            self.archive
        }
    }

    const SCOPED_OBJECT_POST: &str = "---\nlayout: post\ntitle: \"Scoped object\"\ncategories: cpp\n---\n\nA guard object ties a resource to a scope.\n\n```cpp\nstd::lock_guard<std::mutex> guard(mutex);\n```\n";

    #[tokio::test]
    async fn test_extract_reads_sorted_markdown_sources() {
        let storage = MockStorage::new();
        storage.seed("content/zz-last.md", "last").await;
        storage.seed("content/aa-first.md", "first").await;
        storage.seed("content/notes.txt", "not markdown").await;

        let pipeline = PostPipeline::new(storage, MockConfig::new()).unwrap();
        let docs = pipeline.extract().await.unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].path, "content/aa-first.md");
        assert_eq!(docs[1].path, "content/zz-last.md");
        assert_eq!(docs[0].text, "first");
    }

    #[tokio::test]
    async fn test_extract_single_file_mode() {
        let storage = MockStorage::new();
        storage.seed("content/a.md", "a").await;
        storage.seed("content/b.md", "b").await;

        let mut config = MockConfig::new();
        config.single_file = Some("b.md".to_string());

        let pipeline = PostPipeline::new(storage, config).unwrap();
        let docs = pipeline.extract().await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "content/b.md");
    }

    #[tokio::test]
    async fn test_extract_missing_single_file_is_an_error() {
        let storage = MockStorage::new();
        storage.seed("content/a.md", "a").await;

        let mut config = MockConfig::new();
        config.single_file = Some("missing.md".to_string());

        let pipeline = PostPipeline::new(storage, config).unwrap();
        let err = pipeline.extract().await.unwrap_err();

        assert!(matches!(err, PressError::ProcessingError { .. }));
    }

    #[tokio::test]
    async fn test_transform_renders_post_with_queryable_metadata() {
        let storage = MockStorage::new();
        let pipeline = PostPipeline::new(storage, MockConfig::new()).unwrap();

        let docs = vec![SourceDoc {
            path: "content/2013-09-28-scoped-object.md".to_string(),
            text: SCOPED_OBJECT_POST.to_string(),
        }];

        let result = pipeline.transform(docs).await.unwrap();

        assert_eq!(result.pages.len(), 1);
        let page = &result.pages[0];
        assert_eq!(page.slug, "scoped-object");
        assert_eq!(page.output_path, "scoped-object.html");
        assert_eq!(page.title, "Scoped object");
        assert_eq!(page.layout, "post");
        assert_eq!(page.categories, vec!["cpp"]);

        // 中繼資料保留原始值
        assert_eq!(page.metadata.get("layout").map(String::as_str), Some("post"));
        assert_eq!(
            page.metadata.get("title").map(String::as_str),
            Some("Scoped object")
        );
        assert_eq!(page.metadata.get("categories").map(String::as_str), Some("cpp"));

        assert!(page.html.contains("<h1>Scoped object</h1>"));
        assert!(page.html.contains("lock_guard"));
        assert!(result.index_html.contains("scoped-object.html"));
    }

    #[tokio::test]
    async fn test_transform_is_deterministic() {
        let docs = || {
            vec![SourceDoc {
                path: "content/2013-09-28-scoped-object.md".to_string(),
                text: SCOPED_OBJECT_POST.to_string(),
            }]
        };

        let pipeline = PostPipeline::new(MockStorage::new(), MockConfig::new()).unwrap();
        let first = pipeline.transform(docs()).await.unwrap();
        let second = pipeline.transform(docs()).await.unwrap();

        assert_eq!(first.pages[0].html, second.pages[0].html);
        assert_eq!(first.index_html, second.index_html);
    }

    #[tokio::test]
    async fn test_transform_skips_drafts_and_counts_them() {
        let pipeline = PostPipeline::new(MockStorage::new(), MockConfig::new()).unwrap();

        let docs = vec![
            SourceDoc {
                path: "content/2020-01-01-ready.md".to_string(),
                text: "---\ntitle: Ready\n---\nDone.\n".to_string(),
            },
            SourceDoc {
                path: "content/2020-01-02-wip.md".to_string(),
                text: "---\ntitle: WIP\ndraft: true\n---\nNot yet.\n".to_string(),
            },
        ];

        let result = pipeline.transform(docs).await.unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.skipped_drafts, 1);
        assert_eq!(result.pages[0].slug, "ready");
    }

    #[tokio::test]
    async fn test_transform_includes_drafts_when_configured() {
        let mut config = MockConfig::new();
        config.include_drafts = true;
        let pipeline = PostPipeline::new(MockStorage::new(), config).unwrap();

        let docs = vec![SourceDoc {
            path: "content/2020-01-02-wip.md".to_string(),
            text: "---\ntitle: WIP\ndraft: true\n---\nNot yet.\n".to_string(),
        }];

        let result = pipeline.transform(docs).await.unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.skipped_drafts, 0);
    }

    #[tokio::test]
    async fn test_transform_orders_pages_date_desc_then_slug() {
        let pipeline = PostPipeline::new(MockStorage::new(), MockConfig::new()).unwrap();

        let docs = vec![
            SourceDoc {
                path: "content/2019-05-05-older.md".to_string(),
                text: "---\ntitle: Older\n---\nx\n".to_string(),
            },
            SourceDoc {
                path: "content/2021-03-03-newer.md".to_string(),
                text: "---\ntitle: Newer\n---\nx\n".to_string(),
            },
            SourceDoc {
                path: "content/about.md".to_string(),
                text: "---\ntitle: About\nlayout: page\n---\nx\n".to_string(),
            },
        ];

        let result = pipeline.transform(docs).await.unwrap();
        let slugs: Vec<&str> = result.pages.iter().map(|p| p.slug.as_str()).collect();

        // 無日期的頁面排在最後
        assert_eq!(slugs, vec!["newer", "older", "about"]);
    }

    #[tokio::test]
    async fn test_transform_rejects_unusable_date_value() {
        let pipeline = PostPipeline::new(MockStorage::new(), MockConfig::new()).unwrap();

        let docs = vec![SourceDoc {
            path: "content/undated.md".to_string(),
            text: "---\ntitle: Bad date\ndate: next tuesday\n---\nx\n".to_string(),
        }];

        let err = pipeline.transform(docs).await.unwrap_err();

        assert!(matches!(err, PressError::RenderError { .. }));
        assert!(err.to_string().contains("next tuesday"));
    }

    #[tokio::test]
    async fn test_transform_duplicate_slug_is_an_error() {
        let pipeline = PostPipeline::new(MockStorage::new(), MockConfig::new()).unwrap();

        let docs = vec![
            SourceDoc {
                path: "content/2020-01-01-same.md".to_string(),
                text: "a\n".to_string(),
            },
            SourceDoc {
                path: "content/2021-01-01-same.md".to_string(),
                text: "b\n".to_string(),
            },
        ];

        let err = pipeline.transform(docs).await.unwrap_err();
        assert!(err.to_string().contains("duplicate slug"));
    }

    #[tokio::test]
    async fn test_transform_strict_code_check_aborts() {
        let mut config = MockConfig::new();
        config.code_check = "strict".to_string();
        let pipeline = PostPipeline::new(MockStorage::new(), config).unwrap();

        let docs = vec![SourceDoc {
            path: "content/2020-01-01-broken.md".to_string(),
            text: "---\ntitle: Broken\n---\n\n```cpp\nint f( {\n```\n".to_string(),
        }];

        let err = pipeline.transform(docs).await.unwrap_err();
        assert!(matches!(err, PressError::CodeCheckError { .. }));
    }

    #[tokio::test]
    async fn test_transform_warn_mode_collects_diagnostics() {
        let pipeline = PostPipeline::new(MockStorage::new(), MockConfig::new()).unwrap();

        let docs = vec![SourceDoc {
            path: "content/2020-01-01-broken.md".to_string(),
            text: "---\ntitle: Broken\n---\n\n```cpp\nint f( {\n```\n".to_string(),
        }];

        let result = pipeline.transform(docs).await.unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.code_diagnostics.len(), 1);
        assert!(result.code_diagnostics[0].contains("2020-01-01-broken.md"));
    }

    #[tokio::test]
    async fn test_load_writes_pages_index_metadata_and_archive() {
        let storage = MockStorage::new();
        let pipeline = PostPipeline::new(storage.clone(), MockConfig::new()).unwrap();

        let docs = vec![SourceDoc {
            path: "content/2013-09-28-scoped-object.md".to_string(),
            text: SCOPED_OBJECT_POST.to_string(),
        }];
        let result = pipeline.transform(docs).await.unwrap();

        let output_dir = pipeline.load(result).await.unwrap();
        assert_eq!(output_dir, "site");

        assert!(storage.get_file("site/scoped-object.html").await.is_some());
        assert!(storage.get_file("site/index.html").await.is_some());

        // site.json 可以查詢每頁中繼資料
        let metadata = storage.get_file("site/site.json").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&metadata).unwrap();
        assert_eq!(parsed[0]["slug"], "scoped-object");
        assert_eq!(parsed[0]["metadata"]["categories"], "cpp");
        assert_eq!(parsed[0]["metadata"]["title"], "Scoped object");
        assert!(parsed[0].get("html").is_none());

        // 檢查壓縮檔內容
        let zip_bytes = storage.get_file("site/site.zip").await.unwrap();
        let cursor = std::io::Cursor::new(zip_bytes);
        let mut archive = zip::ZipArchive::new(cursor).unwrap();

        let mut file_names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        file_names.sort();

        assert_eq!(
            file_names,
            vec!["index.html", "scoped-object.html", "site.json"]
        );
    }

    #[tokio::test]
    async fn test_load_archive_bytes_are_reproducible() {
        let storage = MockStorage::new();
        let pipeline = PostPipeline::new(storage.clone(), MockConfig::new()).unwrap();

        let docs = || {
            vec![SourceDoc {
                path: "content/2013-09-28-scoped-object.md".to_string(),
                text: SCOPED_OBJECT_POST.to_string(),
            }]
        };

        let result = pipeline.transform(docs()).await.unwrap();
        pipeline.load(result).await.unwrap();
        let first = storage.get_file("site/site.zip").await.unwrap();

        let result = pipeline.transform(docs()).await.unwrap();
        pipeline.load(result).await.unwrap();
        let second = storage.get_file("site/site.zip").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_load_without_archive() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new();
        config.archive = false;
        let pipeline = PostPipeline::new(storage.clone(), config).unwrap();

        let docs = vec![SourceDoc {
            path: "content/2020-01-01-plain.md".to_string(),
            text: "hello\n".to_string(),
        }];
        let result = pipeline.transform(docs).await.unwrap();
        pipeline.load(result).await.unwrap();

        assert!(storage.get_file("site/site.zip").await.is_none());
        assert!(storage.get_file("site/plain.html").await.is_some());
    }

    #[tokio::test]
    async fn test_index_respects_limit() {
        let mut config = MockConfig::new();
        config.index_limit = 1;
        let pipeline = PostPipeline::new(MockStorage::new(), config).unwrap();

        let docs = vec![
            SourceDoc {
                path: "content/2020-01-01-one.md".to_string(),
                text: "---\ntitle: One\n---\nx\n".to_string(),
            },
            SourceDoc {
                path: "content/2021-01-01-two.md".to_string(),
                text: "---\ntitle: Two\n---\nx\n".to_string(),
            },
        ];

        let result = pipeline.transform(docs).await.unwrap();

        assert!(result.index_html.contains("two.html"));
        assert!(!result.index_html.contains("one.html"));
    }
}
