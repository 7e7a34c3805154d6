use crate::core::Pipeline;
use crate::scope::guard;
use crate::utils::error::Result;
use crate::utils::monitor::BuildMonitor;

pub struct SiteEngine<P: Pipeline> {
    pipeline: P,
    monitor: BuildMonitor,
}

impl<P: Pipeline> SiteEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: BuildMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: BuildMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting site build...");

        // 結束時間由 guard 記錄,錯誤提早返回也會印出
        let _elapsed = guard(std::time::Instant::now(), |started| {
            tracing::info!("📊 Build finished in {:?}", started.elapsed());
        });

        let failure_notice = guard((), |_| {
            tracing::error!("❌ Build aborted; output may be incomplete");
        });

        println!("Extracting content...");
        let sources = self.pipeline.extract().await?;
        println!("Extracted {} documents", sources.len());
        self.monitor.log_phase("Extract");

        println!("Rendering pages...");
        let rendered = self.pipeline.transform(sources).await?;
        println!("Rendered {} pages", rendered.pages.len());
        self.monitor.log_phase("Transform");

        println!("Writing output...");
        let output_path = self.pipeline.load(rendered).await?;
        println!("Output saved to: {}", output_path);
        self.monitor.log_phase("Load");

        self.monitor.log_final_stats();
        failure_notice.dismiss();

        Ok(output_path)
    }
}
