#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    /// 這個階段自己花的時間
    pub phase_elapsed: Duration,
    /// 從建置開始到現在的累計時間
    pub total_elapsed: Duration,
}

/// Per-phase resource stats for a build. Disabled monitors skip sampling
/// entirely, so the pipeline pays nothing unless `--monitor` is on.
#[cfg(feature = "cli")]
pub struct BuildMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    phase_started: Mutex<Instant>,
    peak_memory_mb: Mutex<u64>,
    history: Mutex<Vec<PhaseStats>>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl BuildMonitor {
    pub fn new(enabled: bool) -> Self {
        let system = if enabled {
            let mut system = System::new_with_specifics(RefreshKind::everything());
            system.refresh_all();
            system
        } else {
            System::new()
        };

        let now = Instant::now();
        Self {
            system: Mutex::new(system),
            pid: sysinfo::get_current_pid().ok(),
            started: now,
            phase_started: Mutex::new(now),
            peak_memory_mb: Mutex::new(0),
            history: Mutex::new(Vec::new()),
            enabled,
        }
    }

    fn sample(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_all();
        let process = system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let cpu_usage = process.cpu_usage();
        drop(system);

        let mut peak = self.peak_memory_mb.lock().ok()?;
        *peak = (*peak).max(memory_mb);
        let peak_memory_mb = *peak;
        drop(peak);

        let now = Instant::now();
        let mut phase_started = self.phase_started.lock().ok()?;
        let phase_elapsed = now.duration_since(*phase_started);
        *phase_started = now;

        Some(PhaseStats {
            phase: phase.to_string(),
            cpu_usage,
            memory_mb,
            peak_memory_mb,
            phase_elapsed,
            total_elapsed: self.started.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.sample(phase) {
            tracing::info!(
                "📊 {} took {:?} - CPU: {:.1}%, Memory: {}MB (peak {}MB)",
                stats.phase,
                stats.phase_elapsed,
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb
            );
            if let Ok(mut history) = self.history.lock() {
                history.push(stats);
            }
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }

        let peak = self.peak_memory_mb.lock().map(|p| *p).unwrap_or(0);
        if let Ok(history) = self.history.lock() {
            let breakdown: Vec<String> = history
                .iter()
                .map(|s| format!("{} {:?}", s.phase, s.phase_elapsed))
                .collect();
            tracing::info!(
                "📊 Build stats - total {:?}, peak memory {}MB [{}]",
                self.started.elapsed(),
                peak,
                breakdown.join(", ")
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for BuildMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境用空實作
#[cfg(not(feature = "cli"))]
pub struct BuildMonitor {
    enabled: bool,
}

#[cfg(not(feature = "cli"))]
impl BuildMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self { enabled: false }
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_samples_nothing() {
        let monitor = BuildMonitor::new(false);

        assert!(!monitor.is_enabled());
        assert!(monitor.sample("Extract").is_none());
        assert!(monitor.history.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enabled_monitor_records_phase_history() {
        let monitor = BuildMonitor::new(true);

        monitor.log_phase("Extract");
        monitor.log_phase("Transform");

        let history = monitor.history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].phase, "Extract");
        // 每階段的耗時不會超過累計耗時
        assert!(history[1].phase_elapsed <= history[1].total_elapsed);
    }
}
