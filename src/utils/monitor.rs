//! 各執行階段的行程資源用量（僅 CLI 版本）。

use std::time::{Duration, Instant};

/// 追蹤 RSS 的峰值與相對上一個階段的變化
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTrack {
    pub peak_mb: u64,
    last_mb: Option<u64>,
}

impl MemoryTrack {
    /// 記錄一次取樣，回傳與上次取樣的差值（MB）
    pub fn observe(&mut self, rss_mb: u64) -> i64 {
        let delta = match self.last_mb {
            Some(last) => rss_mb as i64 - last as i64,
            None => 0,
        };
        self.last_mb = Some(rss_mb);
        self.peak_mb = self.peak_mb.max(rss_mb);
        delta
    }
}

#[derive(Debug, Clone)]
pub struct PhaseSample {
    pub rss_mb: u64,
    pub delta_mb: i64,
    pub cpu_percent: f32,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: sysinfo::System,
    pid: sysinfo::Pid,
    memory: MemoryTrack,
}

pub struct SystemMonitor {
    #[cfg(feature = "cli")]
    sampler: Option<std::sync::Mutex<Sampler>>,
    started: Instant,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(not(feature = "cli"))]
        let _ = enabled;

        Self {
            #[cfg(feature = "cli")]
            sampler: if enabled { Self::sampler() } else { None },
            started: Instant::now(),
        }
    }

    #[cfg(feature = "cli")]
    fn sampler() -> Option<std::sync::Mutex<Sampler>> {
        match sysinfo::get_current_pid() {
            Ok(pid) => Some(std::sync::Mutex::new(Sampler {
                system: sysinfo::System::new(),
                pid,
                memory: MemoryTrack::default(),
            })),
            Err(e) => {
                tracing::warn!("Process stats unavailable, monitoring disabled: {}", e);
                None
            }
        }
    }

    #[cfg(feature = "cli")]
    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    #[cfg(not(feature = "cli"))]
    pub fn is_enabled(&self) -> bool {
        false
    }

    #[cfg(feature = "cli")]
    pub fn sample(&self) -> Option<PhaseSample> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let pid = sampler.pid;
        sampler
            .system
            .refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);

        let (rss_mb, cpu_percent) = {
            let process = sampler.system.process(pid)?;
            (process.memory() / 1024 / 1024, process.cpu_usage())
        };
        let delta_mb = sampler.memory.observe(rss_mb);

        Some(PhaseSample {
            rss_mb,
            delta_mb,
            cpu_percent,
            elapsed: self.started.elapsed(),
        })
    }

    #[cfg(not(feature = "cli"))]
    pub fn sample(&self) -> Option<PhaseSample> {
        None
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "📊 {} - RSS: {}MB ({:+}MB), CPU: {:.1}%, Time: {:?}",
                phase,
                sample.rss_mb,
                sample.delta_mb,
                sample.cpu_percent,
                sample.elapsed
            );
        }
    }

    #[cfg(feature = "cli")]
    pub fn log_final_stats(&self) {
        if let Some(sampler) = self.sampler.as_ref().and_then(|s| s.lock().ok()) {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak RSS: {}MB",
                self.started.elapsed(),
                sampler.memory.peak_mb
            );
        }
    }

    #[cfg(not(feature = "cli"))]
    pub fn log_final_stats(&self) {}
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.sample().is_none());
        monitor.log_stats("Ingestion");
        monitor.log_final_stats();
    }

    #[test]
    fn test_memory_track_deltas_and_peak() {
        let mut track = MemoryTrack::default();

        assert_eq!(track.observe(100), 0);
        assert_eq!(track.observe(160), 60);
        assert_eq!(track.observe(120), -40);
        assert_eq!(track.peak_mb, 160);
    }
}
