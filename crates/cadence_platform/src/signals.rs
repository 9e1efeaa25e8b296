//! Environment signals
//!
//! Read-only snapshot of the runtime hints the classifier looks at. Every
//! hint except the viewport is best-effort: hosts leave a field as `None`
//! when the underlying API is missing, and the classifier treats `None` as
//! the non-degrading reading for that signal alone.

use std::sync::{Mutex, PoisonError};

/// Battery state as reported by the host (battery API)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatteryStatus {
    /// Charge level from 0.0 to 1.0
    pub level: f32,
    /// Whether the device is plugged in
    pub charging: bool,
}

/// Snapshot of environment signals
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentSignals {
    /// Viewport width in logical pixels
    pub viewport_width: Option<f32>,
    /// Viewport height in logical pixels
    pub viewport_height: Option<f32>,
    /// Raw user-agent string
    pub user_agent: Option<String>,
    /// Approximate device memory in GiB
    pub device_memory_gib: Option<f32>,
    /// Logical CPU count
    pub hardware_concurrency: Option<u32>,
    /// `prefers-reduced-motion: reduce` media query result
    pub prefers_reduced_motion: Option<bool>,
    /// Network save-data hint
    pub save_data: Option<bool>,
    /// Battery state, when the battery API exists
    pub battery: Option<BatteryStatus>,
    /// Maximum simultaneous touch points
    pub max_touch_points: Option<u32>,
    /// Whether an idle-callback scheduling API exists (missing on old iOS)
    pub has_idle_callback: Option<bool>,
}

impl EnvironmentSignals {
    /// Empty snapshot: every signal unavailable
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport_width = Some(width);
        self.viewport_height = Some(height);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_memory(mut self, gib: f32) -> Self {
        self.device_memory_gib = Some(gib);
        self
    }

    pub fn with_cpus(mut self, count: u32) -> Self {
        self.hardware_concurrency = Some(count);
        self
    }

    pub fn with_reduced_motion(mut self, reduce: bool) -> Self {
        self.prefers_reduced_motion = Some(reduce);
        self
    }

    pub fn with_save_data(mut self, enabled: bool) -> Self {
        self.save_data = Some(enabled);
        self
    }

    pub fn with_battery(mut self, level: f32, charging: bool) -> Self {
        self.battery = Some(BatteryStatus { level, charging });
        self
    }

    pub fn with_touch_points(mut self, points: u32) -> Self {
        self.max_touch_points = Some(points);
        self
    }

    pub fn with_idle_callback(mut self, available: bool) -> Self {
        self.has_idle_callback = Some(available);
        self
    }

    /// Wide desktop browser with plenty of memory and cores
    pub fn desktop() -> Self {
        Self::new()
            .with_viewport(1440.0, 900.0)
            .with_user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/126.0 Safari/537.36",
            )
            .with_memory(8.0)
            .with_cpus(8)
            .with_reduced_motion(false)
            .with_save_data(false)
            .with_touch_points(0)
            .with_idle_callback(true)
    }

    /// Recent phone with mid-range hardware
    pub fn phone() -> Self {
        Self::new()
            .with_viewport(390.0, 844.0)
            .with_user_agent(
                "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/126.0 Mobile Safari/537.36",
            )
            .with_memory(8.0)
            .with_cpus(8)
            .with_reduced_motion(false)
            .with_save_data(false)
            .with_touch_points(5)
            .with_idle_callback(true)
    }
}

/// Read-only provider of environment signals
///
/// Hosts implement this over their real runtime (browser globals, window
/// system queries). Tests inject [`StaticSignals`] instead.
pub trait SignalSource: Send + Sync {
    /// Take a fresh snapshot of the environment
    fn read(&self) -> EnvironmentSignals;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Signal source backed by a stored snapshot
///
/// The host (or a test) pushes new readings with [`StaticSignals::set`] or
/// [`StaticSignals::update`]; the classifier only ever reads.
#[derive(Debug, Default)]
pub struct StaticSignals {
    signals: Mutex<EnvironmentSignals>,
}

impl StaticSignals {
    pub fn new(signals: EnvironmentSignals) -> Self {
        Self {
            signals: Mutex::new(signals),
        }
    }

    /// Replace the stored snapshot
    pub fn set(&self, signals: EnvironmentSignals) {
        *self.signals.lock().unwrap_or_else(PoisonError::into_inner) = signals;
    }

    /// Modify the stored snapshot in place
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut EnvironmentSignals),
    {
        f(&mut self.signals.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl SignalSource for StaticSignals {
    fn read(&self) -> EnvironmentSignals {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_update() {
        let source = StaticSignals::new(EnvironmentSignals::desktop());
        assert_eq!(source.read().viewport_width, Some(1440.0));

        source.update(|s| s.viewport_width = Some(600.0));
        assert_eq!(source.read().viewport_width, Some(600.0));

        source.set(EnvironmentSignals::new());
        assert_eq!(source.read(), EnvironmentSignals::default());
    }

    #[test]
    fn test_presets_fill_every_signal_but_battery() {
        let desktop = EnvironmentSignals::desktop();
        assert!(desktop.user_agent.is_some());
        assert!(desktop.battery.is_none());
        assert_eq!(desktop.hardware_concurrency, Some(8));
    }
}
