//! Device capability classifier
//!
//! Collapses the environment signals into a coarse
//! `{mobile, desktop} x {low performance, normal}` bucket. The classifier is
//! pure with respect to the snapshot it is given and never fails: a missing
//! signal simply contributes `false` to the rule it feeds.
//!
//! # Rules
//!
//! - **mobile**: viewport narrower than `mobile_max_width`, or a mobile
//!   user-agent token.
//! - **low performance**: any of
//!   - low memory *and* low CPU count
//!   - mobile *and* (low memory *or* low CPU *or* low battery while unplugged)
//!   - legacy iOS (old OS version, or no idle-callback API)
//!   - save-data enabled
//!   - reduced motion requested

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::signals::EnvironmentSignals;

/// Default mobile user-agent tokens (matched case-insensitively)
pub const MOBILE_USER_AGENTS: &str = "Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini";

/// iOS device tokens (matched case-sensitively)
pub const IOS_USER_AGENTS: &str = "iPhone|iPad|iPod";

/// OS versions treated as legacy iOS
pub const LEGACY_IOS_VERSIONS: &str = "OS 11|OS 12|OS 13";

/// Coarse device classification
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeviceClassification {
    pub is_mobile: bool,
    pub is_low_performance: bool,
}

impl DeviceClassification {
    pub const DESKTOP: Self = Self {
        is_mobile: false,
        is_low_performance: false,
    };

    pub const MOBILE: Self = Self {
        is_mobile: true,
        is_low_performance: false,
    };

    pub fn new(is_mobile: bool, is_low_performance: bool) -> Self {
        Self {
            is_mobile,
            is_low_performance,
        }
    }

    /// Collapse into the tier used to index animation presets
    ///
    /// Low performance wins over form factor.
    pub fn tier(&self) -> DeviceTier {
        if self.is_low_performance {
            DeviceTier::LowPerformance
        } else if self.is_mobile {
            DeviceTier::Mobile
        } else {
            DeviceTier::Desktop
        }
    }
}

/// Preset tier, ordered from the lightest to the richest animations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceTier {
    LowPerformance,
    Mobile,
    Desktop,
}

/// Secondary device facts that tune scroll handling but do not change the
/// classification
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceTraits {
    pub is_ios: bool,
    pub is_touch: bool,
    /// Viewport at least `wide_desktop_min_width`
    pub is_wide_desktop: bool,
}

/// Classification plus traits, as produced for a single snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceProfile {
    pub classification: DeviceClassification,
    pub traits: DeviceTraits,
    /// Viewport height at classification time, if known
    pub viewport_height: Option<f32>,
}

/// Thresholds and patterns used by the classifier
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Viewports strictly narrower than this are mobile
    pub mobile_max_width: f32,
    /// Viewports at least this wide count as wide desktop
    pub wide_desktop_min_width: f32,
    /// Device memory below this (GiB) is low
    pub low_memory_gib: f32,
    /// Logical CPU count below this is low
    pub low_cpu_threads: u32,
    /// Battery level below this while unplugged is low
    pub low_battery_level: f32,
    /// Regex alternation of mobile user-agent tokens
    pub mobile_user_agents: String,
    /// Regex alternation of legacy iOS version markers
    pub legacy_ios_versions: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 768.0,
            wide_desktop_min_width: 1024.0,
            low_memory_gib: 4.0,
            low_cpu_threads: 4,
            low_battery_level: 0.15,
            mobile_user_agents: MOBILE_USER_AGENTS.to_string(),
            legacy_ios_versions: LEGACY_IOS_VERSIONS.to_string(),
        }
    }
}

/// Compiled classifier
#[derive(Clone, Debug)]
pub struct Classifier {
    config: ClassifierConfig,
    mobile_ua: Regex,
    ios_ua: Regex,
    legacy_ios: Regex,
}

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(ClassifierConfig::default()).expect("built-in classifier patterns compile")
});

impl Classifier {
    /// Compile a classifier from its configuration
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        check_threshold("mobile_max_width", config.mobile_max_width)?;
        check_threshold("wide_desktop_min_width", config.wide_desktop_min_width)?;
        check_threshold("low_memory_gib", config.low_memory_gib)?;
        if !(0.0..=1.0).contains(&config.low_battery_level) {
            return Err(PlatformError::InvalidThreshold {
                name: "low_battery_level",
                value: config.low_battery_level,
            });
        }

        let mobile_ua = compile(&config.mobile_user_agents, true)?;
        let ios_ua = compile(IOS_USER_AGENTS, false)?;
        let legacy_ios = compile(&config.legacy_ios_versions, false)?;

        Ok(Self {
            config,
            mobile_ua,
            ios_ua,
            legacy_ios,
        })
    }

    /// Shared classifier built from the default configuration
    pub fn global() -> &'static Classifier {
        &DEFAULT_CLASSIFIER
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a snapshot
    pub fn classify(&self, signals: &EnvironmentSignals) -> DeviceClassification {
        self.profile(signals).classification
    }

    /// Classify a snapshot and collect the secondary traits
    pub fn profile(&self, signals: &EnvironmentSignals) -> DeviceProfile {
        let cfg = &self.config;
        let user_agent = signals.user_agent.as_deref().unwrap_or("");

        let narrow = signals
            .viewport_width
            .is_some_and(|w| w < cfg.mobile_max_width);
        let is_mobile = narrow || self.mobile_ua.is_match(user_agent);

        let low_memory = signals
            .device_memory_gib
            .is_some_and(|gib| gib < cfg.low_memory_gib);
        let low_cpu = signals
            .hardware_concurrency
            .is_some_and(|n| n < cfg.low_cpu_threads);
        let low_battery = signals
            .battery
            .is_some_and(|b| b.level < cfg.low_battery_level && !b.charging);

        let is_ios = self.ios_ua.is_match(user_agent);
        let legacy_ios = is_ios
            && (self.legacy_ios.is_match(user_agent) || signals.has_idle_callback == Some(false));

        let save_data = signals.save_data.unwrap_or(false);
        let reduced_motion = signals.prefers_reduced_motion.unwrap_or(false);

        let is_low_performance = (low_memory && low_cpu)
            || (is_mobile && (low_memory || low_cpu || low_battery))
            || legacy_ios
            || save_data
            || reduced_motion;

        let traits = DeviceTraits {
            is_ios,
            is_touch: signals.max_touch_points.is_some_and(|n| n > 0),
            is_wide_desktop: !is_mobile
                && signals
                    .viewport_width
                    .is_some_and(|w| w >= cfg.wide_desktop_min_width),
        };

        tracing::trace!(
            is_mobile,
            is_low_performance,
            low_memory,
            low_cpu,
            low_battery,
            legacy_ios,
            save_data,
            reduced_motion,
            "classified environment"
        );

        DeviceProfile {
            classification: DeviceClassification {
                is_mobile,
                is_low_performance,
            },
            traits,
            viewport_height: signals.viewport_height,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

/// Classify with the default thresholds
pub fn classify(signals: &EnvironmentSignals) -> DeviceClassification {
    DEFAULT_CLASSIFIER.classify(signals)
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| PlatformError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn check_threshold(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlatformError::InvalidThreshold { name, value })
    }
}
