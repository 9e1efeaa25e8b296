//! Adaptive animation settings
//!
//! Maps a [`DeviceClassification`] onto the bundle of timing parameters that
//! every animation created for that device starts from. The mapping is a
//! three-row table indexed by [`DeviceTier`]; the defaults match the
//! marketing site presets:
//!
//! | tier            | duration | ease       | stagger x | parallax | scrub | scale |
//! |-----------------|----------|------------|-----------|----------|-------|-------|
//! | low performance | 0.5      | power1.out | 0.3       | 0        | 0.2   | 0.05  |
//! | mobile          | 0.8      | power2.out | 0.6       | 0.3      | 0.5   | 0.10  |
//! | desktop         | 1.2      | power3.out | 1.2       | 1.0      | 1.0   | 0.15  |
//!
//! Tables loaded from configuration are validated for range and ordering,
//! and every derived value is clamped again so an out-of-range reading can
//! never leak into an animation.

use cadence_platform::{DeviceClassification, DeviceProfile, DeviceTier};
use serde::{Deserialize, Serialize};

use crate::easing::Ease;
use crate::error::{MotionError, Result};

/// Floor (seconds) for table durations, also used for non-positive overrides
pub const MIN_DURATION: f32 = 0.01;

/// Scroll sync interval on iOS (ms)
pub const IOS_SYNC_INTERVAL_MS: f32 = 100.0;

/// Scroll sync interval elsewhere (ms), roughly 30Hz
pub const DEFAULT_SYNC_INTERVAL_MS: f32 = 33.3;

/// One row of the settings table
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct TierSettings {
    /// Base duration in seconds
    pub duration: f32,
    pub ease: Ease,
    /// Factor applied to caller-supplied stagger
    pub stagger_multiplier: f32,
    /// Parallax strength, 0.0 (off) to 1.0 (full)
    pub parallax_intensity: f32,
    /// Scrub lag in seconds for scroll-scrubbed animations
    pub scrub_value: f32,
    /// Scale delta used by scale entrances
    pub scale_effect: f32,
    /// Travel distance (px) used by slide entrances
    pub travel_distance: f32,
}

impl TierSettings {
    pub const LOW_PERFORMANCE: Self = Self {
        duration: 0.5,
        ease: Ease::Power1Out,
        stagger_multiplier: 0.3,
        parallax_intensity: 0.0,
        scrub_value: 0.2,
        scale_effect: 0.05,
        travel_distance: 20.0,
    };

    pub const MOBILE: Self = Self {
        duration: 0.8,
        ease: Ease::Power2Out,
        stagger_multiplier: 0.6,
        parallax_intensity: 0.3,
        scrub_value: 0.5,
        scale_effect: 0.1,
        travel_distance: 20.0,
    };

    pub const DESKTOP: Self = Self {
        duration: 1.2,
        ease: Ease::Power3Out,
        stagger_multiplier: 1.2,
        parallax_intensity: 1.0,
        scrub_value: 1.0,
        scale_effect: 0.15,
        travel_distance: 80.0,
    };

    /// Replace non-finite readings with `fallback` and clamp into range
    fn sanitized(&self, fallback: &TierSettings) -> TierSettings {
        let pick = |value: f32, default: f32| if value.is_finite() { value } else { default };
        TierSettings {
            duration: if self.duration.is_finite() && self.duration > 0.0 {
                self.duration.max(MIN_DURATION)
            } else {
                fallback.duration
            },
            ease: self.ease,
            stagger_multiplier: pick(self.stagger_multiplier, fallback.stagger_multiplier)
                .max(0.0),
            parallax_intensity: pick(self.parallax_intensity, fallback.parallax_intensity)
                .clamp(0.0, 1.0),
            scrub_value: pick(self.scrub_value, fallback.scrub_value).max(0.0),
            scale_effect: pick(self.scale_effect, fallback.scale_effect).clamp(0.0, 1.0),
            travel_distance: pick(self.travel_distance, fallback.travel_distance).max(0.0),
        }
    }

    fn check(&self, tier: &str) -> Result<()> {
        let invalid = |what: &str| Err(MotionError::InvalidSettings(format!("{tier}: {what}")));
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return invalid("duration must be a positive number");
        }
        if !(0.0..=1.0).contains(&self.parallax_intensity) {
            return invalid("parallax_intensity must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&self.scale_effect) {
            return invalid("scale_effect must be within 0..=1");
        }
        for (name, value) in [
            ("stagger_multiplier", self.stagger_multiplier),
            ("scrub_value", self.scrub_value),
            ("travel_distance", self.travel_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(&format!("{name} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

/// Tier-indexed settings table
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsTable {
    pub low_performance: TierSettings,
    pub mobile: TierSettings,
    pub desktop: TierSettings,
}

impl Default for SettingsTable {
    fn default() -> Self {
        Self {
            low_performance: TierSettings::LOW_PERFORMANCE,
            mobile: TierSettings::MOBILE,
            desktop: TierSettings::DESKTOP,
        }
    }
}

impl SettingsTable {
    /// Check ranges and the ordering between tiers
    ///
    /// Durations must not shrink from low performance to desktop, low
    /// performance parallax must be off, and mobile parallax must be on but
    /// no stronger than desktop.
    pub fn validate(&self) -> Result<()> {
        self.low_performance.check("low_performance")?;
        self.mobile.check("mobile")?;
        self.desktop.check("desktop")?;

        if self.low_performance.duration > self.mobile.duration
            || self.mobile.duration > self.desktop.duration
        {
            return Err(MotionError::InvalidSettings(
                "durations must not decrease from low_performance to mobile to desktop".into(),
            ));
        }
        if self.low_performance.parallax_intensity != 0.0 {
            return Err(MotionError::InvalidSettings(
                "low_performance parallax_intensity must be 0".into(),
            ));
        }
        if self.mobile.parallax_intensity <= 0.0
            || self.mobile.parallax_intensity > self.desktop.parallax_intensity
        {
            return Err(MotionError::InvalidSettings(
                "mobile parallax_intensity must be above 0 and at most the desktop value".into(),
            ));
        }
        Ok(())
    }

    /// Clamped row for a tier
    pub fn row(&self, tier: DeviceTier) -> TierSettings {
        match tier {
            DeviceTier::LowPerformance => {
                let mut row = self.low_performance.sanitized(&TierSettings::LOW_PERFORMANCE);
                row.parallax_intensity = 0.0;
                row
            }
            DeviceTier::Mobile => self.mobile.sanitized(&TierSettings::MOBILE),
            DeviceTier::Desktop => self.desktop.sanitized(&TierSettings::DESKTOP),
        }
    }

    /// Derive the settings bundle for a classification
    pub fn derive(&self, classification: DeviceClassification) -> AnimationSettings {
        let row = self.row(classification.tier());
        let low = classification.is_low_performance;
        let mobile = classification.is_mobile;

        AnimationSettings {
            duration: row.duration,
            ease: row.ease,
            stagger_multiplier: row.stagger_multiplier,
            parallax_intensity: row.parallax_intensity,
            scrub_value: row.scrub_value,
            scale_effect: row.scale_effect,
            travel_distance: row.travel_distance,
            force_3d: mobile || low,
            disable_parallax: low,
            simplify_scroll: low || mobile,
            use_simple_animations: low,
            skip_secondary_animations: low,
            allow_complex_animations: !mobile && !low,
        }
    }

    /// Derive settings plus scroll tuning for a full device profile
    pub fn resolve(&self, profile: &DeviceProfile) -> AdaptiveSettings {
        let settings = self.derive(profile.classification);
        AdaptiveSettings {
            profile: *profile,
            settings,
            scroll: ScrollSettings {
                ignore_mobile_resize: settings.simplify_scroll,
                sync_interval_ms: if profile.traits.is_ios {
                    IOS_SYNC_INTERVAL_MS
                } else {
                    DEFAULT_SYNC_INTERVAL_MS
                },
            },
            enhanced_desktop: profile.traits.is_wide_desktop
                && !profile.classification.is_low_performance,
        }
    }
}

/// Derive settings from the built-in table
pub fn derive_settings(classification: DeviceClassification) -> AnimationSettings {
    SettingsTable::default().derive(classification)
}

/// Parameters every animation for a device starts from
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSettings {
    /// Duration in seconds, always above zero
    pub duration: f32,
    pub ease: Ease,
    pub stagger_multiplier: f32,
    /// 0.0 to 1.0
    pub parallax_intensity: f32,
    pub scrub_value: f32,
    pub scale_effect: f32,
    pub travel_distance: f32,
    pub force_3d: bool,
    pub disable_parallax: bool,
    /// Scroll-bound animations prevent overlaps and skip pinning on mobile
    pub simplify_scroll: bool,
    pub use_simple_animations: bool,
    pub skip_secondary_animations: bool,
    pub allow_complex_animations: bool,
}

impl AnimationSettings {
    /// Apply caller overrides; an override always wins but is still clamped
    /// into range
    pub fn with_overrides(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(duration) = overrides.duration.filter(|d| d.is_finite()) {
            self.duration = if duration > 0.0 { duration } else { MIN_DURATION };
        }
        if let Some(ease) = overrides.ease {
            self.ease = ease;
        }
        if let Some(value) = overrides.stagger_multiplier.filter(|v| v.is_finite()) {
            self.stagger_multiplier = value.max(0.0);
        }
        if let Some(value) = overrides.parallax_intensity.filter(|v| v.is_finite()) {
            self.parallax_intensity = value.clamp(0.0, 1.0);
        }
        if let Some(value) = overrides.scrub_value.filter(|v| v.is_finite()) {
            self.scrub_value = value.max(0.0);
        }
        if let Some(value) = overrides.scale_effect.filter(|v| v.is_finite()) {
            self.scale_effect = value.clamp(0.0, 1.0);
        }
        if let Some(force_3d) = overrides.force_3d {
            self.force_3d = force_3d;
        }
        self
    }
}

/// Per-request overrides of [`AnimationSettings`] fields
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SettingsOverrides {
    pub duration: Option<f32>,
    pub ease: Option<Ease>,
    pub stagger_multiplier: Option<f32>,
    pub parallax_intensity: Option<f32>,
    pub scrub_value: Option<f32>,
    pub scale_effect: Option<f32>,
    pub force_3d: Option<bool>,
}

/// Scroll engine tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSettings {
    /// Skip binding refresh when only the viewport height changed
    /// (mobile address bar show/hide)
    pub ignore_mobile_resize: bool,
    /// Minimum interval between scroll position syncs
    pub sync_interval_ms: f32,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            ignore_mobile_resize: false,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
        }
    }
}

/// Everything derived from one device profile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveSettings {
    pub profile: DeviceProfile,
    pub settings: AnimationSettings,
    pub scroll: ScrollSettings,
    /// Wide, capable desktop: pinning and dramatic parallax allowed
    pub enhanced_desktop: bool,
}

impl AdaptiveSettings {
    pub fn classification(&self) -> DeviceClassification {
        self.profile.classification
    }

    /// Settings for a bare classification with default traits
    pub fn for_classification(classification: DeviceClassification) -> Self {
        SettingsTable::default().resolve(&DeviceProfile {
            classification,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_platform::DeviceTraits;

    const ALL: [DeviceClassification; 4] = [
        DeviceClassification {
            is_mobile: false,
            is_low_performance: false,
        },
        DeviceClassification {
            is_mobile: true,
            is_low_performance: false,
        },
        DeviceClassification {
            is_mobile: false,
            is_low_performance: true,
        },
        DeviceClassification {
            is_mobile: true,
            is_low_performance: true,
        },
    ];

    #[test]
    fn test_defaults_are_valid() {
        SettingsTable::default().validate().unwrap();
    }

    #[test]
    fn test_derive_is_deterministic() {
        for c in ALL {
            let a = derive_settings(c);
            let b = derive_settings(c);
            assert_eq!(a, b);
            assert_eq!(a.duration.to_bits(), b.duration.to_bits());
            assert_eq!(a.parallax_intensity.to_bits(), b.parallax_intensity.to_bits());
        }
    }

    #[test]
    fn test_monotonic_durations() {
        let desktop = derive_settings(DeviceClassification::DESKTOP);
        let mobile = derive_settings(DeviceClassification::MOBILE);
        for low in [ALL[2], ALL[3]] {
            assert!(mobile.duration > derive_settings(low).duration);
        }
        assert!(desktop.duration > mobile.duration);
    }

    #[test]
    fn test_monotonic_parallax() {
        let desktop = derive_settings(DeviceClassification::DESKTOP);
        let mobile = derive_settings(DeviceClassification::MOBILE);
        let low = derive_settings(DeviceClassification::new(true, true));
        assert_eq!(low.parallax_intensity, 0.0);
        assert!(mobile.parallax_intensity > 0.0);
        assert!(mobile.parallax_intensity <= desktop.parallax_intensity);
        assert_eq!(desktop.parallax_intensity, 1.0);
    }

    #[test]
    fn test_flags() {
        let desktop = derive_settings(DeviceClassification::DESKTOP);
        assert!(!desktop.force_3d);
        assert!(desktop.allow_complex_animations);
        assert!(!desktop.simplify_scroll);

        let mobile = derive_settings(DeviceClassification::MOBILE);
        assert!(mobile.force_3d);
        assert!(mobile.simplify_scroll);
        assert!(!mobile.use_simple_animations);

        let low = derive_settings(DeviceClassification::new(false, true));
        assert!(low.force_3d);
        assert!(low.disable_parallax);
        assert!(low.skip_secondary_animations);
        assert_eq!(low.ease, Ease::Power1Out);
    }

    #[test]
    fn test_out_of_range_rows_are_clamped() {
        let table = SettingsTable {
            low_performance: TierSettings {
                parallax_intensity: 0.7,
                duration: -1.0,
                ..TierSettings::LOW_PERFORMANCE
            },
            mobile: TierSettings {
                parallax_intensity: 4.0,
                scrub_value: f32::NAN,
                ..TierSettings::MOBILE
            },
            desktop: TierSettings {
                duration: f32::INFINITY,
                stagger_multiplier: -3.0,
                ..TierSettings::DESKTOP
            },
        };
        assert!(table.validate().is_err());

        let low = table.derive(DeviceClassification::new(false, true));
        assert_eq!(low.parallax_intensity, 0.0);
        assert_eq!(low.duration, TierSettings::LOW_PERFORMANCE.duration);

        let mobile = table.derive(DeviceClassification::MOBILE);
        assert_eq!(mobile.parallax_intensity, 1.0);
        assert_eq!(mobile.scrub_value, TierSettings::MOBILE.scrub_value);

        let desktop = table.derive(DeviceClassification::DESKTOP);
        assert_eq!(desktop.duration, TierSettings::DESKTOP.duration);
        assert_eq!(desktop.stagger_multiplier, 0.0);
    }

    #[test]
    fn test_validate_rejects_inverted_durations() {
        let table = SettingsTable {
            mobile: TierSettings {
                duration: 2.0,
                ..TierSettings::MOBILE
            },
            ..Default::default()
        };
        assert!(matches!(
            table.validate(),
            Err(MotionError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_validate_rejects_mobile_parallax_off() {
        let table = SettingsTable {
            mobile: TierSettings {
                parallax_intensity: 0.0,
                ..TierSettings::MOBILE
            },
            ..Default::default()
        };
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_override_wins() {
        for c in ALL {
            let overrides = SettingsOverrides {
                duration: Some(2.75),
                ease: Some(Ease::Linear),
                ..Default::default()
            };
            let settings = derive_settings(c).with_overrides(&overrides);
            assert_eq!(settings.duration, 2.75);
            assert_eq!(settings.ease, Ease::Linear);
        }
    }

    #[test]
    fn test_short_duration_override_is_kept() {
        for duration in [0.005, 0.0001] {
            let overrides = SettingsOverrides {
                duration: Some(duration),
                ..Default::default()
            };
            let settings = derive_settings(DeviceClassification::MOBILE).with_overrides(&overrides);
            assert_eq!(settings.duration, duration);
        }
        let negative = SettingsOverrides {
            duration: Some(-1.0),
            ..Default::default()
        };
        let settings = derive_settings(DeviceClassification::MOBILE).with_overrides(&negative);
        assert_eq!(settings.duration, MIN_DURATION);
    }

    #[test]
    fn test_overrides_stay_in_range() {
        let overrides = SettingsOverrides {
            duration: Some(0.0),
            parallax_intensity: Some(5.0),
            scrub_value: Some(f32::NAN),
            ..Default::default()
        };
        let settings = derive_settings(DeviceClassification::DESKTOP).with_overrides(&overrides);
        assert_eq!(settings.duration, MIN_DURATION);
        assert_eq!(settings.parallax_intensity, 1.0);
        assert_eq!(settings.scrub_value, 1.0);
    }

    #[test]
    fn test_resolve_scroll_tuning() {
        let table = SettingsTable::default();
        let ios = DeviceProfile {
            classification: DeviceClassification::MOBILE,
            traits: DeviceTraits {
                is_ios: true,
                is_touch: true,
                is_wide_desktop: false,
            },
            viewport_height: Some(844.0),
        };
        let resolved = table.resolve(&ios);
        assert_eq!(resolved.scroll.sync_interval_ms, IOS_SYNC_INTERVAL_MS);
        assert!(resolved.scroll.ignore_mobile_resize);
        assert!(!resolved.enhanced_desktop);

        let wide = DeviceProfile {
            classification: DeviceClassification::DESKTOP,
            traits: DeviceTraits {
                is_wide_desktop: true,
                ..Default::default()
            },
            viewport_height: Some(900.0),
        };
        let resolved = table.resolve(&wide);
        assert_eq!(resolved.scroll.sync_interval_ms, DEFAULT_SYNC_INTERVAL_MS);
        assert!(!resolved.scroll.ignore_mobile_resize);
        assert!(resolved.enhanced_desktop);
    }
}
