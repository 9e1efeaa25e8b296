//! Cadence Animation Layer
//!
//! Device-adaptive animation presets and the engine that plays them.
//!
//! # Features
//!
//! - **Adaptive Settings**: Duration, easing, stagger, parallax and scrub tuned per device tier
//! - **Entrances**: Fade, slide and scale presets sized for the device
//! - **Scroll Bindings**: Marker-based triggers with scrubbing, pinning and parallax
//! - **Cancellable Handles**: Idempotent cancel that releases scroll bindings
//! - **Graceful Failure**: Bad requests leave their targets visible instead of erroring
//!
//! # Example
//!
//! ```rust
//! use cadence_animation::prelude::*;
//! use cadence_platform::DeviceClassification;
//!
//! let engine = AnimationEngine::new();
//! let hero = engine.mount(Region::new(0.0, 400.0));
//!
//! let settings = AdaptiveSettings::for_classification(DeviceClassification::DESKTOP);
//! let handle = engine.create_animation(
//!     AnimationRequest::new(hero, AnimationIntent::SlideUp),
//!     &settings,
//! );
//! assert_eq!(handle.duration(), 1.2);
//!
//! while engine.tick(1.0 / 60.0) {}
//! assert_eq!(handle.state(), AnimationState::Completed);
//! ```

pub mod easing;
pub mod engine;
pub mod error;
pub mod marker;
pub mod request;
pub mod settings;
pub mod stage;

pub use easing::Ease;
pub use engine::{
    AnimationEngine, AnimationHandle, AnimationId, AnimationState, BindingId, EngineHandle,
    DESKTOP_END, DESKTOP_START, MOBILE_END, MOBILE_START,
};
pub use error::{MotionError, Result};
pub use marker::{Anchor, ScrollMarker};
pub use request::{
    AnimationCallback, AnimationIntent, AnimationRequest, Direction, Layer, Scrub,
    ScrollBindingSpec,
};
pub use settings::{
    derive_settings, AdaptiveSettings, AnimationSettings, ScrollSettings, SettingsOverrides,
    SettingsTable, TierSettings, DEFAULT_SYNC_INTERVAL_MS, IOS_SYNC_INTERVAL_MS, MIN_DURATION,
};
pub use stage::{ElementState, Props, Region, TargetId};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::easing::Ease;
    pub use crate::engine::{AnimationEngine, AnimationHandle, AnimationState};
    pub use crate::request::{AnimationIntent, AnimationRequest, Direction, Scrub, ScrollBindingSpec};
    pub use crate::settings::{AdaptiveSettings, AnimationSettings};
    pub use crate::stage::{ElementState, Region, TargetId};
}
