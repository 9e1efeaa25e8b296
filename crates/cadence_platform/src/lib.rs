//! Cadence Platform Layer
//!
//! Environment signals and device capability classification.
//!
//! The host exposes its runtime through the [`SignalSource`] trait; the
//! [`Classifier`] turns a snapshot into a [`DeviceClassification`] that the
//! animation layer uses to pick presets.
//!
//! # Example
//!
//! ```rust
//! use cadence_platform::{classify, EnvironmentSignals};
//!
//! let signals = EnvironmentSignals::new()
//!     .with_viewport(390.0, 844.0)
//!     .with_memory(2.0);
//!
//! let classification = classify(&signals);
//! assert!(classification.is_mobile);
//! assert!(classification.is_low_performance);
//! ```

mod classifier;
mod error;
mod signals;

pub use classifier::{
    classify, Classifier, ClassifierConfig, DeviceClassification, DeviceProfile, DeviceTier,
    DeviceTraits, IOS_USER_AGENTS, LEGACY_IOS_VERSIONS, MOBILE_USER_AGENTS,
};
pub use error::{PlatformError, Result};
pub use signals::{BatteryStatus, EnvironmentSignals, SignalSource, StaticSignals};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classifier::{classify, Classifier, DeviceClassification, DeviceTier};
    pub use crate::error::{PlatformError, Result};
    pub use crate::signals::{EnvironmentSignals, SignalSource, StaticSignals};
}
