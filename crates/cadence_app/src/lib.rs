//! Cadence Session Layer
//!
//! Ties classification and animation together for a host application:
//!
//! - [`CadenceConfig`]: `cadence.toml` loading and validation
//! - [`MotionContext`]: per-session settings and engine, reachable through [`use_motion`]
//! - [`ClassificationWatcher`]: debounced re-classification on resize and orientation change
//! - [`ViewScope`]: cancels a view's animations when it unmounts
//! - [`init_logging`]: `tracing` subscriber setup
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cadence_animation::{AnimationIntent, AnimationRequest, Region};
//! use cadence_app::{use_motion, MotionContext};
//! use cadence_platform::{EnvironmentSignals, StaticSignals};
//!
//! let source = Arc::new(StaticSignals::new(EnvironmentSignals::phone()));
//! let context = MotionContext::new(source);
//! let _session = context.install();
//!
//! let mut view = use_motion().view_scope();
//! let card = view.mount(Region::new(1200.0, 300.0));
//! let handle = view.create_animation(AnimationRequest::new(card, AnimationIntent::SlideUp));
//! assert_eq!(handle.duration(), 0.8);
//!
//! view.unmount();
//! assert!(handle.is_finished());
//! ```

pub mod config;
pub mod context;
pub mod logging;
pub mod view;
pub mod watcher;

pub use config::{load_config_file, load_config_or_default, CadenceConfig, ConfigError, CONFIG_FILE};
pub use context::{try_use_motion, use_motion, MotionContext, SessionGuard};
pub use logging::{init_logging, init_logging_with};
pub use view::ViewScope;
pub use watcher::{
    ChangeHandler, ClassificationWatcher, EnvironmentEvent, SubscriptionId, WatcherConfig,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{try_use_motion, use_motion, MotionContext};
    pub use crate::view::ViewScope;
    pub use crate::watcher::EnvironmentEvent;
    pub use cadence_animation::prelude::*;
    pub use cadence_platform::prelude::*;
}
