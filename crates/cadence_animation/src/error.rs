//! Error types for cadence_animation

use thiserror::Error;

use crate::stage::TargetId;

/// Errors raised inside the animation layer
///
/// Request-time failures never reach callers of
/// [`AnimationEngine::create_animation`](crate::AnimationEngine::create_animation);
/// they are logged and recovered there. Settings and parse errors surface
/// through configuration loading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The animated target is not mounted on the stage
    #[error("target {0:?} is not mounted")]
    TargetNotMounted(TargetId),

    /// The request names no targets
    #[error("animation request has no targets")]
    EmptyRequest,

    /// The scroll trigger element is not mounted on the stage
    #[error("scroll trigger {0:?} is not mounted")]
    TriggerNotMounted(TargetId),

    /// A scroll marker string could not be parsed
    #[error("invalid scroll marker `{marker}`: {reason}")]
    InvalidMarker { marker: String, reason: String },

    /// Unknown easing curve name
    #[error("unknown ease curve `{0}`")]
    UnknownEase(String),

    /// A settings table breaks range or ordering rules
    #[error("invalid animation settings: {0}")]
    InvalidSettings(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, MotionError>;
