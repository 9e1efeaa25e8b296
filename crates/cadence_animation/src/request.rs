//! Animation requests
//!
//! An [`AnimationRequest`] describes *what* a view wants: which targets, which
//! entrance (or custom props), and optionally how the animation binds to
//! scrolling. The engine decides *how* based on the device settings.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::easing::Ease;
use crate::settings::{AnimationSettings, SettingsOverrides};
use crate::stage::{Props, TargetId};

/// Callback fired on animation start or completion
pub type AnimationCallback = Box<dyn FnMut() + Send>;

/// Preset entrance, or explicit props
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationIntent {
    Fade,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    Scale,
    Custom(Props),
}

impl AnimationIntent {
    /// Offset (hidden) props for this intent under the given settings
    ///
    /// Slides travel `travel_distance`; scale starts at `1 - scale_effect`.
    pub fn props(&self, settings: &AnimationSettings) -> Props {
        let distance = settings.travel_distance;
        let hidden = Props::new().opacity(0.0);
        match *self {
            AnimationIntent::Fade => hidden,
            AnimationIntent::SlideUp => hidden.y(distance),
            AnimationIntent::SlideDown => hidden.y(-distance),
            AnimationIntent::SlideLeft => hidden.x(distance),
            AnimationIntent::SlideRight => hidden.x(-distance),
            AnimationIntent::Scale => hidden.scale(1.0 - settings.scale_effect),
            AnimationIntent::Custom(props) => props,
        }
    }
}

/// Which end of the tween the props describe
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Animate from the props to the target's current state (entrance)
    #[default]
    From,
    /// Animate from the current state to the props
    To,
}

/// Scroll scrubbing mode
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Scrub {
    /// Scrolling past the start marker plays the animation once
    #[default]
    Off,
    /// Progress follows scroll, smoothed by the device's scrub value
    On,
    /// Progress follows scroll with an explicit lag in seconds
    Lag(f32),
}

/// How an animation binds to scrolling
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrollBindingSpec {
    /// Element whose region defines the scroll range; defaults to the target
    pub trigger: Option<TargetId>,
    /// Start marker, e.g. `"top 80%"`; defaults depend on the device
    pub start: Option<String>,
    /// End marker, e.g. `"bottom 20%"`; defaults depend on the device
    pub end: Option<String>,
    pub scrub: Scrub,
    /// Hold the target in place while scrolling between the markers
    pub pin: bool,
    /// Parallax travel in px at full intensity
    pub parallax: Option<f32>,
    /// Release the binding once the animation completes
    pub once: bool,
}

impl ScrollBindingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(mut self, trigger: TargetId) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn start(mut self, marker: impl Into<String>) -> Self {
        self.start = Some(marker.into());
        self
    }

    pub fn end(mut self, marker: impl Into<String>) -> Self {
        self.end = Some(marker.into());
        self
    }

    pub fn scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }

    pub fn pin(mut self) -> Self {
        self.pin = true;
        self
    }

    pub fn parallax(mut self, distance: f32) -> Self {
        self.parallax = Some(distance);
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// Whether an animation carries content or decoration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Primary,
    /// Decorative; skipped on low-performance devices
    Secondary,
}

/// A request to animate one or more targets
pub struct AnimationRequest {
    pub targets: SmallVec<[TargetId; 4]>,
    pub intent: AnimationIntent,
    pub direction: Direction,
    /// Delay before the first target starts, in seconds
    pub delay: f32,
    /// Delay between consecutive targets, before the device multiplier
    pub stagger: f32,
    pub overrides: SettingsOverrides,
    pub scroll: Option<ScrollBindingSpec>,
    pub layer: Layer,
    pub on_start: Option<AnimationCallback>,
    pub on_complete: Option<AnimationCallback>,
}

impl AnimationRequest {
    pub fn new(target: TargetId, intent: AnimationIntent) -> Self {
        Self {
            targets: smallvec![target],
            intent,
            direction: Direction::default(),
            delay: 0.0,
            stagger: 0.0,
            overrides: SettingsOverrides::default(),
            scroll: None,
            layer: Layer::default(),
            on_start: None,
            on_complete: None,
        }
    }

    /// Animate several targets with the same intent
    pub fn group(targets: impl IntoIterator<Item = TargetId>, intent: AnimationIntent) -> Self {
        let mut request = Self::new(TargetId::default(), intent);
        request.targets = targets.into_iter().collect();
        request
    }

    pub fn with_target(mut self, target: TargetId) -> Self {
        self.targets.push(target);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds;
        self
    }

    pub fn stagger(mut self, seconds: f32) -> Self {
        self.stagger = seconds;
        self
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.overrides.duration = Some(seconds);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.overrides.ease = Some(ease);
        self
    }

    pub fn overrides(mut self, overrides: SettingsOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn scroll(mut self, spec: ScrollBindingSpec) -> Self {
        self.scroll = Some(spec);
        self
    }

    pub fn secondary(mut self) -> Self {
        self.layer = Layer::Secondary;
        self
    }

    pub fn on_start<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_start = Some(Box::new(callback));
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for AnimationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationRequest")
            .field("targets", &self.targets)
            .field("intent", &self.intent)
            .field("direction", &self.direction)
            .field("delay", &self.delay)
            .field("stagger", &self.stagger)
            .field("overrides", &self.overrides)
            .field("scroll", &self.scroll)
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}
