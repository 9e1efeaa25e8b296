//! Animation engine
//!
//! Owns the stage (mounted targets), every in-flight animation and the
//! registry of scroll-bindings. Nothing here runs on its own: the host drives
//! playback from its UI loop with [`AnimationEngine::tick`] and feeds scroll
//! positions with [`AnimationEngine::scroll_to`].
//!
//! Creating an animation never fails from the caller's point of view. A
//! request that cannot be honored (unmounted target, bad marker) resets its
//! targets to the visible resting state, logs a warning and hands back an
//! inert, already cancelled handle.
//!
//! # Ownership rules
//!
//! - Last writer wins: a new animation on a target cancels the animation
//!   currently driving it.
//! - A scroll-binding is registered when its animation is created and
//!   deregistered when that animation completes or is cancelled. Nothing
//!   else adds or removes bindings.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::easing::Ease;
use crate::error::{MotionError, Result};
use crate::marker::{Anchor, ScrollMarker};
use crate::request::{AnimationCallback, AnimationRequest, Direction, Layer, Scrub};
use crate::settings::{AdaptiveSettings, AnimationSettings, ScrollSettings};
use crate::stage::{ElementState, Region, TargetId};

new_key_type! {
    /// Handle to a registered animation
    pub struct AnimationId;
    /// Handle to a registered scroll-binding
    pub struct BindingId;
}

/// Default start marker on mobile: element top at 80% of the viewport
pub const MOBILE_START: ScrollMarker = ScrollMarker {
    element: Anchor::Start,
    viewport: Anchor::Percent(0.8),
};

/// Default end marker on mobile: element bottom at 20% of the viewport
pub const MOBILE_END: ScrollMarker = ScrollMarker {
    element: Anchor::End,
    viewport: Anchor::Percent(0.2),
};

/// Default start marker on desktop: element top at 85% of the viewport
pub const DESKTOP_START: ScrollMarker = ScrollMarker {
    element: Anchor::Start,
    viewport: Anchor::Percent(0.85),
};

/// Default end marker on desktop: element center at viewport center
pub const DESKTOP_END: ScrollMarker = ScrollMarker {
    element: Anchor::Center,
    viewport: Anchor::Center,
};

/// Viewport height assumed until the host reports one
const DEFAULT_VIEWPORT_HEIGHT: f32 = 800.0;

// ============================================================================
// Animation State Machine
// ============================================================================

/// Lifecycle of an animation
///
/// `Pending -> Running -> {Completed | Cancelled}`, with `Cancelled` also
/// reachable straight from `Pending`. Both end states are terminal.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Created, waiting for its first frame or its scroll trigger
    Pending = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

impl AnimationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationState::Completed | AnimationState::Cancelled)
    }

    pub fn can_transition_to(self, next: AnimationState) -> bool {
        use AnimationState::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Cancelled) | (Running, Completed) | (Running, Cancelled)
        )
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => AnimationState::Pending,
            1 => AnimationState::Running,
            2 => AnimationState::Completed,
            _ => AnimationState::Cancelled,
        }
    }
}

/// State shared between the engine and every handle to one animation
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Arc<Self> {
        Arc::new(Self(AtomicU8::new(AnimationState::Pending as u8)))
    }

    fn get(&self) -> AnimationState {
        AnimationState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if the state machine allows it
    fn transition(&self, next: AnimationState) -> bool {
        let mut current = self.get();
        loop {
            if !current.can_transition_to(next) {
                return false;
            }
            match self.0.compare_exchange(
                current as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = AnimationState::from_u8(actual),
            }
        }
    }
}

// ============================================================================
// Engine Internals
// ============================================================================

struct Element {
    region: Region,
    state: ElementState,
}

/// One target's tween inside an animation
#[derive(Clone, Copy, Debug)]
struct Track {
    target: TargetId,
    from: ElementState,
    to: ElementState,
    delay: f32,
}

impl Track {
    fn progress(&self, elapsed: f32, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 1.0;
        }
        ((elapsed - self.delay) / duration).clamp(0.0, 1.0)
    }
}

struct ActiveAnimation {
    state: Arc<StateCell>,
    tracks: SmallVec<[Track; 4]>,
    duration: f32,
    ease: Ease,
    elapsed: f32,
    binding: Option<BindingId>,
    /// Progress comes from the binding instead of the clock
    scrubbed: bool,
    /// Clock playback waits for the binding's start marker
    awaiting_trigger: bool,
    on_start: Option<AnimationCallback>,
    on_complete: Option<AnimationCallback>,
}

impl ActiveAnimation {
    fn total(&self) -> f32 {
        let last_delay = self.tracks.iter().map(|t| t.delay).fold(0.0, f32::max);
        last_delay + self.duration
    }
}

struct ScrollBinding {
    animation: AnimationId,
    trigger: TargetId,
    start_marker: ScrollMarker,
    end_marker: ScrollMarker,
    /// Scroll offsets resolved from the markers
    start: f32,
    end: f32,
    /// `None` when not scrubbed; otherwise the catch-up lag in seconds
    scrub_lag: Option<f32>,
    pin: bool,
    /// Parallax travel in px, intensity already applied
    parallax: f32,
    once: bool,
    /// Progress implied by the current scroll position
    target_progress: f32,
    /// Smoothed progress shown on screen
    progress: f32,
}

impl ScrollBinding {
    fn resolve(&mut self, trigger: Region, viewport_height: f32) {
        self.start = self.start_marker.scroll_position(trigger, viewport_height);
        self.end = self.end_marker.scroll_position(trigger, viewport_height);
    }

    fn raw_progress(&self, scroll_y: f32) -> f32 {
        if self.end > self.start {
            ((scroll_y - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
        } else if scroll_y >= self.start {
            1.0
        } else {
            0.0
        }
    }

    /// Vertical offset added on top of the tween (parallax drift, pin hold)
    fn offset(&self, scroll_y: f32) -> f32 {
        let pin = if self.pin {
            (scroll_y - self.start).clamp(0.0, (self.end - self.start).max(0.0))
        } else {
            0.0
        };
        self.parallax * self.target_progress + pin
    }
}

struct EngineInner {
    elements: SlotMap<TargetId, Element>,
    animations: SlotMap<AnimationId, ActiveAnimation>,
    bindings: SlotMap<BindingId, ScrollBinding>,
    /// Which animation currently drives each target
    owners: FxHashMap<TargetId, AnimationId>,
    viewport_width: f32,
    viewport_height: f32,
    scroll_y: f32,
    pending_scroll: Option<f32>,
    since_sync_ms: f32,
    scroll_settings: ScrollSettings,
}

type Callbacks = Vec<AnimationCallback>;

impl EngineInner {
    fn new() -> Self {
        Self {
            elements: SlotMap::with_key(),
            animations: SlotMap::with_key(),
            bindings: SlotMap::with_key(),
            owners: FxHashMap::default(),
            viewport_width: 0.0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_y: 0.0,
            pending_scroll: None,
            since_sync_ms: f32::MAX,
            scroll_settings: ScrollSettings::default(),
        }
    }

    /// Write the current frame of an animation into its targets
    fn render(&mut self, id: AnimationId) {
        let Some(anim) = self.animations.get(id) else {
            return;
        };
        let binding = anim.binding.and_then(|b| self.bindings.get(b));
        let offset = binding.map_or(0.0, |b| b.offset(self.scroll_y));
        let scroll_progress = binding.map_or(0.0, |b| b.progress);

        for track in &anim.tracks {
            let t = if anim.scrubbed {
                scroll_progress
            } else {
                track.progress(anim.elapsed, anim.duration)
            };
            let mut state = track.from.lerp(&track.to, anim.ease.apply(t));
            state.y += offset;
            if let Some(element) = self.elements.get_mut(track.target) {
                element.state = state;
            }
        }
    }

    /// Remove an animation, release its binding and settle its state
    fn finish(&mut self, id: AnimationId, outcome: AnimationState, callbacks: &mut Callbacks) {
        let Some(mut anim) = self.animations.remove(id) else {
            return;
        };
        if let Some(binding) = anim.binding.take() {
            self.bindings.remove(binding);
            tracing::debug!(?id, ?binding, "scroll binding released");
        }
        for track in &anim.tracks {
            if self.owners.get(&track.target) == Some(&id) {
                self.owners.remove(&track.target);
            }
        }
        if anim.state.transition(outcome) && outcome == AnimationState::Completed {
            callbacks.extend(anim.on_complete.take());
        }
    }

    fn start(&mut self, id: AnimationId, callbacks: &mut Callbacks) {
        if let Some(anim) = self.animations.get_mut(id) {
            if anim.state.transition(AnimationState::Running) {
                callbacks.extend(anim.on_start.take());
            }
        }
    }

    fn advance(&mut self, id: AnimationId, dt: f32, callbacks: &mut Callbacks) {
        let Some(anim) = self.animations.get(id) else {
            return;
        };
        if anim.scrubbed {
            let Some(binding) = anim.binding.and_then(|b| self.bindings.get_mut(b)) else {
                return;
            };
            let lag = binding.scrub_lag.unwrap_or(0.0);
            if lag <= 0.0 {
                binding.progress = binding.target_progress;
            } else {
                let step = (dt / lag).min(1.0);
                binding.progress += (binding.target_progress - binding.progress) * step;
                if (binding.target_progress - binding.progress).abs() < 1e-4 {
                    binding.progress = binding.target_progress;
                }
            }
            self.settle_scrubbed(id, callbacks);
            return;
        }

        if anim.awaiting_trigger {
            return;
        }
        self.start(id, callbacks);
        let Some(anim) = self.animations.get_mut(id) else {
            return;
        };
        anim.elapsed += dt;
        let done = anim.elapsed >= anim.total();
        self.render(id);
        if done {
            self.finish(id, AnimationState::Completed, callbacks);
        }
    }

    /// Render a scrubbed animation and apply its state changes
    fn settle_scrubbed(&mut self, id: AnimationId, callbacks: &mut Callbacks) {
        let Some(anim) = self.animations.get(id) else {
            return;
        };
        let Some(binding) = anim.binding.and_then(|b| self.bindings.get(b)) else {
            return;
        };
        let progress = binding.progress;
        let once = binding.once;

        if progress > 0.0 {
            self.start(id, callbacks);
        }
        self.render(id);
        if once && progress >= 1.0 {
            self.finish(id, AnimationState::Completed, callbacks);
        }
    }

    /// Re-evaluate one binding against the current scroll position
    fn sync_binding(&mut self, binding_id: BindingId, callbacks: &mut Callbacks) {
        let scroll_y = self.scroll_y;
        let Some(binding) = self.bindings.get_mut(binding_id) else {
            return;
        };
        binding.target_progress = binding.raw_progress(scroll_y);
        let id = binding.animation;
        let immediate = binding.scrub_lag.is_some_and(|lag| lag <= 0.0);
        if immediate {
            binding.progress = binding.target_progress;
        }
        let start = binding.start;

        let Some(anim) = self.animations.get_mut(id) else {
            return;
        };
        if anim.scrubbed {
            self.settle_scrubbed(id, callbacks);
        } else {
            if anim.awaiting_trigger && scroll_y >= start {
                anim.awaiting_trigger = false;
                tracing::debug!(?id, scroll_y, "scroll trigger entered");
            }
            self.render(id);
        }
    }

    fn flush_scroll(&mut self, callbacks: &mut Callbacks) {
        let Some(scroll_y) = self.pending_scroll.take() else {
            return;
        };
        self.scroll_y = scroll_y;
        self.since_sync_ms = 0.0;
        let ids: Vec<BindingId> = self.bindings.keys().collect();
        for id in ids {
            self.sync_binding(id, callbacks);
        }
    }

    /// Recompute every binding's scroll range from its trigger region
    fn refresh(&mut self, callbacks: &mut Callbacks) {
        let viewport_height = self.viewport_height;
        let mut orphaned = Vec::new();
        for (_, binding) in self.bindings.iter_mut() {
            match self.elements.get(binding.trigger) {
                Some(trigger) => binding.resolve(trigger.region, viewport_height),
                None => orphaned.push(binding.animation),
            }
        }
        for id in orphaned {
            tracing::debug!(?id, "scroll trigger unmounted; cancelling animation");
            self.finish(id, AnimationState::Cancelled, callbacks);
        }
        let ids: Vec<BindingId> = self.bindings.keys().collect();
        for id in ids {
            self.sync_binding(id, callbacks);
        }
    }

    /// Detach `target` from the animation currently driving it
    ///
    /// Other targets of a group animation keep playing. The animation is
    /// cancelled only once it has no targets left.
    fn supersede(&mut self, target: TargetId, callbacks: &mut Callbacks) {
        let Some(previous) = self.owners.remove(&target) else {
            return;
        };
        let Some(anim) = self.animations.get_mut(previous) else {
            return;
        };
        anim.tracks.retain(|track| track.target != target);
        if anim.tracks.is_empty() {
            tracing::debug!(?previous, ?target, "superseding in-flight animation");
            self.finish(previous, AnimationState::Cancelled, callbacks);
        } else {
            tracing::debug!(?previous, ?target, "target detached from group animation");
        }
    }

    /// Resting state a target is heading to, looking through any in-flight tween
    fn settled_state(&self, target: TargetId) -> Option<ElementState> {
        let current = self.elements.get(target)?.state;
        let destination = self
            .owners
            .get(&target)
            .and_then(|id| self.animations.get(*id))
            .and_then(|anim| anim.tracks.iter().find(|t| t.target == target))
            .map(|track| track.to);
        Some(destination.unwrap_or(current))
    }

    fn has_active(&self) -> bool {
        self.animations.iter().any(|(_, anim)| {
            if anim.scrubbed {
                anim.binding
                    .and_then(|b| self.bindings.get(b))
                    .is_some_and(|b| b.progress != b.target_progress)
            } else {
                !anim.awaiting_trigger
            }
        })
    }
}

fn lock(inner: &Mutex<EngineInner>) -> MutexGuard<'_, EngineInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run(callbacks: Callbacks) {
    for mut callback in callbacks {
        callback();
    }
}

// ============================================================================
// Public Engine
// ============================================================================

/// The animation engine
///
/// Cheap to clone; clones share the same stage and registry.
///
/// ```ignore
/// let engine = AnimationEngine::new();
/// let hero = engine.mount(Region::new(0.0, 600.0));
///
/// let settings = AdaptiveSettings::for_classification(classification);
/// let handle = engine.create_animation(
///     AnimationRequest::new(hero, AnimationIntent::SlideUp),
///     &settings,
/// );
///
/// // From the UI loop
/// engine.tick(frame_dt);
/// let state = engine.element_state(hero);
/// ```
#[derive(Clone)]
pub struct AnimationEngine {
    inner: Arc<Mutex<EngineInner>>,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner::new())),
        }
    }

    /// Weak handle for passing to components
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        lock(&self.inner)
    }

    /// Apply scroll tuning derived from the current device
    pub fn configure(&self, scroll: ScrollSettings) {
        self.lock().scroll_settings = scroll;
    }

    pub fn scroll_settings(&self) -> ScrollSettings {
        self.lock().scroll_settings
    }

    // =========================================================================
    // Stage
    // =========================================================================

    /// Mount a target at its document region
    pub fn mount(&self, region: Region) -> TargetId {
        self.lock().elements.insert(Element {
            region,
            state: ElementState::RESTING,
        })
    }

    /// Unmount a target, detaching it from the animation driving it and
    /// cancelling any animation that uses it as a scroll trigger
    pub fn unmount(&self, target: TargetId) {
        let mut callbacks = Callbacks::new();
        {
            let mut inner = self.lock();
            inner.supersede(target, &mut callbacks);
            if inner.elements.remove(target).is_some() {
                inner.refresh(&mut callbacks);
            }
        }
        run(callbacks);
    }

    pub fn is_mounted(&self, target: TargetId) -> bool {
        self.lock().elements.contains_key(target)
    }

    /// Move a target (after layout changes) and re-resolve bindings
    pub fn set_region(&self, target: TargetId, region: Region) {
        let mut callbacks = Callbacks::new();
        {
            let mut inner = self.lock();
            let Some(element) = inner.elements.get_mut(target) else {
                return;
            };
            element.region = region;
            inner.refresh(&mut callbacks);
        }
        run(callbacks);
    }

    pub fn element_state(&self, target: TargetId) -> Option<ElementState> {
        self.lock().elements.get(target).map(|e| e.state)
    }

    /// Report a viewport size change
    ///
    /// When the scroll settings ignore mobile resizes, a change that only
    /// touches the height (address bar show/hide) does not re-resolve
    /// bindings.
    pub fn set_viewport(&self, width: f32, height: f32) {
        let mut callbacks = Callbacks::new();
        {
            let mut inner = self.lock();
            let width_changed = (inner.viewport_width - width).abs() > f32::EPSILON;
            let height_changed = (inner.viewport_height - height).abs() > f32::EPSILON;
            inner.viewport_width = width;
            inner.viewport_height = height;

            if !width_changed && !height_changed {
                return;
            }
            if !width_changed && inner.scroll_settings.ignore_mobile_resize {
                tracing::trace!(height, "ignoring height-only resize");
                return;
            }
            inner.refresh(&mut callbacks);
        }
        run(callbacks);
    }

    /// Re-resolve every binding against current regions and viewport
    pub fn refresh(&self) {
        let mut callbacks = Callbacks::new();
        self.lock().refresh(&mut callbacks);
        run(callbacks);
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Report a scroll position
    ///
    /// Positions are applied at most once per sync interval; a position
    /// arriving sooner is applied on the next [`tick`](Self::tick).
    pub fn scroll_to(&self, scroll_y: f32) {
        let mut callbacks = Callbacks::new();
        {
            let mut inner = self.lock();
            inner.pending_scroll = Some(scroll_y);
            if inner.since_sync_ms >= inner.scroll_settings.sync_interval_ms {
                inner.flush_scroll(&mut callbacks);
            }
        }
        run(callbacks);
    }

    pub fn scroll_position(&self) -> f32 {
        self.lock().scroll_y
    }

    /// Advance every animation by `dt` seconds
    ///
    /// Returns true if any animation still needs frames.
    pub fn tick(&self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut callbacks = Callbacks::new();
        let active = {
            let mut inner = self.lock();
            inner.since_sync_ms = (inner.since_sync_ms + dt * 1000.0).min(f32::MAX);
            if inner.pending_scroll.is_some()
                && inner.since_sync_ms >= inner.scroll_settings.sync_interval_ms
            {
                inner.flush_scroll(&mut callbacks);
            }

            let ids: Vec<AnimationId> = inner.animations.keys().collect();
            for id in ids {
                inner.advance(id, dt, &mut callbacks);
            }
            inner.has_active()
        };
        run(callbacks);
        active
    }

    pub fn has_active_animations(&self) -> bool {
        self.lock().has_active()
    }

    /// Number of registered (non-terminal) animations
    pub fn animation_count(&self) -> usize {
        self.lock().animations.len()
    }

    /// Number of registered scroll-bindings
    pub fn binding_count(&self) -> usize {
        self.lock().bindings.len()
    }

    /// Tear down every animation and scroll-binding
    pub fn kill_all(&self) {
        let mut inner = self.lock();
        let ids: Vec<AnimationId> = inner.animations.keys().collect();
        let count = ids.len();
        let mut discarded = Callbacks::new();
        for id in ids {
            inner.finish(id, AnimationState::Cancelled, &mut discarded);
        }
        inner.bindings.clear();
        inner.owners.clear();
        inner.pending_scroll = None;
        tracing::debug!(count, "killed all animations");
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create an animation tuned for the given device settings
    ///
    /// Never fails: see the module docs for the recovery path.
    pub fn create_animation(
        &self,
        mut request: AnimationRequest,
        adaptive: &AdaptiveSettings,
    ) -> AnimationHandle {
        let mut callbacks = Callbacks::new();
        let result = {
            let mut inner = self.lock();
            let result = self.try_create(&mut inner, &mut request, adaptive, &mut callbacks);
            if let Err(ref err) = result {
                tracing::warn!(error = %err, "animation request failed; resetting targets");
                for &target in &request.targets {
                    inner.supersede(target, &mut callbacks);
                    if let Some(element) = inner.elements.get_mut(target) {
                        element.state = ElementState::RESTING;
                    }
                }
            }
            result
        };
        run(callbacks);

        result.unwrap_or_else(|_| {
            let state = StateCell::new();
            state.transition(AnimationState::Cancelled);
            AnimationHandle {
                engine: self.handle(),
                id: None,
                state,
                settings: adaptive.settings,
                binding: None,
                pinned: false,
            }
        })
    }

    fn try_create(
        &self,
        inner: &mut EngineInner,
        request: &mut AnimationRequest,
        adaptive: &AdaptiveSettings,
        callbacks: &mut Callbacks,
    ) -> Result<AnimationHandle> {
        let classification = adaptive.classification();
        let mut settings = adaptive.settings.with_overrides(&request.overrides);
        if settings.disable_parallax {
            settings.parallax_intensity = 0.0;
        }

        if request.targets.is_empty() {
            return Err(MotionError::EmptyRequest);
        }
        if let Some(&missing) = request
            .targets
            .iter()
            .find(|t| !inner.elements.contains_key(**t))
        {
            return Err(MotionError::TargetNotMounted(missing));
        }

        // Everything fallible happens before the stage is touched.
        let binding = match request.scroll.take() {
            Some(spec) => {
                let trigger = spec.trigger.unwrap_or(request.targets[0]);
                let region = inner
                    .elements
                    .get(trigger)
                    .map(|e| e.region)
                    .ok_or(MotionError::TriggerNotMounted(trigger))?;
                let (default_start, default_end) = if classification.is_mobile {
                    (MOBILE_START, MOBILE_END)
                } else {
                    (DESKTOP_START, DESKTOP_END)
                };
                let start_marker = match spec.start.as_deref() {
                    Some(marker) => marker.parse()?,
                    None => default_start,
                };
                let end_marker = match spec.end.as_deref() {
                    Some(marker) => marker.parse()?,
                    None => default_end,
                };

                let scrub_lag = match spec.scrub {
                    Scrub::Off => None,
                    Scrub::On => Some(settings.scrub_value),
                    Scrub::Lag(_) if settings.use_simple_animations => Some(settings.scrub_value),
                    Scrub::Lag(lag) if lag.is_finite() => Some(lag.max(0.0)),
                    Scrub::Lag(_) => Some(settings.scrub_value),
                };
                let pin = spec.pin && settings.allow_complex_animations;
                let parallax = match spec.parallax {
                    Some(distance) if !settings.disable_parallax && distance.is_finite() => {
                        distance * settings.parallax_intensity
                    }
                    _ => 0.0,
                };

                let mut binding = ScrollBinding {
                    animation: AnimationId::default(),
                    trigger,
                    start_marker,
                    end_marker,
                    start: 0.0,
                    end: 0.0,
                    scrub_lag,
                    pin,
                    parallax,
                    once: spec.once,
                    target_progress: 0.0,
                    progress: 0.0,
                };
                binding.resolve(region, inner.viewport_height);
                Some(binding)
            }
            None => None,
        };

        let props = request.intent.props(&settings);
        let stagger_step = request.stagger.max(0.0) * settings.stagger_multiplier;
        let delay = request.delay.max(0.0);

        let mut tracks = SmallVec::<[Track; 4]>::new();
        for (index, &target) in request.targets.iter().enumerate() {
            let mut base = inner.settled_state(target).unwrap_or(ElementState::RESTING);
            base.force_3d = settings.force_3d;
            let offset = props.apply_to(base);
            let (from, to) = match request.direction {
                Direction::From => (offset, base),
                Direction::To => (base, offset),
            };
            tracks.push(Track {
                target,
                from,
                to,
                delay: delay + index as f32 * stagger_step,
            });
        }

        for &target in &request.targets {
            inner.supersede(target, callbacks);
        }

        let state = StateCell::new();

        if request.layer == Layer::Secondary && settings.skip_secondary_animations {
            for track in &tracks {
                if let Some(element) = inner.elements.get_mut(track.target) {
                    element.state = track.to;
                }
            }
            state.transition(AnimationState::Running);
            state.transition(AnimationState::Completed);
            callbacks.extend(request.on_start.take());
            callbacks.extend(request.on_complete.take());
            tracing::debug!(targets = tracks.len(), "skipped secondary animation");
            return Ok(AnimationHandle {
                engine: self.handle(),
                id: None,
                state,
                settings,
                binding: None,
                pinned: false,
            });
        }

        let scrubbed = binding.as_ref().is_some_and(|b| b.scrub_lag.is_some());
        let awaiting_trigger = binding
            .as_ref()
            .is_some_and(|b| b.scrub_lag.is_none() && inner.scroll_y < b.start);
        let pinned = binding.as_ref().is_some_and(|b| b.pin);

        let id = inner.animations.insert(ActiveAnimation {
            state: Arc::clone(&state),
            tracks,
            duration: settings.duration,
            ease: settings.ease,
            elapsed: 0.0,
            binding: None,
            scrubbed,
            awaiting_trigger,
            on_start: request.on_start.take(),
            on_complete: request.on_complete.take(),
        });
        for &target in &request.targets {
            inner.owners.insert(target, id);
        }

        let binding_id = binding.map(|mut binding| {
            binding.animation = id;
            binding.target_progress = binding.raw_progress(inner.scroll_y);
            binding.progress = binding.target_progress;
            let binding_id = inner.bindings.insert(binding);
            if let Some(anim) = inner.animations.get_mut(id) {
                anim.binding = Some(binding_id);
            }
            tracing::debug!(?id, ?binding_id, pinned, "scroll binding registered");
            binding_id
        });

        // Immediate render so entrances never flash their resting state.
        if scrubbed {
            inner.settle_scrubbed(id, callbacks);
        } else {
            inner.render(id);
        }

        tracing::debug!(
            ?id,
            targets = request.targets.len(),
            duration = settings.duration,
            ease = %settings.ease,
            scroll_bound = binding_id.is_some(),
            "animation created"
        );

        Ok(AnimationHandle {
            engine: self.handle(),
            id: Some(id),
            state,
            settings,
            binding: binding_id,
            pinned,
        })
    }
}

impl Default for AnimationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the animation engine
///
/// Held by animation handles; it won't keep the engine alive.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    inner: Weak<Mutex<EngineInner>>,
}

impl EngineHandle {
    /// Check if the engine is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Upgrade back to a full engine
    pub fn upgrade(&self) -> Option<AnimationEngine> {
        self.inner.upgrade().map(|inner| AnimationEngine { inner })
    }
}

// ============================================================================
// Animation Handle
// ============================================================================

/// Cancellable token for a created animation
///
/// Dropping a handle does not stop the animation; call
/// [`cancel`](Self::cancel) (or unmount the owning view) for that.
#[derive(Clone, Debug)]
pub struct AnimationHandle {
    engine: EngineHandle,
    id: Option<AnimationId>,
    state: Arc<StateCell>,
    settings: AnimationSettings,
    binding: Option<BindingId>,
    pinned: bool,
}

impl AnimationHandle {
    /// Engine id, `None` for skipped or failed requests
    pub fn id(&self) -> Option<AnimationId> {
        self.id
    }

    pub fn state(&self) -> AnimationState {
        self.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Settings the animation was created with, overrides applied
    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn duration(&self) -> f32 {
        self.settings.duration
    }

    pub fn parallax_intensity(&self) -> f32 {
        self.settings.parallax_intensity
    }

    pub fn has_scroll_binding(&self) -> bool {
        self.binding.is_some()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Cancel the animation and release its scroll-binding
    ///
    /// A no-op once the animation has completed or been cancelled.
    pub fn cancel(&self) {
        if self.is_finished() {
            return;
        }
        if let (Some(id), Some(inner)) = (self.id, self.engine.inner.upgrade()) {
            let mut discarded = Callbacks::new();
            let mut inner = lock(&inner);
            let owned = inner
                .animations
                .get(id)
                .is_some_and(|anim| Arc::ptr_eq(&anim.state, &self.state));
            if owned {
                inner.finish(id, AnimationState::Cancelled, &mut discarded);
                tracing::debug!(?id, "animation cancelled");
                return;
            }
        }
        self.state.transition(AnimationState::Cancelled);
    }
}
