//! Motion session context
//!
//! A [`MotionContext`] bundles everything one page session needs: the
//! classification watcher, the settings derived from the current
//! classification and the animation engine. Views reach it through
//! [`use_motion`] once the host has installed it:
//!
//! ```ignore
//! let context = MotionContext::new(Arc::new(BrowserSignals::new()));
//! let _session = context.install();
//!
//! // Anywhere in view code on the same thread
//! let handle = use_motion().create_animation(request);
//! ```
//!
//! Re-classification only affects animations created afterwards; anything
//! already running keeps the settings it was created with.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use cadence_animation::{
    AdaptiveSettings, AnimationEngine, AnimationHandle, AnimationRequest, AnimationSettings,
    SettingsTable,
};
use cadence_platform::{Classifier, DeviceClassification, DeviceProfile, SignalSource};

use crate::config::{CadenceConfig, ConfigError};
use crate::view::ViewScope;
use crate::watcher::{
    ClassificationWatcher, EnvironmentEvent, Settled, SubscriptionId, WatcherConfig,
};

thread_local! {
    static CURRENT: RefCell<Option<MotionContext>> = const { RefCell::new(None) };
}

struct ContextInner {
    table: SettingsTable,
    engine: AnimationEngine,
    watcher: Mutex<ClassificationWatcher>,
    settings: RwLock<AdaptiveSettings>,
    /// Installs of this context whose guards are still alive
    sessions: AtomicUsize,
}

/// Shared motion state for one session
///
/// Cheap to clone; clones share the same engine and settings.
#[derive(Clone)]
pub struct MotionContext {
    inner: Arc<ContextInner>,
}

impl MotionContext {
    /// Create a context with the built-in thresholds and settings table
    pub fn new(source: Arc<dyn SignalSource>) -> Self {
        Self::build(
            Classifier::default(),
            SettingsTable::default(),
            WatcherConfig::default(),
            source,
        )
    }

    /// Create a context from a validated configuration
    pub fn with_config(
        config: &CadenceConfig,
        source: Arc<dyn SignalSource>,
    ) -> Result<Self, ConfigError> {
        let classifier = config.build_classifier()?;
        config.tiers.validate()?;
        Ok(Self::build(classifier, config.tiers, config.watcher, source))
    }

    fn build(
        classifier: Classifier,
        table: SettingsTable,
        watcher_config: WatcherConfig,
        source: Arc<dyn SignalSource>,
    ) -> Self {
        let watcher = ClassificationWatcher::new(classifier, source, watcher_config);
        let settings = table.resolve(&watcher.current());
        let engine = AnimationEngine::new();
        engine.configure(settings.scroll);

        Self {
            inner: Arc::new(ContextInner {
                table,
                engine,
                watcher: Mutex::new(watcher),
                settings: RwLock::new(settings),
                sessions: AtomicUsize::new(0),
            }),
        }
    }

    fn watcher(&self) -> MutexGuard<'_, ClassificationWatcher> {
        self.inner
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Settings derived from the current classification
    pub fn settings(&self) -> AdaptiveSettings {
        *self
            .inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn animation_settings(&self) -> AnimationSettings {
        self.settings().settings
    }

    pub fn profile(&self) -> DeviceProfile {
        self.settings().profile
    }

    pub fn classification(&self) -> DeviceClassification {
        self.settings().classification()
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.inner.engine
    }

    /// Create an animation with the current device settings
    pub fn create_animation(&self, request: AnimationRequest) -> AnimationHandle {
        let settings = self.settings();
        self.inner.engine.create_animation(request, &settings)
    }

    /// Open a scope that cancels its animations when the view unmounts
    pub fn view_scope(&self) -> ViewScope {
        ViewScope::new(self.clone())
    }

    // =========================================================================
    // Re-classification
    // =========================================================================

    /// Subscribe to classification changes
    ///
    /// Handlers run after the context has switched to the new settings.
    pub fn on_classification_change<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceProfile) + Send + Sync + 'static,
    {
        self.watcher().on_classification_change(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.watcher().unsubscribe(id)
    }

    /// Forward an environment event from the host
    pub fn notify(&self, event: EnvironmentEvent, now: Instant) {
        self.watcher().notify(event, now);
    }

    /// Settle any due re-classification; returns true if it changed
    pub fn poll(&self, now: Instant) -> bool {
        let settled = self.watcher().settle(now);
        settled.is_some_and(|settled| self.apply(settled))
    }

    /// When the next re-classification is due, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.watcher().next_deadline()
    }

    /// Re-classify immediately, skipping any debounce
    pub fn reclassify(&self) -> DeviceClassification {
        let settled = self.watcher().reclassify();
        self.apply(settled);
        self.classification()
    }

    fn apply(&self, settled: Settled) -> bool {
        let adaptive = self.inner.table.resolve(&settled.profile);
        *self
            .inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = adaptive;
        self.inner.engine.configure(adaptive.scroll);

        for handler in &settled.handlers {
            handler(&settled.profile);
        }
        settled.changed
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Cancel every animation and release every scroll-binding
    pub fn teardown(&self) {
        self.inner.engine.kill_all();
    }

    /// Make this context current for the calling thread
    ///
    /// The previous context (if any) is restored when the guard drops. This
    /// session's animations are torn down once the last guard installing
    /// this context drops, so installing the same context again while it is
    /// already current does not end the outer session early.
    pub fn install(&self) -> SessionGuard {
        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        self.inner.sessions.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            nested = previous.is_some(),
            is_mobile = self.classification().is_mobile,
            is_low_performance = self.classification().is_low_performance,
            "motion session installed"
        );
        SessionGuard {
            context: self.clone(),
            previous,
            _not_send: PhantomData,
        }
    }
}

impl fmt::Debug for MotionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionContext")
            .field("classification", &self.classification())
            .field("animations", &self.inner.engine.animation_count())
            .finish_non_exhaustive()
    }
}

/// Keeps a [`MotionContext`] installed on the current thread
#[must_use = "the session ends when the guard is dropped"]
pub struct SessionGuard {
    context: MotionContext,
    previous: Option<MotionContext>,
    _not_send: PhantomData<*const ()>,
}

impl SessionGuard {
    pub fn context(&self) -> &MotionContext {
        &self.context
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| current.replace(previous));
        if self.context.inner.sessions.fetch_sub(1, Ordering::SeqCst) > 1 {
            tracing::debug!("nested motion session ended; context still installed");
            return;
        }
        self.context.teardown();
        tracing::debug!("motion session ended");
    }
}

/// The motion context installed on this thread
///
/// # Panics
///
/// Panics if no session is installed. Use [`try_use_motion`] where running
/// outside a session is expected.
pub fn use_motion() -> MotionContext {
    try_use_motion().expect(
        "use_motion() called outside a motion session. Call MotionContext::install() first.",
    )
}

/// The motion context installed on this thread, if any
pub fn try_use_motion() -> Option<MotionContext> {
    CURRENT.with(|current| current.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_animation::{AnimationIntent, AnimationState, Region, ScrollBindingSpec};
    use cadence_platform::{EnvironmentSignals, StaticSignals};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
                             AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

    fn context(signals: EnvironmentSignals) -> (MotionContext, Arc<StaticSignals>) {
        let source = Arc::new(StaticSignals::new(signals));
        (MotionContext::new(source.clone()), source)
    }

    #[test]
    fn test_desktop_context() {
        let (context, _) = context(EnvironmentSignals::desktop());
        assert_eq!(context.classification(), DeviceClassification::DESKTOP);
        assert!(context.settings().enhanced_desktop);

        let target = context.engine().mount(Region::new(0.0, 200.0));
        let handle = context
            .create_animation(AnimationRequest::new(target, AnimationIntent::SlideUp));
        assert_eq!(handle.duration(), 1.2);
        assert_eq!(handle.parallax_intensity(), 1.0);
    }

    #[test]
    fn test_ios_scroll_tuning() {
        let (context, _) = context(EnvironmentSignals::phone().with_user_agent(IPHONE_UA));
        let scroll = context.engine().scroll_settings();
        assert_eq!(scroll.sync_interval_ms, 100.0);
        assert!(scroll.ignore_mobile_resize);
    }

    #[test]
    fn test_reclassify_affects_only_new_animations() {
        let (context, source) = context(EnvironmentSignals::desktop());
        let target = context.engine().mount(Region::new(0.0, 200.0));
        let before =
            context.create_animation(AnimationRequest::new(target, AnimationIntent::Fade));

        source.set(EnvironmentSignals::phone().with_memory(2.0));
        let classification = context.reclassify();
        assert!(classification.is_mobile && classification.is_low_performance);

        assert_eq!(before.duration(), 1.2);
        let other = context.engine().mount(Region::new(300.0, 200.0));
        let after = context.create_animation(AnimationRequest::new(other, AnimationIntent::Fade));
        assert_eq!(after.duration(), 0.5);
        assert_eq!(before.state(), AnimationState::Pending);
    }

    #[test]
    fn test_poll_applies_settled_change() {
        let (context, source) = context(EnvironmentSignals::desktop());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        context.on_classification_change(move |profile| {
            assert!(profile.classification.is_mobile);
            c.fetch_add(1, Ordering::SeqCst);
        });

        let t0 = Instant::now();
        source.update(|s| s.viewport_width = Some(600.0));
        context.notify(EnvironmentEvent::Resize, t0);
        assert!(!context.poll(t0));
        assert!(!context.classification().is_mobile);

        assert!(context.poll(t0 + Duration::from_millis(150)));
        assert!(context.classification().is_mobile);
        assert_eq!(context.animation_settings().duration, 0.8);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(context.next_deadline().is_none());
    }

    #[test]
    fn test_install_and_use_motion() {
        assert!(try_use_motion().is_none());
        let (context, _) = context(EnvironmentSignals::phone());
        {
            let _session = context.install();
            assert!(use_motion().classification().is_mobile);
        }
        assert!(try_use_motion().is_none());
    }

    #[test]
    fn test_nested_sessions_restore_previous() {
        let (outer, _) = context(EnvironmentSignals::desktop());
        let (inner, _) = context(EnvironmentSignals::phone());

        let _outer = outer.install();
        {
            let _inner = inner.install();
            assert!(use_motion().classification().is_mobile);
        }
        assert!(!use_motion().classification().is_mobile);
    }

    #[test]
    #[should_panic(expected = "outside a motion session")]
    fn test_use_motion_outside_session_panics() {
        let _ = use_motion();
    }

    #[test]
    fn test_session_end_tears_down() {
        let (context, _) = context(EnvironmentSignals::desktop());
        let session = context.install();
        let target = context.engine().mount(Region::new(1000.0, 200.0));
        let handle = use_motion().create_animation(
            AnimationRequest::new(target, AnimationIntent::Fade).scroll(ScrollBindingSpec::new()),
        );
        assert_eq!(context.engine().binding_count(), 1);

        drop(session);
        assert_eq!(handle.state(), AnimationState::Cancelled);
        assert_eq!(context.engine().binding_count(), 0);
    }

    #[test]
    fn test_reinstalling_same_context_keeps_outer_session() {
        let (context, _) = context(EnvironmentSignals::desktop());
        let outer = context.install();
        let target = context.engine().mount(Region::new(1000.0, 200.0));
        let handle = use_motion().create_animation(
            AnimationRequest::new(target, AnimationIntent::Fade).scroll(ScrollBindingSpec::new()),
        );

        drop(context.install());
        assert_ne!(handle.state(), AnimationState::Cancelled);
        assert_eq!(context.engine().binding_count(), 1);
        assert!(try_use_motion().is_some());

        drop(outer);
        assert_eq!(handle.state(), AnimationState::Cancelled);
        assert_eq!(context.engine().binding_count(), 0);
        assert!(try_use_motion().is_none());
    }

    #[test]
    fn test_reinstall_under_other_context_keeps_outer_session() {
        let (a, _) = context(EnvironmentSignals::desktop());
        let (b, _) = context(EnvironmentSignals::phone());
        let _outer = a.install();
        let target = a.engine().mount(Region::new(1000.0, 200.0));
        let handle = a.create_animation(
            AnimationRequest::new(target, AnimationIntent::Fade).scroll(ScrollBindingSpec::new()),
        );

        {
            let _middle = b.install();
            drop(a.install());
            assert!(use_motion().classification().is_mobile);
        }
        assert_ne!(handle.state(), AnimationState::Cancelled);
        assert!(!use_motion().classification().is_mobile);
    }

    #[test]
    fn test_with_config_rejects_invalid_table() {
        let mut config = CadenceConfig::default();
        config.tiers.low_performance.parallax_intensity = 0.5;
        let source = Arc::new(StaticSignals::new(EnvironmentSignals::desktop()));
        assert!(matches!(
            MotionContext::with_config(&config, source),
            Err(ConfigError::Tiers(_))
        ));
    }
}
