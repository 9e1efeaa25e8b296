//! Re-classification on environment changes
//!
//! The host forwards resize, orientation and visibility events with
//! [`ClassificationWatcher::notify`] and calls
//! [`ClassificationWatcher::poll`] from its loop. Bursts of events collapse
//! into one re-classification once the debounce window has passed.
//! Subscribers hear about a settled result only when the classification
//! actually changed, and hear about it exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cadence_platform::{Classifier, DeviceProfile, SignalSource};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by [`ClassificationWatcher::on_classification_change`]
    pub struct SubscriptionId;
}

/// Handler invoked with the new profile after a classification change
pub type ChangeHandler = Arc<dyn Fn(&DeviceProfile) + Send + Sync>;

/// Environment events that may change the classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvironmentEvent {
    Resize,
    OrientationChange,
    /// The page became visible again; re-classified without delay
    VisibilityRegained,
}

/// Debounce timings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub resize_debounce_ms: u64,
    pub orientation_debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 150,
            orientation_debounce_ms: 500,
        }
    }
}

impl WatcherConfig {
    fn delay(&self, event: EnvironmentEvent) -> Duration {
        match event {
            EnvironmentEvent::Resize => Duration::from_millis(self.resize_debounce_ms),
            EnvironmentEvent::OrientationChange => {
                Duration::from_millis(self.orientation_debounce_ms)
            }
            EnvironmentEvent::VisibilityRegained => Duration::ZERO,
        }
    }
}

/// Result of a settled re-classification
pub(crate) struct Settled {
    pub profile: DeviceProfile,
    pub changed: bool,
    /// Subscribers to notify; empty when the classification did not change
    pub handlers: Vec<ChangeHandler>,
}

/// Debounced classifier re-runner
pub struct ClassificationWatcher {
    classifier: Classifier,
    source: Arc<dyn SignalSource>,
    config: WatcherConfig,
    current: DeviceProfile,
    deadline: Option<Instant>,
    subscribers: SlotMap<SubscriptionId, ChangeHandler>,
}

impl ClassificationWatcher {
    /// Create a watcher and run the initial classification
    pub fn new(
        classifier: Classifier,
        source: Arc<dyn SignalSource>,
        config: WatcherConfig,
    ) -> Self {
        let current = classifier.profile(&source.read());
        tracing::debug!(
            source = source.name(),
            is_mobile = current.classification.is_mobile,
            is_low_performance = current.classification.is_low_performance,
            "initial device classification"
        );
        Self {
            classifier,
            source,
            config,
            current,
            deadline: None,
            subscribers: SlotMap::with_key(),
        }
    }

    /// Profile from the last settled classification
    pub fn current(&self) -> DeviceProfile {
        self.current
    }

    pub fn config(&self) -> WatcherConfig {
        self.config
    }

    /// Register a handler for classification changes
    pub fn on_classification_change<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceProfile) + Send + Sync + 'static,
    {
        self.subscribers.insert(Arc::new(handler))
    }

    /// Remove a handler; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Record an environment event at `now`
    ///
    /// Each event restarts the debounce window, which never shrinks
    /// below a window already pending. Visibility regain settles on the
    /// next poll.
    pub fn notify(&mut self, event: EnvironmentEvent, now: Instant) {
        let due = now + self.config.delay(event);
        self.deadline = match (event, self.deadline) {
            (EnvironmentEvent::VisibilityRegained, _) | (_, None) => Some(due),
            (_, Some(pending)) => Some(pending.max(due)),
        };
        tracing::trace!(?event, "environment event");
    }

    /// When the pending re-classification is due, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Settle a due re-classification and notify subscribers on change
    ///
    /// Returns true if the classification changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.settle(now) {
            Some(settled) => {
                for handler in &settled.handlers {
                    handler(&settled.profile);
                }
                settled.changed
            }
            None => false,
        }
    }

    pub(crate) fn settle(&mut self, now: Instant) -> Option<Settled> {
        match self.deadline {
            Some(due) if now >= due => {}
            _ => return None,
        }
        self.deadline = None;
        Some(self.reclassify())
    }

    /// Re-run the classifier right away, dropping any pending debounce
    pub(crate) fn reclassify(&mut self) -> Settled {
        self.deadline = None;
        let profile = self.classifier.profile(&self.source.read());
        let changed = profile.classification != self.current.classification;
        self.current = profile;

        let handlers = if changed {
            tracing::debug!(
                is_mobile = profile.classification.is_mobile,
                is_low_performance = profile.classification.is_low_performance,
                subscribers = self.subscribers.len(),
                "device reclassified"
            );
            self.subscribers.values().cloned().collect()
        } else {
            Vec::new()
        };
        Settled {
            profile,
            changed,
            handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_platform::{EnvironmentSignals, StaticSignals};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn watcher(signals: EnvironmentSignals) -> (ClassificationWatcher, Arc<StaticSignals>) {
        let source = Arc::new(StaticSignals::new(signals));
        let watcher = ClassificationWatcher::new(
            Classifier::default(),
            source.clone(),
            WatcherConfig::default(),
        );
        (watcher, source)
    }

    fn counter(watcher: &mut ClassificationWatcher) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        watcher.on_classification_change(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        calls
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_initial_classification() {
        let (watcher, _) = watcher(EnvironmentSignals::phone());
        assert!(watcher.current().classification.is_mobile);
        assert!(watcher.next_deadline().is_none());
    }

    #[test]
    fn test_resize_is_debounced() {
        let (mut watcher, source) = watcher(EnvironmentSignals::desktop());
        let calls = counter(&mut watcher);
        let t0 = Instant::now();

        watcher.notify(EnvironmentEvent::Resize, t0);
        source.update(|s| s.viewport_width = Some(500.0));

        assert!(!watcher.poll(t0 + ms(100)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(watcher.poll(t0 + ms(150)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(watcher.current().classification.is_mobile);

        assert!(!watcher.poll(t0 + ms(1000)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_burst_delivers_once() {
        let (mut watcher, source) = watcher(EnvironmentSignals::desktop());
        let calls = counter(&mut watcher);
        let t0 = Instant::now();

        for step in 0..5 {
            watcher.notify(EnvironmentEvent::Resize, t0 + ms(step * 100));
            let width = if step % 2 == 0 { 500.0 } else { 1200.0 };
            source.update(|s| s.viewport_width = Some(width));
            assert!(!watcher.poll(t0 + ms(step * 100 + 50)));
        }
        assert!(watcher.poll(t0 + ms(550)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unchanged_classification_is_silent() {
        let (mut watcher, source) = watcher(EnvironmentSignals::desktop());
        let calls = counter(&mut watcher);
        let t0 = Instant::now();

        watcher.notify(EnvironmentEvent::Resize, t0);
        source.update(|s| s.viewport_width = Some(1100.0));
        assert!(!watcher.poll(t0 + ms(200)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(watcher.next_deadline().is_none());
        assert_eq!(watcher.current().viewport_height, Some(900.0));
    }

    #[test]
    fn test_orientation_window_not_shortened_by_resize() {
        let (mut watcher, _) = watcher(EnvironmentSignals::phone());
        let t0 = Instant::now();

        watcher.notify(EnvironmentEvent::OrientationChange, t0);
        watcher.notify(EnvironmentEvent::Resize, t0 + ms(10));
        assert_eq!(watcher.next_deadline(), Some(t0 + ms(500)));
    }

    #[test]
    fn test_visibility_settles_immediately() {
        let (mut watcher, source) = watcher(EnvironmentSignals::phone());
        let calls = counter(&mut watcher);
        let t0 = Instant::now();

        watcher.notify(EnvironmentEvent::OrientationChange, t0);
        source.update(|s| s.save_data = Some(true));
        watcher.notify(EnvironmentEvent::VisibilityRegained, t0);
        assert!(watcher.poll(t0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(watcher.current().classification.is_low_performance);
    }

    #[test]
    fn test_unsubscribe() {
        let (mut watcher, source) = watcher(EnvironmentSignals::desktop());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let id = watcher.on_classification_change(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(watcher.unsubscribe(id));
        assert!(!watcher.unsubscribe(id));
        assert_eq!(watcher.subscriber_count(), 0);

        let t0 = Instant::now();
        source.update(|s| s.viewport_width = Some(400.0));
        watcher.notify(EnvironmentEvent::Resize, t0);
        assert!(watcher.poll(t0 + ms(150)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
