//! View-scoped animation ownership
//!
//! A view opens a [`ViewScope`] when it mounts, creates its animations
//! through it and calls [`ViewScope::unmount`] (or just drops the scope)
//! when it goes away. Unmounting cancels every animation the scope created
//! and removes the targets it mounted, which also releases their
//! scroll-bindings.

use cadence_animation::{AnimationHandle, AnimationRequest, Region, TargetId};

use crate::context::MotionContext;

/// Animations and targets owned by one mounted view
pub struct ViewScope {
    context: MotionContext,
    handles: Vec<AnimationHandle>,
    targets: Vec<TargetId>,
    unmounted: bool,
}

impl ViewScope {
    pub(crate) fn new(context: MotionContext) -> Self {
        Self {
            context,
            handles: Vec::new(),
            targets: Vec::new(),
            unmounted: false,
        }
    }

    pub fn context(&self) -> &MotionContext {
        &self.context
    }

    /// Mount a target that lives as long as this view
    pub fn mount(&mut self, region: Region) -> TargetId {
        let target = self.context.engine().mount(region);
        self.targets.push(target);
        target
    }

    /// Create an animation owned by this view
    ///
    /// After unmount the animation is cancelled straight away.
    pub fn create_animation(&mut self, request: AnimationRequest) -> AnimationHandle {
        let handle = self.context.create_animation(request);
        if self.unmounted {
            tracing::debug!("animation created on an unmounted view; cancelling");
            handle.cancel();
        } else {
            self.own(handle.clone());
        }
        handle
    }

    /// Take ownership of a handle created elsewhere
    pub fn track(&mut self, handle: AnimationHandle) {
        if self.unmounted {
            handle.cancel();
        } else {
            self.own(handle);
        }
    }

    fn own(&mut self, handle: AnimationHandle) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    /// Number of owned animations still pending or running
    pub fn active_count(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    /// Cancel every owned animation and remove owned targets
    ///
    /// Calling this more than once is a no-op.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        self.unmounted = true;

        let cancelled = self.active_count();
        for handle in self.handles.drain(..) {
            handle.cancel();
        }
        let engine = self.context.engine();
        for target in self.targets.drain(..) {
            engine.unmount(target);
        }
        tracing::debug!(cancelled, "view unmounted");
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.unmount();
    }
}
