//! End-to-end session scenarios

use std::sync::Arc;

use cadence_animation::{
    derive_settings, AnimationIntent, AnimationRequest, AnimationState, Region, Scrub,
    ScrollBindingSpec, TierSettings,
};
use cadence_app::{use_motion, MotionContext};
use cadence_platform::{classify, DeviceClassification, EnvironmentSignals, StaticSignals};

fn session(signals: EnvironmentSignals) -> MotionContext {
    MotionContext::new(Arc::new(StaticSignals::new(signals)))
}

#[test]
fn wide_capable_viewports_are_desktop() {
    for width in [1024.0, 1280.0, 1920.0, 3840.0] {
        let signals = EnvironmentSignals::desktop().with_viewport(width, 900.0);
        assert_eq!(classify(&signals), DeviceClassification::DESKTOP, "{width}");
    }
}

#[test]
fn narrow_viewports_are_mobile_whatever_else() {
    for width in [320.0, 500.0, 767.9] {
        let signals = EnvironmentSignals::desktop()
            .with_viewport(width, 900.0)
            .with_memory(64.0)
            .with_cpus(32);
        assert!(classify(&signals).is_mobile, "{width}");
    }
}

#[test]
fn desktop_slide_up_gets_full_parallax() {
    let context = session(EnvironmentSignals::desktop());
    let _session = context.install();

    let target = use_motion().engine().mount(Region::new(1600.0, 400.0));
    let handle = use_motion().create_animation(
        AnimationRequest::new(target, AnimationIntent::SlideUp)
            .scroll(ScrollBindingSpec::new().parallax(120.0).pin().scrub(Scrub::On)),
    );

    assert_eq!(handle.parallax_intensity(), 1.0);
    assert_eq!(handle.duration(), TierSettings::DESKTOP.duration);
    assert!(handle.is_pinned());
}

#[test]
fn low_performance_mobile_drops_parallax_and_pin() {
    let context = session(EnvironmentSignals::phone().with_memory(2.0).with_cpus(2));
    assert_eq!(context.classification(), DeviceClassification::new(true, true));
    let _session = context.install();

    let target = use_motion().engine().mount(Region::new(1600.0, 400.0));
    let handle = use_motion().create_animation(
        AnimationRequest::new(target, AnimationIntent::SlideUp)
            .scroll(ScrollBindingSpec::new().parallax(120.0).pin().scrub(Scrub::On)),
    );

    assert_eq!(handle.parallax_intensity(), 0.0);
    assert!(!handle.is_pinned());
    assert_eq!(handle.duration(), TierSettings::LOW_PERFORMANCE.duration);
}

#[test]
fn durations_shrink_with_capability() {
    let desktop = derive_settings(DeviceClassification::DESKTOP).duration;
    let mobile = derive_settings(DeviceClassification::MOBILE).duration;
    for is_mobile in [false, true] {
        let low = derive_settings(DeviceClassification::new(is_mobile, true)).duration;
        assert!(desktop > mobile && mobile > low);
    }
}

#[test]
fn unmounting_a_view_restores_the_binding_registry() {
    let context = session(EnvironmentSignals::desktop());
    let _session = context.install();
    let engine = use_motion().engine().clone();

    // A binding owned outside the view must survive the unmount
    let hero = engine.mount(Region::new(0.0, 600.0));
    let _hero = use_motion().create_animation(
        AnimationRequest::new(hero, AnimationIntent::Fade)
            .scroll(ScrollBindingSpec::new().scrub(Scrub::On)),
    );
    let before = engine.binding_count();

    let mut view = use_motion().view_scope();
    let handles: Vec<_> = (0..3)
        .map(|i| {
            let card = view.mount(Region::new(1200.0 + i as f32 * 400.0, 300.0));
            view.create_animation(
                AnimationRequest::new(card, AnimationIntent::Scale)
                    .scroll(ScrollBindingSpec::new().once()),
            )
        })
        .collect();
    assert_eq!(engine.binding_count(), before + 3);

    view.unmount();
    assert!(handles.iter().all(|h| h.state() == AnimationState::Cancelled));
    assert_eq!(engine.binding_count(), before);

    for handle in &handles {
        handle.cancel();
    }
    assert_eq!(engine.binding_count(), before);
}

#[test]
fn animations_play_out_under_the_host_loop() {
    let context = session(EnvironmentSignals::phone());
    let engine = context.engine().clone();
    engine.set_viewport(390.0, 844.0);

    let card = engine.mount(Region::new(1500.0, 300.0));
    let handle = context.create_animation(
        AnimationRequest::new(card, AnimationIntent::SlideUp).scroll(ScrollBindingSpec::new()),
    );
    assert_eq!(engine.element_state(card).map(|s| s.opacity), Some(0.0));

    // mobile start marker "top 80%": 1500 - 675.2
    engine.scroll_to(900.0);
    let mut frames = 0;
    while engine.tick(1.0 / 60.0) {
        frames += 1;
        assert!(frames < 600, "animation never settled");
    }
    assert_eq!(handle.state(), AnimationState::Completed);
    let state = engine.element_state(card).unwrap();
    assert_eq!(state.opacity, 1.0);
    assert!(state.force_3d);
}
