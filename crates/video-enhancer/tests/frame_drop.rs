mod common;

use common::{FakePlatform, count, event_log};
use video_enhancer::{Enhancer, EnhancerConfig, EnhancerEvent, FrameDropConfig, Phase, PipelineOption, RawMode, Side, StateHint};

fn config(threshold: u32) -> EnhancerConfig {
    EnhancerConfig {
        frame_drop: FrameDropConfig {
            threshold,
            ..FrameDropConfig::default()
        },
        ..EnhancerConfig::default()
    }
}

fn run(enhancer: &Enhancer<FakePlatform>, host: &common::FakeHost, frames: usize, interval: f64) {
    for _ in 0..frames {
        enhancer.on_animation_frame(host.advance(interval));
    }
}

#[test]
fn sustained_drops_fall_back_exactly_once() {
    let (platform, host) = FakePlatform::new();
    let enhancer = Enhancer::new(platform, config(5));
    pollster::block_on(enhancer.set_option(PipelineOption::Raw(RawMode::CnnX2M), StateHint::NONE));
    let (log, listener) = event_log();
    enhancer.subscribe(listener);

    // past the grace period at a steady 60 Hz
    run(&enhancer, &host, 200, 16.0);
    assert!(log.borrow().is_empty());

    run(&enhancer, &host, 4, 50.0);
    assert!(log.borrow().is_empty());
    run(&enhancer, &host, 1, 50.0);
    run(&enhancer, &host, 20, 50.0);

    let events = log.borrow();
    assert_eq!(count(&log, |e| matches!(e, EnhancerEvent::Fallback { .. })), 1);
    assert_eq!(count(&log, |e| matches!(e, EnhancerEvent::Error { .. })), 1);
    assert_eq!(
        count(&log, |e| *e
            == EnhancerEvent::OptionChanged {
                side: Side::Main,
                option: PipelineOption::Off
            }),
        1
    );
    assert!(matches!(events[0], EnhancerEvent::Fallback { side: Side::Main, .. }));
    assert!(matches!(&events[1], EnhancerEvent::Error { message, .. } if message.starts_with("Enhancement turned off")));
    drop(events);

    assert_eq!(enhancer.current_option(), PipelineOption::Off);
    assert_eq!(enhancer.phase(), Phase::Destroyed);
    assert_eq!(host.ledger.borrow().live_devices(), 0);
    assert_eq!(host.ledger.borrow().live_textures(), 0);
}

#[test]
fn drops_during_grace_period_are_ignored() {
    let (platform, host) = FakePlatform::new();
    let enhancer = Enhancer::new(platform, config(3));
    pollster::block_on(enhancer.set_option(PipelineOption::Raw(RawMode::CnnX2M), StateHint::NONE));
    let (log, listener) = event_log();
    enhancer.subscribe(listener);

    run(&enhancer, &host, 50, 50.0);

    assert!(log.borrow().is_empty());
    assert_eq!(enhancer.phase(), Phase::Rendering);
}

#[test]
fn one_on_time_frame_resets_the_count() {
    let (platform, host) = FakePlatform::new();
    let enhancer = Enhancer::new(platform, config(5));
    pollster::block_on(enhancer.set_option(PipelineOption::Raw(RawMode::CnnX2M), StateHint::NONE));
    let (log, listener) = event_log();
    enhancer.subscribe(listener);

    run(&enhancer, &host, 200, 16.0);
    for _ in 0..10 {
        run(&enhancer, &host, 4, 50.0);
        run(&enhancer, &host, 1, 16.0);
    }

    assert!(log.borrow().is_empty());
    assert!(enhancer.phase() == Phase::Rendering);
}

#[test]
fn disabled_governor_never_runs() {
    let (platform, host) = FakePlatform::new();
    let mut config = config(2);
    config.frame_drop.enabled = false;
    let enhancer = Enhancer::new(platform, config);
    pollster::block_on(enhancer.set_option(PipelineOption::Raw(RawMode::CnnX2M), StateHint::NONE));

    run(&enhancer, &host, 200, 100.0);

    assert_eq!(enhancer.current_option(), PipelineOption::Raw(RawMode::CnnX2M));
    assert_eq!(host.ledger.borrow().presents.len(), 200);
}
