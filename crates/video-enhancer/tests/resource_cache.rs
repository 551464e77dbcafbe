mod common;

use common::{FakePlatform, TextureOp};
use video_enhancer::{BoxSize, Enhancer, EnhancerConfig, PipelineOption, PresetMode, RawMode, StateHint};

fn raw_enhancer() -> (Enhancer<FakePlatform>, std::rc::Rc<common::FakeHost>) {
    let (platform, host) = FakePlatform::new();
    let enhancer = Enhancer::new(platform, EnhancerConfig::default());
    pollster::block_on(enhancer.set_option(PipelineOption::Raw(RawMode::CnnX2M), StateHint::NONE));
    (enhancer, host)
}

#[test]
fn resources_are_created_once_per_geometry() {
    let (enhancer, host) = raw_enhancer();

    for _ in 0..5 {
        enhancer.on_animation_frame(host.advance(16.0));
    }

    let ledger = host.ledger.borrow();
    assert_eq!(
        ledger.texture_ops,
        vec![
            TextureOp::Create { id: 1, width: 640, height: 360 },
            TextureOp::Create { id: 2, width: 1280, height: 720 },
            TextureOp::Create { id: 3, width: 1280, height: 720 },
        ]
    );
    assert_eq!(ledger.presents.len(), 5);
    assert!(ledger.presents.iter().all(|(id, _)| *id == 3));
}

#[test]
fn native_size_change_releases_before_recreating() {
    let (enhancer, host) = raw_enhancer();
    enhancer.on_animation_frame(host.advance(16.0));

    host.set_natural_size(960, 540);
    enhancer.on_animation_frame(host.advance(16.0));

    let ledger = host.ledger.borrow();
    assert_eq!(
        ledger.texture_ops[3..],
        [
            TextureOp::Destroy { id: 3 },
            TextureOp::Destroy { id: 2 },
            TextureOp::Destroy { id: 1 },
            TextureOp::Create { id: 4, width: 960, height: 540 },
            TextureOp::Create { id: 5, width: 1920, height: 1080 },
            TextureOp::Create { id: 6, width: 1280, height: 720 },
        ]
    );
    let input_destroys = ledger.texture_ops.iter().filter(|op| **op == TextureOp::Destroy { id: 1 }).count();
    assert_eq!(input_destroys, 1);
}

#[test]
fn canvas_size_change_rebinds_the_downscale_target() {
    let (enhancer, host) = raw_enhancer();
    enhancer.on_animation_frame(host.advance(16.0));

    enhancer.update_canvas_size(BoxSize::new(0.0, 0.0, 1922.0, 1081.0));
    enhancer.on_animation_frame(host.advance(16.0));

    let ledger = host.ledger.borrow();
    assert_eq!(ledger.texture_ops.last(), Some(&TextureOp::Create { id: 6, width: 1920, height: 1080 }));
    assert_eq!(ledger.live_textures(), 3);
}

#[test]
fn odd_native_sizes_are_floored_to_multiples_of_four() {
    let (enhancer, host) = raw_enhancer();
    host.set_natural_size(642, 363);
    enhancer.on_animation_frame(host.advance(16.0));

    let ledger = host.ledger.borrow();
    assert_eq!(ledger.texture_ops[0], TextureOp::Create { id: 1, width: 640, height: 360 });
}

#[test]
fn preset_pipelines_are_cached_per_geometry() {
    let (platform, host) = FakePlatform::new();
    let enhancer = Enhancer::new(platform, EnhancerConfig::default());
    pollster::block_on(enhancer.set_option(PipelineOption::Preset(PresetMode::ModeCA), StateHint::NONE));

    enhancer.on_animation_frame(host.advance(16.0));
    enhancer.on_animation_frame(host.advance(16.0));
    assert_eq!(host.ledger.borrow().textures_created(), 1);

    host.set_natural_size(1280, 720);
    enhancer.on_animation_frame(host.advance(16.0));

    let ledger = host.ledger.borrow();
    assert_eq!(ledger.texture_ops[1], TextureOp::Destroy { id: 1 });
    assert_eq!(ledger.live_textures(), 1);
    assert_eq!(ledger.presents.len(), 3);
}

#[test]
fn teardown_releases_cached_resources() {
    let (enhancer, host) = raw_enhancer();
    enhancer.on_animation_frame(host.advance(16.0));

    enhancer.destroy();

    let ledger = host.ledger.borrow();
    assert_eq!(ledger.live_textures(), 0);
    assert_eq!(ledger.live_devices(), 0);
}
