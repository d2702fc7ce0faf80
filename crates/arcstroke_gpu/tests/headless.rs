//! Offscreen rendering tests
//!
//! These need a GPU adapter and are ignored by default.
//! Run with: cargo test -p arcstroke_gpu -- --ignored

use arcstroke_core::geometry::{coverage, stroke_distance};
use arcstroke_core::sample::{showcase_batch, SHOWCASE_HEIGHT, SHOWCASE_WIDTH};
use arcstroke_core::{
    ArcParams, LineCap, LineJoin, PathBatch, PathBuilder, PathSegment, StrokeStyle,
};
use arcstroke_gpu::{
    capture_texture, BlitPass, CapturedFrame, GpuContext, OffscreenTarget, PathRenderer,
    RendererConfig, RendererError,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn context(config: RendererConfig) -> Option<GpuContext> {
    match pollster::block_on(GpuContext::new(config)) {
        Ok(ctx) => Some(ctx),
        Err(RendererError::AdapterNotFound) => {
            eprintln!("skipping: no GPU adapter");
            None
        }
        Err(e) => panic!("context creation failed: {e}"),
    }
}

fn render(ctx: &GpuContext, renderer: &PathRenderer, target: &OffscreenTarget) -> CapturedFrame {
    renderer.draw(&target.target());
    capture_texture(ctx, &target.texture, target.width, target.height).expect("readback")
}

fn showcase_target(ctx: &GpuContext) -> OffscreenTarget {
    OffscreenTarget::new(
        ctx.device(),
        SHOWCASE_WIDTH,
        SHOWCASE_HEIGHT,
        ctx.texture_format(),
    )
}

#[test]
#[ignore]
fn showcase_draws_five_instances_in_one_call() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&showcase_batch()).unwrap();
    assert_eq!(renderer.instance_count(), 5);

    let target = showcase_target(&ctx);
    let stats = renderer.draw(&target.target());
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.instances, 5);

    let frame = capture_texture(&ctx, &target.texture, target.width, target.height).unwrap();
    assert_eq!(frame.pixel(200, 400), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(400, 250), Some([0, 255, 0, 255]));
    assert_eq!(frame.pixel(600, 400), Some([0, 0, 255, 255]));
    assert_eq!(frame.pixel(750, 750), Some(WHITE));
    assert_eq!(frame.pixel(400, 600), Some(WHITE));
}

#[test]
#[ignore]
fn repeated_draws_are_identical() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&showcase_batch()).unwrap();
    let target = showcase_target(&ctx);

    let first = render(&ctx, &renderer, &target);
    let second = render(&ctx, &renderer, &target);
    assert!(first.is_identical_to(&second));
}

#[test]
#[ignore]
fn replacing_data_round_trips() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    let target = showcase_target(&ctx);

    let a = showcase_batch();
    let b: PathBatch = (0..40)
        .map(|i| {
            let y = 20.0 + i as f32 * 18.0;
            PathSegment::line([50.0, y], [750.0, y]).with_color([0.2, 0.4, 0.6, 1.0])
        })
        .collect();

    renderer.set_data(&a).unwrap();
    let frame_a = render(&ctx, &renderer, &target);
    renderer.set_data(&b).unwrap();
    let frame_b = render(&ctx, &renderer, &target);
    renderer.set_data(&a).unwrap();
    let frame_a2 = render(&ctx, &renderer, &target);

    assert!(!frame_a.is_identical_to(&frame_b));
    assert!(frame_a.is_identical_to(&frame_a2));
}

#[test]
#[ignore]
fn empty_batch_renders_background() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&PathBatch::new()).unwrap();
    let target = OffscreenTarget::new(ctx.device(), 64, 64, ctx.texture_format());

    let stats = renderer.draw(&target.target());
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.instances, 0);

    let frame = capture_texture(&ctx, &target.texture, 64, 64).unwrap();
    assert_eq!(frame.count_pixels(|px| px == WHITE), 64 * 64);
}

#[test]
#[ignore]
fn oversized_batch_is_rejected() {
    let Some(ctx) = context(RendererConfig {
        max_instances: 2,
        ..Default::default()
    }) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&showcase_batch().segments()[..2].to_vec().into()).unwrap();

    let err = renderer.set_data(&showcase_batch()).unwrap_err();
    assert!(matches!(
        err,
        RendererError::InstanceLimit { count: 5, limit: 2 }
    ));
    assert_eq!(renderer.instance_count(), 2);
}

#[test]
#[ignore]
fn style_changes_stroke_width() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&showcase_batch()).unwrap();
    let target = showcase_target(&ctx);

    let wide = render(&ctx, &renderer, &target);
    renderer.set_style(StrokeStyle::default().with_line_width(4.0));
    let thin = render(&ctx, &renderer, &target);

    let inked = |f: &CapturedFrame| f.count_pixels(|px| px != WHITE);
    assert!(inked(&thin) < inked(&wide));
    assert_eq!(wide.pixel(208, 400), Some([255, 0, 0, 255]));
    assert_eq!(thin.pixel(208, 400), Some(WHITE));
}

#[test]
#[ignore]
fn blit_passes_pixels_through() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&showcase_batch()).unwrap();

    let source = showcase_target(&ctx);
    let direct = render(&ctx, &renderer, &source);

    let blit = BlitPass::new(&ctx, ctx.texture_format(), None).unwrap();
    let output = showcase_target(&ctx);
    blit.process(&source.view, &output.target());
    let blitted = capture_texture(&ctx, &output.texture, output.width, output.height).unwrap();

    assert!(direct.is_identical_to(&blitted));
}

#[test]
#[ignore]
fn invalid_blit_effect_fails_to_compile() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let err = BlitPass::new(&ctx, ctx.texture_format(), Some("fn fs_main( {"))
        .err()
        .expect("compile error");
    assert!(matches!(err, RendererError::ShaderCompile { .. }));
}

/// Black strokes full of joins and arcs, one subpath per corner case
fn joins_and_arcs_batch() -> PathBatch {
    PathBuilder::new()
        // zig-zag
        .move_to(30.0, 40.0)
        .line_to(90.0, 140.0)
        .line_to(150.0, 40.0)
        .line_to(210.0, 140.0)
        .line_to(270.0, 40.0)
        // closed triangle
        .move_to(40.0, 200.0)
        .line_to(180.0, 200.0)
        .line_to(110.0, 320.0)
        .close()
        // lines joined to a quadratic
        .move_to(240.0, 200.0)
        .line_to(300.0, 200.0)
        .quad_to(400.0, 200.0, 360.0, 300.0)
        .line_to(280.0, 330.0)
        // lines joined to arcs
        .move_to(40.0, 400.0)
        .line_to(110.0, 400.0)
        .arc_to(ArcParams::new(60.0, 40.0, 0.3).with_sweep(true), 230.0, 400.0)
        .line_to(230.0, 450.0)
        .arc_to(ArcParams::new(30.0, 30.0, 0.0), 290.0, 450.0)
        // sharp turn into a short neighbour
        .move_to(300.0, 380.0)
        .line_to(440.0, 380.0)
        .line_to(420.0, 390.0)
        .build()
}

/// Red channel of black strokes blended over white, from host geometry
fn expected_red(batch: &PathBatch, style: &StrokeStyle, x: u32, y: u32) -> f32 {
    let p = [x as f32 + 0.5, y as f32 + 0.5];
    let remaining: f32 = batch
        .segments()
        .iter()
        .filter_map(|segment| stroke_distance(segment, style, p))
        .map(|d| 1.0 - coverage(d))
        .product();
    255.0 * remaining
}

#[test]
#[ignore]
fn coverage_matches_host_geometry() {
    let Some(ctx) = context(RendererConfig::default()) else {
        return;
    };
    let batch = joins_and_arcs_batch();
    let mut renderer = PathRenderer::new(&ctx).unwrap();
    renderer.set_data(&batch).unwrap();
    let target = OffscreenTarget::new(ctx.device(), 480, 480, ctx.texture_format());

    let styles = [
        StrokeStyle::default().with_join(LineJoin::Miter),
        StrokeStyle::default().with_join(LineJoin::Bevel),
        StrokeStyle::default().with_join(LineJoin::Round),
        StrokeStyle::default().with_cap(LineCap::Round),
    ];
    for style in styles {
        renderer.set_style(style);
        let frame = render(&ctx, &renderer, &target);

        let mut inked = 0;
        let mut mismatched = Vec::new();
        for y in 0..target.height {
            for x in 0..target.width {
                let expected = expected_red(&batch, &style, x, y);
                let actual = frame.pixel(x, y).unwrap()[0] as f32;
                if expected < 128.0 {
                    inked += 1;
                }
                // 0.05 coverage
                if (expected - actual).abs() > 13.0 {
                    mismatched.push((x, y, expected, actual));
                }
            }
        }

        // Float differences can flip the owner of a pixel right on a bisector
        let allowed = (target.width * target.height) as usize / 500;
        assert!(inked > 10_000, "{style:?}: only {inked} inked pixels");
        assert!(
            mismatched.len() <= allowed,
            "{style:?}: {} pixels differ, first {:?}",
            mismatched.len(),
            &mismatched[..mismatched.len().min(8)]
        );
    }
}
