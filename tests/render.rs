extern crate hypermandel;

use hypermandel::renderer::{ESCAPED, NOT_COMPUTED};
use hypermandel::{
    CancelToken, Color, FormulaKind, FractalInfo, Light, Palette, RenderContext, RenderError,
    RenderState, Renderer, Resolution, Shader,
};
use std::sync::Arc;

fn solid_scene(width: usize, height: usize, supersample: bool) -> Arc<FractalInfo> {
    let mut scene = FractalInfo::default();
    scene.resolution = Resolution::new(width, height);
    scene.fractal.formula = FormulaKind::Solid;
    scene.lights = vec![Light::ambient(1.0)];
    scene.shader = Shader::Lambert;
    scene.palette = Arc::new(Palette::constant(Color::new(0.2, 0.4, 0.8)));
    scene.supersample = supersample;
    Arc::new(scene)
}

fn julia_scene(width: usize, height: usize, supersample: bool) -> Arc<FractalInfo> {
    let mut scene = FractalInfo::default();
    scene.resolution = Resolution::new(width, height);
    scene.supersample = supersample;
    Arc::new(scene)
}

fn render(scene: Arc<FractalInfo>, context: RenderContext) -> hypermandel::RenderResult {
    let mut renderer = Renderer::for_scene(scene, context).unwrap();
    renderer.render_all(&CancelToken::new()).unwrap()
}

#[test]
fn solid_scene_is_flat_palette_color() {
    let expected = Color::new(0.2, 0.4, 0.8).to_rgb8();
    for &supersample in &[false, true] {
        let result = render(solid_scene(4, 4, supersample), RenderContext::new(1));
        assert!(result.completed);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(result.pixel(x, y), expected);
                let d = result.depth(x, y);
                assert!(d.is_finite(), "depth at {},{} was {}", x, y, d);
            }
        }
    }
}

#[test]
fn renders_are_reproducible() {
    let a = render(julia_scene(12, 9, true), RenderContext::new(77));
    let b = render(julia_scene(12, 9, true), RenderContext::new(77));
    assert_eq!(a.pixels.into_raw(), b.pixels.into_raw());
    assert_eq!(a.depths, b.depths);
}

#[test]
fn visiting_order_does_not_change_the_picture() {
    let first = RenderContext {
        dissolve_seed: 1,
        jitter_seed: 99,
    };
    let second = RenderContext {
        dissolve_seed: 2,
        jitter_seed: 99,
    };
    let a = render(julia_scene(10, 10, true), first);
    let b = render(julia_scene(10, 10, true), second);
    assert_eq!(a.pixels.into_raw(), b.pixels.into_raw());
    assert_eq!(a.depths, b.depths);
}

#[test]
fn parallel_and_sequential_agree() {
    for &supersample in &[false, true] {
        let sequential = render(julia_scene(16, 11, supersample), RenderContext::new(5));
        let mut renderer =
            Renderer::for_scene(julia_scene(16, 11, supersample), RenderContext::new(5)).unwrap();
        let parallel = renderer.render_parallel(3, &CancelToken::new()).unwrap();
        assert!(parallel.completed);
        assert_eq!(renderer.state(), RenderState::Completed);
        assert_eq!(sequential.pixels.into_raw(), parallel.pixels.into_raw());
        assert_eq!(sequential.depths, parallel.depths);
    }
}

#[test]
fn single_pixels_match_the_buffer() {
    let scene = julia_scene(8, 6, false);
    let mut renderer = Renderer::for_scene(scene, RenderContext::new(3)).unwrap();
    let result = renderer.render_all(&CancelToken::new()).unwrap();
    for (x, y) in &[(0, 0), (3, 2), (7, 5)] {
        let sample = renderer.render_pixel(*x, *y).unwrap();
        assert_eq!(sample.color.to_rgb8(), result.pixel(*x, *y));
        assert_eq!(sample.depth, result.depth(*x, *y));
    }
}

#[test]
fn cancellation_stops_between_pixels_and_resumes() {
    let context = RenderContext::new(11);
    let mut renderer = Renderer::for_scene(solid_scene(6, 5, false), context).unwrap();
    renderer.set_progress_interval(1);

    let cancel = CancelToken::new();
    let token = cancel.clone();
    let partial = renderer
        .render_all_with_progress(&cancel, |p| {
            if p.rendered == 7 {
                token.cancel();
            }
        })
        .unwrap();
    assert!(!partial.completed);
    assert_eq!(renderer.state(), RenderState::Cancelled);
    assert_eq!(renderer.target().computed(), 7);

    let visited: Vec<(usize, usize)> = context.dissolve(6, 5).take(7).collect();
    for y in 0..5 {
        for x in 0..6 {
            let d = partial.depth(x, y);
            if visited.contains(&(x, y)) {
                assert!(d.is_finite());
            } else {
                assert_eq!(d, NOT_COMPUTED);
            }
        }
    }

    cancel.reset();
    let resumed = renderer.render_all(&cancel).unwrap();
    assert!(resumed.completed);
    assert_eq!(renderer.state(), RenderState::Completed);
    let fresh = render(solid_scene(6, 5, false), context);
    assert_eq!(resumed.pixels.into_raw(), fresh.pixels.into_raw());
    assert_eq!(resumed.depths, fresh.depths);
}

#[test]
fn parallel_finishes_a_cancelled_render() {
    let context = RenderContext::new(12);
    let mut renderer = Renderer::for_scene(julia_scene(9, 7, false), context).unwrap();
    renderer.set_progress_interval(1);
    let cancel = CancelToken::new();
    let token = cancel.clone();
    renderer
        .render_all_with_progress(&cancel, |p| {
            if p.rendered == 20 {
                token.cancel();
            }
        })
        .unwrap();
    cancel.reset();
    let finished = renderer.render_parallel(2, &cancel).unwrap();
    assert!(finished.completed);
    let fresh = render(julia_scene(9, 7, false), context);
    assert_eq!(finished.pixels.into_raw(), fresh.pixels.into_raw());
}

#[test]
fn a_cancelled_token_renders_nothing() {
    let mut renderer = Renderer::for_scene(solid_scene(3, 3, false), RenderContext::new(1)).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = renderer.render_all(&cancel).unwrap();
    assert!(!result.completed);
    assert!(result.depths.iter().all(|&d| d == NOT_COMPUTED));
    let result = renderer.render_parallel(2, &cancel).unwrap();
    assert!(!result.completed);
}

#[test]
fn empty_rasters_are_refused() {
    let mut renderer = Renderer::new(RenderContext::new(1));
    assert_eq!(
        renderer.configure(Resolution::new(0, 4), solid_scene(1, 1, false)),
        Err(RenderError::InvalidResolution {
            width: 0,
            height: 4
        })
    );
    assert_eq!(renderer.state(), RenderState::Idle);
    assert!(Renderer::for_scene(solid_scene(5, 0, false), RenderContext::new(1)).is_err());
}

#[test]
fn nothing_to_hit_leaves_escaped_depths() {
    let mut scene = (*solid_scene(3, 2, true)).clone();
    scene.fractal.formula = FormulaKind::Quadratic;
    scene.camera.eye = hypermandel::Vector3::new(40.0, 0.0, -3.0);
    scene.background = Color::WHITE;
    let result = render(Arc::new(scene), RenderContext::new(2));
    assert!(result.depths.iter().all(|&d| d == ESCAPED));
    assert_eq!(result.pixel(2, 1), [255, 255, 255]);
}

#[test]
fn flat_fields_are_lit_as_if_facing_the_eye() {
    // The solid set has no gradient, so every hit falls back to a normal
    // pointing back along the ray.  A light shining down the view
    // direction then lights it fully.
    let mut scene = (*solid_scene(4, 3, false)).clone();
    scene.lights = vec![Light::directional(scene.camera.forward(), 1.0)];
    let expected = Color::new(0.2, 0.4, 0.8).to_rgb8();
    let result = render(Arc::new(scene), RenderContext::new(8));
    for y in 0..3 {
        for x in 0..4 {
            assert_eq!(result.pixel(x, y), expected);
        }
    }
}

#[test]
fn cancelling_after_the_last_pixel_is_still_complete() {
    let mut renderer = Renderer::for_scene(solid_scene(2, 2, false), RenderContext::new(9)).unwrap();
    renderer.set_progress_interval(1);
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let result = renderer
        .render_all_with_progress(&cancel, |p| {
            if p.rendered == 4 {
                token.cancel();
            }
        })
        .unwrap();
    assert!(result.completed);
    assert_eq!(renderer.target().computed(), 4);
    assert_eq!(renderer.state(), RenderState::Completed);
}
