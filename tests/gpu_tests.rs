//! GPU integration tests.
//!
//! Every test runs against the dummy backend and against each native API
//! wgpu can bring up on the machine. Unavailable backends are skipped.
//! Pixel checks only run where the backend really renders; the dummy
//! backend reports the last clear color for the whole frame.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test gpu_tests
//!
//! # With backend logs
//! RUST_LOG=gfx_compositor=debug cargo test --test gpu_tests -- --nocapture
//! ```

mod common;

use glam::{Vec2, Vec4};
use rstest::rstest;

use common::{get_pixel, verify_pixel, Backend, ExpectedPixel, TestContext, HEIGHT, WIDTH};
use gfx_compositor::shader::library::{QUAD_VERTEX, TEXTURE_FRAGMENT, VIEWPORT_UNIFORM};
use gfx_compositor::{
    passes, BackendKind, BlurParams, ColorAdjustParams, CompositeMode, Gradient, Region,
    RenderGraph, RenderNode, ResourceCounts, ResourceError, ShadowParams, Topology, Vertex,
};

const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
const GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
const WHITE: Vec4 = Vec4::ONE;

// ============================================================================
// Context Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_context_reports_backend(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    assert!(ctx.device.is_valid());
    assert_eq!(ctx.device.backend_kind(), backend.kind());
    assert_eq!(ctx.device.frame_size(), (WIDTH, HEIGHT));
    assert_eq!(ctx.device.viewport(), Region::from_size(WIDTH, HEIGHT));

    let caps = ctx.device.capabilities();
    assert_eq!(caps.backend, backend.kind());
    assert!(caps.max_texture_size >= WIDTH);
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_destroy_is_idempotent(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let texture = ctx.device.create_render_texture(8, 8).unwrap();
    passes::blur(&mut ctx.device, Region::new(0, 0, 16, 16), &BlurParams::default()).unwrap();
    assert!(ctx.device.texture_size(texture).is_some());

    ctx.device.destroy();
    ctx.device.destroy();

    assert!(!ctx.device.is_valid());
    assert_eq!(ctx.device.backend_kind(), BackendKind::None);
    assert_eq!(ctx.device.resource_counts(), ResourceCounts::default());
    assert_eq!(ctx.device.read_pixels(), Err(ResourceError::InvalidContext));
    assert_eq!(
        ctx.device.create_texture(1, 1, &[0; 4]),
        Err(ResourceError::InvalidContext)
    );

    // Rendering on a destroyed context is a no-op.
    ctx.device.clear(RED);
    passes::draw_rect(&mut ctx.device, Region::from_size(4, 4), RED).unwrap();
    assert_eq!(ctx.device.present(), Ok(()));
}

// ============================================================================
// Render Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_clear_readback(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    ctx.device.clear(RED);
    let pixels = ctx.device.read_pixels().unwrap();
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);

    for (x, y) in [(0, 0), (WIDTH / 2, HEIGHT / 2), (WIDTH - 1, HEIGHT - 1)] {
        assert!(
            verify_pixel(&pixels, WIDTH, x, y, ExpectedPixel::RED, 1),
            "pixel ({x}, {y}) is {:?}",
            get_pixel(&pixels, WIDTH, x, y)
        );
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_texture_upload_readback(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let pattern: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 4) as u8).collect();
    let texture = ctx.device.create_texture(4, 4, &pattern).unwrap();
    assert_eq!(ctx.device.texture_size(texture), Some((4, 4)));

    let readback = ctx.device.read_texture(texture).unwrap();
    assert_eq!(readback.len(), pattern.len());
    if ctx.renders() {
        assert_eq!(readback, pattern);
    }

    ctx.device.delete_texture(texture);
    assert_eq!(ctx.device.resource_counts().textures, 0);
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_draw_rect(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    ctx.device.clear(BLACK);
    passes::draw_rect(&mut ctx.device, Region::new(16, 16, 32, 32), GREEN).unwrap();
    let pixels = ctx.device.read_pixels().unwrap();

    assert!(verify_pixel(&pixels, WIDTH, 4, 4, ExpectedPixel::BLACK, 1));
    if ctx.renders() {
        assert!(verify_pixel(&pixels, WIDTH, 32, 32, ExpectedPixel::GREEN, 1));
        assert!(verify_pixel(&pixels, WIDTH, 16, 16, ExpectedPixel::GREEN, 1));
        assert!(verify_pixel(&pixels, WIDTH, 48, 48, ExpectedPixel::BLACK, 1));
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_textured_quad(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let shader = ctx
        .device
        .create_shader(QUAD_VERTEX, TEXTURE_FRAGMENT)
        .unwrap();
    let texture = ctx.device.create_texture(1, 1, &[0, 0, 255, 255]).unwrap();
    let buffer = ctx
        .device
        .create_vertex_buffer(&Vertex::quad(Region::from_size(WIDTH, HEIGHT), WHITE))
        .unwrap();

    ctx.device.clear(BLACK);
    ctx.device.use_shader(Some(shader));
    ctx.device
        .set_uniform_vec4(VIEWPORT_UNIFORM, Vec4::new(0.0, 0.0, WIDTH as f32, HEIGHT as f32));
    ctx.device.bind_buffer(Some(buffer));
    ctx.device.bind_texture(Some(texture), 0);
    ctx.device.draw_arrays(Topology::Triangles, 0, 6).unwrap();

    let pixels = ctx.device.read_pixels().unwrap();
    if ctx.renders() {
        assert!(verify_pixel(&pixels, WIDTH, 10, 50, ExpectedPixel::BLUE, 1));
    }

    assert_eq!(
        ctx.device.resource_counts(),
        ResourceCounts {
            shaders: 1,
            buffers: 1,
            textures: 1
        }
    );
}

// ============================================================================
// Pass Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_blur_keeps_uniform_color(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let graph = RenderGraph::from_nodes(vec![
        RenderNode::Clear { color: RED },
        RenderNode::Blur(BlurParams::new(6.0, 12)),
        RenderNode::DrawRect {
            region: Region::new(8, 8, 48, 48),
            color: RED,
        },
    ]);
    // Blur runs before the rectangle, so it only sees the cleared frame.
    let report = graph.execute(&mut ctx.device).unwrap();
    assert_eq!(report.executed, 3);

    let pixels = ctx.device.read_pixels().unwrap();
    assert!(verify_pixel(&pixels, WIDTH, 32, 32, ExpectedPixel::RED, 2));
    assert!(verify_pixel(&pixels, WIDTH, 9, 9, ExpectedPixel::RED, 2));
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_blur_softens_edge(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    // Black left half, red right half, split at x = 32.
    ctx.device.clear(BLACK);
    passes::draw_rect(&mut ctx.device, Region::new(32, 0, 32, HEIGHT), RED).unwrap();
    passes::blur(
        &mut ctx.device,
        Region::from_size(WIDTH, HEIGHT),
        &BlurParams::new(6.0, 13),
    )
    .unwrap();
    assert_eq!(ctx.device.resource_counts().textures, 0);

    if ctx.renders() {
        let pixels = ctx.device.read_pixels().unwrap();
        let red = |x: u32, y: u32| get_pixel(&pixels, WIDTH, x, y).unwrap().r;

        assert!(verify_pixel(&pixels, WIDTH, 4, 32, ExpectedPixel::BLACK, 1));
        assert!(verify_pixel(&pixels, WIDTH, 60, 32, ExpectedPixel::RED, 1));
        for x in [31, 32] {
            let value = red(x, 32);
            assert!(value > 0 && value < 255, "x={x} r={value}");
        }
        assert!(red(28, 32) < red(31, 32));
        assert!(red(32, 32) < red(36, 32));

        // Every row sees the same vertical edge.
        for x in 24..40 {
            let reference = red(x, 32);
            for y in [2, 16, 48, 61] {
                assert!(
                    red(x, y).abs_diff(reference) <= 1,
                    "x={x} y={y}: {} vs {reference}",
                    red(x, y)
                );
            }
        }
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_shadow_under_rect(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let rect = Region::new(16, 16, 16, 16);
    let graph = RenderGraph::from_nodes(vec![
        RenderNode::Clear { color: WHITE },
        RenderNode::Shadow(ShadowParams {
            offset: Vec2::new(0.0, 8.0),
            color: BLACK,
            blur_radius: 0.0,
            opacity: 1.0,
        }),
        RenderNode::DrawRect { region: rect, color: RED },
    ]);
    graph.execute(&mut ctx.device).unwrap();

    // No temporaries outlive the pass.
    let counts = ctx.device.resource_counts();
    assert_eq!(counts.buffers, 0);
    assert_eq!(counts.textures, 0);

    if ctx.renders() {
        let pixels = ctx.device.read_pixels().unwrap();
        let white = ExpectedPixel::new(255, 255, 255, 255);
        assert!(verify_pixel(&pixels, WIDTH, 24, 24, ExpectedPixel::RED, 1));
        assert!(verify_pixel(&pixels, WIDTH, 24, 36, ExpectedPixel::BLACK, 1));
        assert!(verify_pixel(&pixels, WIDTH, 4, 4, white, 1));
        assert!(verify_pixel(&pixels, WIDTH, 40, 36, white, 1));
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_blurred_shadow_falls_off(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let graph = RenderGraph::from_nodes(vec![
        RenderNode::Clear { color: WHITE },
        RenderNode::Shadow(ShadowParams {
            offset: Vec2::new(0.0, 8.0),
            color: BLACK,
            blur_radius: 4.0,
            opacity: 1.0,
        }),
        RenderNode::DrawRect {
            region: Region::new(16, 16, 16, 16),
            color: RED,
        },
    ]);
    graph.execute(&mut ctx.device).unwrap();
    assert_eq!(ctx.device.resource_counts().textures, 0);

    if ctx.renders() {
        let pixels = ctx.device.read_pixels().unwrap();
        let red = |y: u32| get_pixel(&pixels, WIDTH, 24, y).unwrap().r;

        // The hard shadow edge sits at y = 40; blur spreads it over the radius.
        assert!(verify_pixel(&pixels, WIDTH, 24, 24, ExpectedPixel::RED, 1));
        assert!(red(34) < 32, "r={}", red(34));
        assert!(red(38) < red(40), "{} vs {}", red(38), red(40));
        assert!(red(40) < red(42), "{} vs {}", red(40), red(42));
        assert!(red(38) > 0 && red(42) < 255);
        assert!(red(48) >= 250, "r={}", red(48));
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_gradient_rect(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    ctx.device.clear(BLACK);
    let gradient = Gradient::new(RED, GREEN, 0.0);
    passes::draw_gradient_rect(&mut ctx.device, Region::from_size(WIDTH, HEIGHT), &gradient)
        .unwrap();

    if ctx.renders() {
        let pixels = ctx.device.read_pixels().unwrap();
        let left = get_pixel(&pixels, WIDTH, 1, 32).unwrap();
        let middle = get_pixel(&pixels, WIDTH, 32, 32).unwrap();
        let right = get_pixel(&pixels, WIDTH, 62, 32).unwrap();
        assert!(left.r > 235 && left.g < 20, "{left:?}");
        assert!(right.g > 235 && right.r < 20, "{right:?}");
        assert!(middle.r.abs_diff(128) < 12 && middle.g.abs_diff(128) < 12, "{middle:?}");
        // Horizontal gradient, so columns are uniform.
        assert_eq!(get_pixel(&pixels, WIDTH, 32, 2), Some(middle));
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_rounded_rect_corners(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    ctx.device.clear(WHITE);
    passes::draw_rounded_rect(&mut ctx.device, Region::new(8, 8, 48, 48), RED, 16.0).unwrap();
    assert_eq!(ctx.device.blend(), None);

    if ctx.renders() {
        let pixels = ctx.device.read_pixels().unwrap();
        let white = ExpectedPixel::new(255, 255, 255, 255);
        assert!(verify_pixel(&pixels, WIDTH, 32, 32, ExpectedPixel::RED, 1));
        assert!(verify_pixel(&pixels, WIDTH, 32, 9, ExpectedPixel::RED, 1));
        assert!(verify_pixel(&pixels, WIDTH, 9, 32, ExpectedPixel::RED, 1));
        // Corners are cut away and show the cleared frame.
        assert!(verify_pixel(&pixels, WIDTH, 9, 9, white, 1));
        assert!(verify_pixel(&pixels, WIDTH, 54, 54, white, 1));
        assert!(verify_pixel(&pixels, WIDTH, 4, 4, white, 1));
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_color_adjust_darkens(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let rect = Region::new(0, 0, 32, HEIGHT);
    ctx.device.clear(WHITE);
    passes::color_adjust(&mut ctx.device, rect, &ColorAdjustParams::new(0.0, 1.0, 1.0)).unwrap();

    if ctx.renders() {
        let pixels = ctx.device.read_pixels().unwrap();
        assert!(verify_pixel(&pixels, WIDTH, 10, 10, ExpectedPixel::BLACK, 1));
        assert!(verify_pixel(
            &pixels,
            WIDTH,
            50,
            10,
            ExpectedPixel::new(255, 255, 255, 255),
            1
        ));
    }
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::vulkan(Backend::Vulkan)]
#[case::opengl(Backend::OpenGL)]
#[case::opengles(Backend::OpenGLES)]
fn test_multiply_composite(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    ctx.device.clear(Vec4::new(1.0, 1.0, 0.0, 1.0));
    passes::composite(&mut ctx.device, CompositeMode::Multiply);
    passes::draw_rect(&mut ctx.device, Region::from_size(WIDTH, HEIGHT), Vec4::new(0.0, 1.0, 1.0, 1.0))
        .unwrap();
    assert_eq!(ctx.device.blend(), Some(CompositeMode::Multiply.factors()));

    if ctx.renders() {
        // Yellow times cyan.
        let pixels = ctx.device.read_pixels().unwrap();
        assert!(verify_pixel(&pixels, WIDTH, 32, 32, ExpectedPixel::GREEN, 1));
    }
}
