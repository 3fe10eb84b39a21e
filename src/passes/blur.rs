//! Separable gaussian blur.

use glam::{Vec2, Vec4};

use crate::types::{Region, TextureHandle};
use crate::DeviceContext;

use super::{check_non_negative, draw_quad, prepare, scoped, PassError, PassPrograms, Scratch};

/// Most kernel taps evaluated per axis.
pub const MAX_SAMPLES: u32 = 64;

/// Blur parameters as carried by a render graph node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    /// Kernel half-width in pixels. Zero leaves the region untouched.
    pub radius: f32,
    /// Taps per axis, clamped to `1..=MAX_SAMPLES`.
    pub samples: u32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            radius: 5.0,
            samples: 8,
        }
    }
}

impl BlurParams {
    pub fn new(radius: f32, samples: u32) -> Self {
        Self { radius, samples }
    }

    pub(crate) fn validate(&self, pass: &'static str) -> Result<(), PassError> {
        check_non_negative(pass, "blur radius", self.radius)
    }

    pub fn effective_samples(&self) -> u32 {
        self.samples.clamp(1, MAX_SAMPLES)
    }
}

/// Blur `region` of the current target in place.
///
/// The region is copied off-screen, blurred horizontally into a second
/// texture, then blurred vertically back into the target.
pub fn blur(ctx: &mut DeviceContext, region: Region, params: &BlurParams) -> Result<(), PassError> {
    params.validate("blur")?;
    if params.radius == 0.0 {
        return Ok(());
    }
    let Some((programs, clip)) = prepare(ctx, "blur")? else {
        return Ok(());
    };
    let Some(area) = region.intersect(&clip) else {
        return Ok(());
    };

    log::debug!(
        "blur {area:?} radius {} with {} samples",
        params.radius,
        params.effective_samples()
    );
    scoped(ctx, |ctx| {
        let target = ctx.render_target();
        let mut scratch = Scratch::new();
        let result = separable(ctx, &programs, &mut scratch, target, area, clip, params);
        scratch.release(ctx);
        result
    })
}

/// Both blur axes over `area` of `target`, which must lie inside `clip`.
pub(crate) fn separable(
    ctx: &mut DeviceContext,
    programs: &PassPrograms,
    scratch: &mut Scratch,
    target: Option<TextureHandle>,
    area: Region,
    clip: Region,
    params: &BlurParams,
) -> Result<(), PassError> {
    let (width, height) = (area.width, area.height);
    let source = scratch.texture(ctx, width, height)?;
    let horizontal = scratch.texture(ctx, width, height)?;
    ctx.copy_region(target, Some(source), area, (0, 0))?;

    let local = Region::from_size(width, height);
    ctx.set_blend(None);
    ctx.use_shader(Some(programs.blur));
    ctx.set_uniform_vec2(
        "u_texel",
        Vec2::new(1.0 / width as f32, 1.0 / height as f32),
    );
    ctx.set_uniform_float("u_radius", params.radius);
    ctx.set_uniform_float("u_samples", params.effective_samples() as f32);

    ctx.set_render_target(Some(horizontal));
    ctx.set_uniform_vec2("u_direction", Vec2::X);
    draw_quad(ctx, local, Vec4::ONE, Some(source), local)?;

    ctx.set_render_target(target);
    ctx.set_uniform_vec2("u_direction", Vec2::Y);
    draw_quad(ctx, area, Vec4::ONE, Some(horizontal), clip)
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{context, pass_calls};
    use super::*;
    use crate::backend::DummyCall;

    #[test]
    fn test_two_axis_passes() {
        let (mut ctx, recorder) = context(64, 64);
        blur(&mut ctx, Region::new(8, 8, 16, 16), &BlurParams::new(4.0, 8)).unwrap();

        let calls = pass_calls(&recorder);
        let draws: Vec<_> = calls
            .iter()
            .filter(|call| matches!(call, DummyCall::Draw { .. }))
            .collect();
        assert_eq!(draws.len(), 2);

        match (draws[0], draws[1]) {
            (
                DummyCall::Draw {
                    target: first_target,
                    viewport: first_viewport,
                    ..
                },
                DummyCall::Draw {
                    target: second_target,
                    viewport: second_viewport,
                    ..
                },
            ) => {
                assert!(first_target.is_some());
                assert_eq!(*first_viewport, Region::from_size(16, 16));
                assert_eq!(*second_target, None);
                assert_eq!(*second_viewport, Region::from_size(64, 64));
            }
            _ => unreachable!(),
        }

        assert!(calls.iter().any(|call| matches!(
            call,
            DummyCall::Copy {
                src: None,
                region: Region {
                    x: 8,
                    y: 8,
                    width: 16,
                    height: 16
                },
                ..
            }
        )));
        assert_eq!(recorder.live_textures(), 0);
        assert_eq!(recorder.live_buffers(), 0);
    }

    #[test]
    fn test_zero_radius_is_noop() {
        let (mut ctx, recorder) = context(32, 32);
        blur(&mut ctx, Region::from_size(8, 8), &BlurParams::new(0.0, 8)).unwrap();
        assert!(recorder.draws().is_empty());
    }

    #[test]
    fn test_region_clamped_to_viewport() {
        let (mut ctx, recorder) = context(32, 32);
        ctx.set_viewport(0, 0, 16, 16);
        blur(&mut ctx, Region::new(8, 8, 100, 100), &BlurParams::default()).unwrap();

        let copy = recorder
            .calls()
            .into_iter()
            .find(|call| matches!(call, DummyCall::Copy { .. }));
        assert!(matches!(
            copy,
            Some(DummyCall::Copy {
                region: Region {
                    x: 8,
                    y: 8,
                    width: 8,
                    height: 8
                },
                ..
            })
        ));
    }

    #[test]
    fn test_samples_clamped() {
        assert_eq!(BlurParams::new(1.0, 0).effective_samples(), 1);
        assert_eq!(BlurParams::new(1.0, 500).effective_samples(), MAX_SAMPLES);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let (mut ctx, _) = context(32, 32);
        assert!(matches!(
            blur(&mut ctx, Region::from_size(8, 8), &BlurParams::new(-1.0, 8)),
            Err(PassError::InvalidParameter { pass: "blur", .. })
        ));
    }

    #[test]
    fn test_bindings_restored() {
        let (mut ctx, _) = context(32, 32);
        let target = ctx.create_render_texture(32, 32).unwrap();
        ctx.set_render_target(Some(target));
        blur(&mut ctx, Region::from_size(8, 8), &BlurParams::default()).unwrap();

        assert_eq!(ctx.render_target(), Some(target));
        assert_eq!(ctx.bound_shader(), None);
        assert_eq!(ctx.bound_texture(0), None);
        assert_eq!(ctx.blend(), None);
        assert_eq!(ctx.viewport(), Region::from_size(32, 32));
    }
}
