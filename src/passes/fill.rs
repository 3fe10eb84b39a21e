//! Shaded rectangle fills: linear gradients and rounded corners.

use glam::{Vec2, Vec4};

use crate::types::Region;
use crate::DeviceContext;

use super::{
    check_finite, check_non_negative, draw_quad, prepare, scoped, CompositeMode, PassError,
};

/// Two-color linear gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    /// Straight-alpha RGBA at the start edge.
    pub start: Vec4,
    /// Straight-alpha RGBA at the end edge.
    pub end: Vec4,
    /// Direction in degrees. 0 runs left to right, 90 top to bottom.
    pub angle: f32,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            start: Vec4::ONE,
            end: Vec4::new(0.0, 0.0, 0.0, 1.0),
            angle: 0.0,
        }
    }
}

impl Gradient {
    pub fn new(start: Vec4, end: Vec4, angle: f32) -> Self {
        Self { start, end, angle }
    }

    fn validate(&self) -> Result<(), PassError> {
        check_finite("draw_gradient_rect", "start color", self.start.to_array())?;
        check_finite("draw_gradient_rect", "end color", self.end.to_array())?;
        check_finite("draw_gradient_rect", "angle", [self.angle])
    }
}

/// Fill `region` with `gradient` using the current blend state.
pub fn draw_gradient_rect(
    ctx: &mut DeviceContext,
    region: Region,
    gradient: &Gradient,
) -> Result<(), PassError> {
    gradient.validate()?;
    let Some((programs, clip)) = prepare(ctx, "draw_gradient_rect")? else {
        return Ok(());
    };
    if region.intersect(&clip).is_none() {
        return Ok(());
    }
    log::trace!("gradient {region:?} {gradient:?}");

    scoped(ctx, |ctx| {
        ctx.use_shader(Some(programs.gradient));
        ctx.set_uniform_vec4("u_start", gradient.start);
        ctx.set_uniform_vec4("u_end", gradient.end);
        ctx.set_uniform_float("u_angle", gradient.angle.to_radians());
        draw_quad(ctx, region, Vec4::ONE, None, clip)
    })
}

/// Fill `region` with `color`, cutting the corners to `radius` pixels.
///
/// The radius is clamped to half the shorter side. Corner pixels carry
/// partial alpha; with no blend pair bound they are blended source-over
/// ([`CompositeMode::Normal`]) instead of overwriting the target.
pub fn draw_rounded_rect(
    ctx: &mut DeviceContext,
    region: Region,
    color: Vec4,
    radius: f32,
) -> Result<(), PassError> {
    check_finite("draw_rounded_rect", "color", color.to_array())?;
    check_non_negative("draw_rounded_rect", "corner radius", radius)?;
    let Some((programs, clip)) = prepare(ctx, "draw_rounded_rect")? else {
        return Ok(());
    };
    if region.intersect(&clip).is_none() {
        return Ok(());
    }
    let size = Vec2::new(region.width as f32, region.height as f32);
    let radius = radius.min(size.min_element() * 0.5);

    scoped(ctx, |ctx| {
        if ctx.blend().is_none() {
            ctx.set_blend(Some(CompositeMode::Normal.factors()));
        }
        ctx.use_shader(Some(programs.rounded_rect));
        ctx.set_uniform_vec2("u_size", size);
        ctx.set_uniform_float("u_radius", radius);
        draw_quad(ctx, region, color, None, clip)
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_util::context;
    use super::*;
    use crate::backend::DummyCall;
    use crate::types::BlendFactors;

    fn only_draw(calls: Vec<DummyCall>) -> (Option<BlendFactors>, Vec<u8>) {
        match calls.as_slice() {
            [DummyCall::Draw {
                blend, uniforms, ..
            }] => {
                let block = uniforms.iter().find(|block| block.binding == 0);
                (*blend, block.expect("pass block").bytes.clone())
            }
            other => panic!("expected one draw, got {other:?}"),
        }
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect()
    }

    #[test]
    fn test_gradient_uniforms() {
        let (mut ctx, recorder) = context(32, 32);
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let gradient = Gradient::new(red, blue, 90.0);
        draw_gradient_rect(&mut ctx, Region::new(4, 4, 8, 8), &gradient).unwrap();

        let (blend, bytes) = only_draw(recorder.draws());
        assert_eq!(blend, None);
        let values = floats(&bytes);
        assert_eq!(&values[..8], &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        assert!((values[8] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(ctx.bound_shader(), None);
    }

    #[test]
    fn test_gradient_keeps_blend_mode() {
        let (mut ctx, recorder) = context(32, 32);
        ctx.set_blend(Some(CompositeMode::Screen.factors()));
        draw_gradient_rect(&mut ctx, Region::from_size(8, 8), &Gradient::default()).unwrap();
        let (blend, _) = only_draw(recorder.draws());
        assert_eq!(blend, Some(CompositeMode::Screen.factors()));
    }

    #[test]
    fn test_gradient_nan_angle_rejected() {
        let (mut ctx, recorder) = context(32, 32);
        let gradient = Gradient {
            angle: f32::NAN,
            ..Default::default()
        };
        let err = draw_gradient_rect(&mut ctx, Region::from_size(8, 8), &gradient);
        assert!(matches!(
            err,
            Err(PassError::InvalidParameter { name: "angle", .. })
        ));
        assert!(recorder.draws().is_empty());
    }

    #[test]
    fn test_rounded_radius_clamped() {
        let (mut ctx, recorder) = context(64, 64);
        draw_rounded_rect(&mut ctx, Region::new(0, 0, 40, 10), Vec4::ONE, 12.0).unwrap();

        let (blend, bytes) = only_draw(recorder.draws());
        assert_eq!(blend, Some(CompositeMode::Normal.factors()));
        // u_size then u_radius
        assert_eq!(&floats(&bytes)[..3], &[40.0, 10.0, 5.0]);
        assert_eq!(ctx.blend(), None);
    }

    #[test]
    fn test_rounded_negative_radius_rejected() {
        let (mut ctx, _) = context(16, 16);
        let err = draw_rounded_rect(&mut ctx, Region::from_size(8, 8), Vec4::ONE, -1.0);
        assert!(matches!(
            err,
            Err(PassError::InvalidParameter {
                name: "corner radius",
                ..
            })
        ));
    }

    #[test]
    fn test_fills_outside_viewport_are_noops() {
        let (mut ctx, recorder) = context(16, 16);
        let far = Region::new(100, 100, 4, 4);
        draw_gradient_rect(&mut ctx, far, &Gradient::default()).unwrap();
        draw_rounded_rect(&mut ctx, far, Vec4::ONE, 2.0).unwrap();
        assert!(recorder.draws().is_empty());
    }
}
