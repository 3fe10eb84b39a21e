//! Brightness, contrast and saturation.

use glam::Vec4;

use crate::types::Region;
use crate::DeviceContext;

use super::{check_non_negative, draw_quad, prepare, scoped, PassError, Scratch};

/// Multipliers applied per pixel. 1.0 on every axis is the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAdjustParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Default for ColorAdjustParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorAdjustParams {
    pub const IDENTITY: Self = Self {
        brightness: 1.0,
        contrast: 1.0,
        saturation: 1.0,
    };

    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn validate(&self) -> Result<(), PassError> {
        check_non_negative("color_adjust", "brightness", self.brightness)?;
        check_non_negative("color_adjust", "contrast", self.contrast)?;
        check_non_negative("color_adjust", "saturation", self.saturation)
    }
}

/// Adjust `region` of the current target in place.
///
/// Brightness scales the color, contrast scales the distance from mid-grey,
/// and saturation scales the distance from the pixel's luma. Alpha is kept.
pub fn color_adjust(
    ctx: &mut DeviceContext,
    region: Region,
    params: &ColorAdjustParams,
) -> Result<(), PassError> {
    params.validate()?;
    if params.is_identity() {
        return Ok(());
    }
    let Some((programs, clip)) = prepare(ctx, "color_adjust")? else {
        return Ok(());
    };
    let Some(area) = region.intersect(&clip) else {
        return Ok(());
    };
    log::debug!("color adjust {area:?} {params:?}");

    scoped(ctx, |ctx| {
        let target = ctx.render_target();
        let mut scratch = Scratch::new();
        let result = (|| -> Result<(), PassError> {
            let source = scratch.texture(ctx, area.width, area.height)?;
            ctx.copy_region(target, Some(source), area, (0, 0))?;

            ctx.set_blend(None);
            ctx.use_shader(Some(programs.color_adjust));
            ctx.set_uniform_float("u_brightness", params.brightness);
            ctx.set_uniform_float("u_contrast", params.contrast);
            ctx.set_uniform_float("u_saturation", params.saturation);
            draw_quad(ctx, area, Vec4::ONE, Some(source), clip)
        })();
        scratch.release(ctx);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_util::context;
    use super::*;
    use crate::backend::DummyCall;

    #[test]
    fn test_identity_is_noop() {
        let (mut ctx, recorder) = context(32, 32);
        color_adjust(&mut ctx, Region::from_size(8, 8), &ColorAdjustParams::IDENTITY).unwrap();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_uniforms_reach_draw() {
        let (mut ctx, recorder) = context(32, 32);
        let params = ColorAdjustParams::new(1.5, 0.8, 0.0);
        color_adjust(&mut ctx, Region::new(4, 4, 8, 8), &params).unwrap();

        let draws = recorder.draws();
        assert_eq!(draws.len(), 1);
        let DummyCall::Draw {
            uniforms, blend, ..
        } = &draws[0]
        else {
            unreachable!()
        };
        assert_eq!(*blend, None);

        let adjust = uniforms
            .iter()
            .find(|block| block.binding == 0)
            .expect("adjust block");
        let values: Vec<f32> = adjust.bytes[..12]
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(values, vec![1.5, 0.8, 0.0]);
        assert_eq!(recorder.live_textures(), 0);
    }

    #[test]
    fn test_negative_multiplier_rejected() {
        let (mut ctx, _) = context(32, 32);
        let params = ColorAdjustParams::new(1.0, -2.0, 1.0);
        assert!(matches!(
            color_adjust(&mut ctx, Region::from_size(8, 8), &params),
            Err(PassError::InvalidParameter {
                name: "contrast",
                ..
            })
        ));
    }
}
