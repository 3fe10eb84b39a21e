//! Drop shadows behind a rectangular shape.

use glam::{Vec2, Vec4};

use crate::types::{BlendFactors, Region};
use crate::DeviceContext;

use super::blur::{separable, BlurParams};
use super::{check_finite, check_non_negative, draw_quad, prepare, scoped, PassError, Scratch};

/// Largest blur padding around the shadow mask, in pixels.
const MAX_PADDING: u32 = 256;

/// Shadow parameters as carried by a render graph node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    /// Pixel offset of the shadow from the shape.
    pub offset: Vec2,
    /// Straight-alpha RGBA in 0..=1.
    pub color: Vec4,
    pub blur_radius: f32,
    /// Scales the color's alpha, 0..=1.
    pub opacity: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            offset: Vec2::new(0.0, 4.0),
            color: Vec4::new(0.0, 0.0, 0.0, 0.5),
            blur_radius: 8.0,
            opacity: 0.5,
        }
    }
}

impl ShadowParams {
    fn validate(&self) -> Result<(), PassError> {
        check_finite("shadow", "offset", self.offset.to_array())?;
        check_finite("shadow", "color", self.color.to_array())?;
        check_non_negative("shadow", "blur radius", self.blur_radius)?;
        check_non_negative("shadow", "opacity", self.opacity)
    }

    /// The tint color, premultiplied and scaled by opacity.
    fn tint(&self) -> Vec4 {
        let color = self.color.clamp(Vec4::ZERO, Vec4::ONE);
        let alpha = color.w * self.opacity.min(1.0);
        (color.truncate() * alpha).extend(alpha)
    }

    fn padding(&self) -> u32 {
        (self.blur_radius.ceil() as u32).min(MAX_PADDING)
    }
}

/// Draw a shadow for the rectangle `region` of the current target.
///
/// The rectangle's coverage is rendered into a padded mask, blurred, tinted
/// and composited at `offset`. The pixels under `region` itself are put back
/// afterwards, so the shadow only shows around the shape.
///
/// The mask only spans the part of the shadow within blur reach of the clip
/// rectangle, so a shape larger than the maximum texture size still casts
/// its visible shadow.
pub fn shadow(
    ctx: &mut DeviceContext,
    region: Region,
    params: &ShadowParams,
) -> Result<(), PassError> {
    params.validate()?;
    if region.is_empty() || params.tint().w == 0.0 {
        return Ok(());
    }
    let Some((programs, clip)) = prepare(ctx, "shadow")? else {
        return Ok(());
    };

    let padding = params.padding();
    let offset = params.offset.round();
    let shape = region.translate(offset.x as i32, offset.y as i32);
    // Mask pixels further than the blur reach from the clip never show.
    let Some(spot) = shape.expand(padding).intersect(&clip.expand(padding)) else {
        return Ok(());
    };
    if spot.intersect(&clip).is_none() {
        return Ok(());
    }
    log::debug!(
        "shadow {region:?} at {offset} blur {} opacity {}",
        params.blur_radius,
        params.opacity
    );

    scoped(ctx, |ctx| {
        let target = ctx.render_target();
        let mut scratch = Scratch::new();
        let result = (|| -> Result<(), PassError> {
            let mask_size = Region::from_size(spot.width, spot.height);
            let mask = scratch.texture(ctx, spot.width, spot.height)?;

            ctx.set_blend(None);
            ctx.set_render_target(Some(mask));
            ctx.use_shader(Some(programs.flat));
            let local = shape.translate(spot.x.saturating_neg(), spot.y.saturating_neg());
            draw_quad(ctx, local, Vec4::ONE, None, mask_size)?;

            if padding > 0 {
                let blur = BlurParams::new(params.blur_radius, BlurParams::default().samples);
                separable(
                    ctx,
                    &programs,
                    &mut scratch,
                    Some(mask),
                    mask_size,
                    mask_size,
                    &blur,
                )?;
            }

            ctx.set_render_target(target);
            let covered = region.intersect(&clip);
            let saved = match covered {
                Some(area) => {
                    let saved = scratch.texture(ctx, area.width, area.height)?;
                    ctx.copy_region(target, Some(saved), area, (0, 0))?;
                    Some((saved, area))
                }
                None => None,
            };

            ctx.use_shader(Some(programs.tint));
            ctx.set_uniform_vec4("u_color", params.tint());
            ctx.set_blend(Some(BlendFactors::PREMULTIPLIED_OVER));
            draw_quad(ctx, spot, Vec4::ONE, Some(mask), clip)?;

            if let Some((saved, area)) = saved {
                let origin = (area.x as u32, area.y as u32);
                let whole = Region::from_size(area.width, area.height);
                ctx.copy_region(Some(saved), target, whole, origin)?;
            }
            Ok(())
        })();
        scratch.release(ctx);
        result
    })
}
