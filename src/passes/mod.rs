//! Pass library: the fixed catalog of compositing operations.
//!
//! Every pass is a function of a [`DeviceContext`], a pixel [`Region`] and a
//! parameter record. Passes draw through the same resource contract callers
//! use (programs, static buffers, textures, blend state) and leave the
//! context's bindings as they found them, except [`composite`] whose whole
//! purpose is to change the blend pair for the next draw.
//!
//! Regions are clipped to the current viewport and target; a region that
//! ends up empty turns the pass into a no-op. Off-screen targets a pass
//! needs are created and deleted inside the call.
//!
//! | Pass | Parameters | Draws |
//! |------|------------|-------|
//! | [`blur`] | [`BlurParams`] | horizontal then vertical 1-D gaussian |
//! | [`shadow`] | [`ShadowParams`] | mask, blur, tint, composite behind |
//! | [`composite`] | [`CompositeMode`] | none, sets blending |
//! | [`color_adjust`] | [`ColorAdjustParams`] | one full-region pass |
//! | [`upload_uniform`] | [`UniformKind`] + values | none |
//! | [`draw_rect`] | color | one flat quad |
//! | [`draw_gradient_rect`] | [`Gradient`] | one gradient quad |
//! | [`draw_rounded_rect`] | color, corner radius | one coverage-masked quad |

mod blur;
mod color_adjust;
mod composite;
mod fill;
mod shadow;
mod uniform;

use glam::Vec4;
use thiserror::Error;

use crate::error::ResourceError;
use crate::shader::library;
use crate::types::{Region, ShaderHandle, TextureHandle, Topology, Vertex};
use crate::DeviceContext;

pub use blur::{blur, BlurParams};
pub use color_adjust::{color_adjust, ColorAdjustParams};
pub use composite::{composite, CompositeMode};
pub use fill::{draw_gradient_rect, draw_rounded_rect, Gradient};
pub use shadow::{shadow, ShadowParams};
pub use uniform::{upload_uniform, UniformKind};

/// Why a pass did not run to completion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PassError {
    #[error("{pass}: invalid {name} {value}")]
    InvalidParameter {
        pass: &'static str,
        name: &'static str,
        value: f32,
    },
    #[error("blend mode {0} is not one of 0..=3")]
    InvalidBlendMode(i32),
    #[error("uniform type tag {0} is not one of 0..=3")]
    UnknownUniformType(i32),
    #[error("uniform '{name}' expects {expected} values, got {actual}")]
    UniformArity {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Programs shared by every pass on one context, built on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PassPrograms {
    pub flat: ShaderHandle,
    pub blur: ShaderHandle,
    pub tint: ShaderHandle,
    pub color_adjust: ShaderHandle,
    pub gradient: ShaderHandle,
    pub rounded_rect: ShaderHandle,
}

impl PassPrograms {
    fn create(ctx: &mut DeviceContext) -> Result<Self, ResourceError> {
        let fragments = [
            library::FLAT_FRAGMENT,
            library::BLUR_FRAGMENT,
            library::TINT_FRAGMENT,
            library::COLOR_ADJUST_FRAGMENT,
            library::GRADIENT_FRAGMENT,
            library::ROUNDED_RECT_FRAGMENT,
        ];
        let mut created = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            match ctx.create_shader(library::QUAD_VERTEX, fragment) {
                Ok(handle) => created.push(handle),
                Err(e) => {
                    for handle in created {
                        ctx.delete_shader(handle);
                    }
                    return Err(e);
                }
            }
        }
        log::debug!("built {} pass programs", created.len());
        Ok(Self {
            flat: created[0],
            blur: created[1],
            tint: created[2],
            color_adjust: created[3],
            gradient: created[4],
            rounded_rect: created[5],
        })
    }
}

/// The context's pass programs, building them if needed.
pub(crate) fn programs(ctx: &mut DeviceContext) -> Result<PassPrograms, ResourceError> {
    if !ctx.is_valid() {
        return Err(ResourceError::InvalidContext);
    }
    if let Some(programs) = ctx.pass_programs {
        return Ok(programs);
    }
    let programs = PassPrograms::create(ctx)?;
    ctx.pass_programs = Some(programs);
    Ok(programs)
}

/// Programs plus the clip rectangle, or `None` when the pass has nothing to
/// do: the context is invalid or the viewport misses the target.
pub(crate) fn prepare(
    ctx: &mut DeviceContext,
    pass: &str,
) -> Result<Option<(PassPrograms, Region)>, PassError> {
    if !ctx.is_valid() {
        log::warn!("{pass} ignored: device context {} is invalid", ctx.id().raw());
        return Ok(None);
    }
    let Some(clip) = clip_rect(ctx) else {
        log::trace!("{pass}: viewport is outside the target");
        return Ok(None);
    };
    Ok(Some((programs(ctx)?, clip)))
}

/// Run `pass` and put the context's bindings back afterwards, on success or
/// failure.
pub(crate) fn scoped<T>(
    ctx: &mut DeviceContext,
    pass: impl FnOnce(&mut DeviceContext) -> Result<T, PassError>,
) -> Result<T, PassError> {
    let saved = ctx.save_state();
    let result = pass(ctx);
    ctx.restore_state(saved);
    result
}

/// Pixel bounds of the current render target.
pub(crate) fn target_bounds(ctx: &DeviceContext) -> Region {
    let (width, height) = match ctx.render_target() {
        Some(texture) => ctx.texture_size(texture).unwrap_or((0, 0)),
        None => ctx.frame_size(),
    };
    Region::from_size(width, height)
}

/// The drawable part of the current target: viewport clipped to bounds.
pub(crate) fn clip_rect(ctx: &DeviceContext) -> Option<Region> {
    ctx.viewport().intersect(&target_bounds(ctx))
}

/// Off-screen targets owned by one pass call. Released explicitly, newest
/// first, once the pass is done with them.
pub(crate) struct Scratch {
    textures: Vec<TextureHandle>,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
        }
    }

    pub fn texture(
        &mut self,
        ctx: &mut DeviceContext,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, ResourceError> {
        let texture = ctx.create_render_texture(width, height)?;
        self.textures.push(texture);
        Ok(texture)
    }

    pub fn release(self, ctx: &mut DeviceContext) {
        for texture in self.textures.into_iter().rev() {
            ctx.delete_texture(texture);
        }
    }
}

/// Draw one quad with the bound program into the current target.
///
/// `clip` becomes both the draw viewport and `u_viewport`, so `quad` is
/// given in target pixels. `source` is sampled from slot 0.
pub(crate) fn draw_quad(
    ctx: &mut DeviceContext,
    quad: Region,
    color: Vec4,
    source: Option<TextureHandle>,
    clip: Region,
) -> Result<(), PassError> {
    ctx.set_viewport(clip.x, clip.y, clip.width, clip.height);
    ctx.set_uniform_vec4(
        library::VIEWPORT_UNIFORM,
        Vec4::new(
            clip.x as f32,
            clip.y as f32,
            clip.width as f32,
            clip.height as f32,
        ),
    );
    ctx.bind_texture(source, 0);

    let buffer = ctx.create_vertex_buffer(&Vertex::quad(quad, color))?;
    ctx.bind_buffer(Some(buffer));
    let drawn = ctx.draw_arrays(Topology::Triangles, 0, 6);
    ctx.delete_buffer(buffer);
    Ok(drawn?)
}

/// Fill `region` with a solid color using the current blend state.
pub fn draw_rect(ctx: &mut DeviceContext, region: Region, color: Vec4) -> Result<(), PassError> {
    check_finite("draw_rect", "color", color.to_array())?;
    let Some((programs, clip)) = prepare(ctx, "draw_rect")? else {
        return Ok(());
    };
    if region.intersect(&clip).is_none() {
        log::trace!("draw_rect: {region:?} outside {clip:?}");
        return Ok(());
    }

    scoped(ctx, |ctx| {
        ctx.use_shader(Some(programs.flat));
        draw_quad(ctx, region, color, None, clip)
    })
}

pub(crate) fn check_finite<const N: usize>(
    pass: &'static str,
    name: &'static str,
    values: [f32; N],
) -> Result<(), PassError> {
    match values.into_iter().find(|value| !value.is_finite()) {
        Some(value) => Err(PassError::InvalidParameter { pass, name, value }),
        None => Ok(()),
    }
}

pub(crate) fn check_non_negative(
    pass: &'static str,
    name: &'static str,
    value: f32,
) -> Result<(), PassError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PassError::InvalidParameter { pass, name, value });
    }
    Ok(())
}
