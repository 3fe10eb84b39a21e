//! Tagged uniform upload.

use glam::{Vec2, Vec3, Vec4};

use crate::DeviceContext;

use super::PassError;

/// Uniform type tag: 0 float, 1 vec2, 2 vec3, 3 vec4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl UniformKind {
    pub fn from_tag(tag: i32) -> Result<Self, PassError> {
        match tag {
            0 => Ok(Self::Float),
            1 => Ok(Self::Vec2),
            2 => Ok(Self::Vec3),
            3 => Ok(Self::Vec4),
            _ => Err(PassError::UnknownUniformType(tag)),
        }
    }

    /// Number of floats a value of this kind holds.
    pub fn arity(self) -> usize {
        match self {
            Self::Float => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
        }
    }
}

/// Set a uniform of the bound program from a tagged value array.
///
/// `values` must hold exactly `kind.arity()` floats.
pub fn upload_uniform(
    ctx: &mut DeviceContext,
    name: &str,
    kind: UniformKind,
    values: &[f32],
) -> Result<(), PassError> {
    if values.len() != kind.arity() {
        return Err(PassError::UniformArity {
            name: name.to_string(),
            expected: kind.arity(),
            actual: values.len(),
        });
    }

    match kind {
        UniformKind::Float => ctx.set_uniform_float(name, values[0]),
        UniformKind::Vec2 => ctx.set_uniform_vec2(name, Vec2::from_slice(values)),
        UniformKind::Vec3 => ctx.set_uniform_vec3(name, Vec3::from_slice(values)),
        UniformKind::Vec4 => ctx.set_uniform_vec4(name, Vec4::from_slice(values)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_util::context;
    use super::*;
    use crate::shader::library;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 2)]
    #[case(2, 3)]
    #[case(3, 4)]
    fn test_arity(#[case] tag: i32, #[case] arity: usize) {
        assert_eq!(UniformKind::from_tag(tag).unwrap().arity(), arity);
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            UniformKind::from_tag(4),
            Err(PassError::UnknownUniformType(4))
        );
    }

    #[test]
    fn test_short_array_rejected() {
        let (mut ctx, _) = context(8, 8);
        assert_eq!(
            upload_uniform(&mut ctx, "u_viewport", UniformKind::Vec4, &[1.0, 2.0]),
            Err(PassError::UniformArity {
                name: "u_viewport".to_string(),
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_dispatches_to_setter() {
        let (mut ctx, _) = context(8, 8);
        let shader = ctx
            .create_shader(library::QUAD_VERTEX, library::FLAT_FRAGMENT)
            .unwrap();
        ctx.use_shader(Some(shader));
        upload_uniform(&mut ctx, "u_viewport", UniformKind::Vec4, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(
            ctx.uniform_value(shader, "u_viewport"),
            Some(vec![1.0, 2.0, 3.0, 4.0])
        );
    }
}
