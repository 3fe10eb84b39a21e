//! Blend modes for compositing the next draw.

use crate::types::{BlendFactor, BlendFactors};
use crate::DeviceContext;

use super::PassError;

/// Blend mode selected by a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
}

impl CompositeMode {
    pub const ALL: [CompositeMode; 4] = [Self::Normal, Self::Multiply, Self::Screen, Self::Overlay];

    /// Decode a wire id. Anything outside 0..=3 is rejected.
    pub fn from_id(id: i32) -> Result<Self, PassError> {
        match id {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Multiply),
            2 => Ok(Self::Screen),
            3 => Ok(Self::Overlay),
            _ => Err(PassError::InvalidBlendMode(id)),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Multiply => 1,
            Self::Screen => 2,
            Self::Overlay => 3,
        }
    }

    /// The fixed (source, destination) factor pair of this mode.
    pub fn factors(self) -> BlendFactors {
        use BlendFactor::*;
        match self {
            Self::Normal => BlendFactors::new(SrcAlpha, OneMinusSrcAlpha),
            Self::Multiply => BlendFactors::new(DstColor, Zero),
            Self::Screen => BlendFactors::new(One, OneMinusSrcColor),
            Self::Overlay => BlendFactors::new(SrcAlpha, One),
        }
    }
}

/// Make `mode` the blend pair for following draws.
pub fn composite(ctx: &mut DeviceContext, mode: CompositeMode) {
    log::trace!("composite mode {mode:?}");
    ctx.set_blend(Some(mode.factors()));
}

#[cfg(test)]
mod tests {
    use super::super::test_util::context;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)]
    #[case(1, BlendFactor::DstColor, BlendFactor::Zero)]
    #[case(2, BlendFactor::One, BlendFactor::OneMinusSrcColor)]
    #[case(3, BlendFactor::SrcAlpha, BlendFactor::One)]
    fn test_blend_table(#[case] id: i32, #[case] src: BlendFactor, #[case] dst: BlendFactor) {
        let mode = CompositeMode::from_id(id).unwrap();
        assert_eq!(mode.factors(), BlendFactors::new(src, dst));
        assert_eq!(mode.id(), id);
    }

    #[rstest]
    #[case(4)]
    #[case(-1)]
    #[case(i32::MAX)]
    fn test_out_of_range_rejected(#[case] id: i32) {
        assert_eq!(
            CompositeMode::from_id(id),
            Err(PassError::InvalidBlendMode(id))
        );
    }

    #[test]
    fn test_modes_are_distinct() {
        for a in CompositeMode::ALL {
            for b in CompositeMode::ALL {
                assert_eq!(a == b, a.factors() == b.factors());
            }
        }
    }

    #[test]
    fn test_sets_context_blend() {
        let (mut ctx, recorder) = context(8, 8);
        composite(&mut ctx, CompositeMode::Screen);
        assert_eq!(ctx.blend(), Some(CompositeMode::Screen.factors()));
        assert!(recorder.draws().is_empty());
    }
}
