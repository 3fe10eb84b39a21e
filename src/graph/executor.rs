//! Graph execution against a device context.

use thiserror::Error;

use crate::passes::{self, PassError};
use crate::types::Region;
use crate::DeviceContext;

use super::{DecodeError, RenderGraph, RenderNode, WireGraph};

/// Why a graph stopped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The wire graph is corrupt; no node ran.
    #[error("render graph decode failed: {0}")]
    Decode(#[from] DecodeError),
    /// A node failed; nodes before it ran, nodes after it did not.
    #[error("render graph node {index} failed: {source}")]
    Pass {
        index: usize,
        #[source]
        source: PassError,
    },
}

/// Outcome of a completed graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Nodes run, which is every node of the graph.
    pub executed: usize,
}

impl RenderGraph {
    /// Run every node in order, stopping at the first failure.
    ///
    /// Effect nodes (blur, shadow, color adjust) have no region of their
    /// own. Each applies to the rectangle of the next shape node (solid,
    /// gradient or rounded fill) after it, or of the last one before it
    /// when none follows, or to the whole viewport when the graph draws no
    /// rectangle.
    pub fn execute(&self, ctx: &mut DeviceContext) -> Result<ExecutionReport, GraphError> {
        let scopes = effect_regions(&self.nodes, ctx.viewport());
        log::debug!("executing render graph of {} nodes", self.nodes.len());

        for (index, node) in self.nodes.iter().enumerate() {
            log::trace!("node {index}: {node:?}");
            run_node(ctx, node, scopes[index])
                .map_err(|source| GraphError::Pass { index, source })?;
        }
        Ok(ExecutionReport {
            executed: self.nodes.len(),
        })
    }
}

impl WireGraph {
    /// Decode the whole graph, then execute it. A corrupt graph runs nothing.
    pub fn execute(&self, ctx: &mut DeviceContext) -> Result<ExecutionReport, GraphError> {
        let graph = RenderGraph::from_wire(self).inspect_err(|e| log::warn!("{e}"))?;
        graph.execute(ctx)
    }
}

fn run_node(ctx: &mut DeviceContext, node: &RenderNode, scope: Region) -> Result<(), PassError> {
    match node {
        RenderNode::Clear { color } => {
            ctx.clear(*color);
            Ok(())
        }
        RenderNode::DrawRect { region, color } => passes::draw_rect(ctx, *region, *color),
        RenderNode::Blur(params) => passes::blur(ctx, scope, params),
        RenderNode::Shadow(params) => passes::shadow(ctx, scope, params),
        RenderNode::Composite(mode) => {
            passes::composite(ctx, *mode);
            Ok(())
        }
        RenderNode::ColorAdjust(params) => passes::color_adjust(ctx, scope, params),
        RenderNode::GradientRect { region, gradient } => {
            passes::draw_gradient_rect(ctx, *region, gradient)
        }
        RenderNode::RoundedRect {
            region,
            color,
            radius,
        } => passes::draw_rounded_rect(ctx, *region, *color, *radius),
    }
}

/// Region each node applies to. Only meaningful for effect nodes.
fn effect_regions(nodes: &[RenderNode], viewport: Region) -> Vec<Region> {
    let mut following = vec![None; nodes.len()];
    let mut next = None;
    for (index, node) in nodes.iter().enumerate().rev() {
        next = node.shape().or(next);
        following[index] = next;
    }

    let mut last = None;
    nodes
        .iter()
        .zip(following)
        .map(|(node, following)| {
            let scope = following.or(last).unwrap_or(viewport);
            last = node.shape().or(last);
            scope
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, DummyCall, DummyRecorder};
    use crate::passes::{BlurParams, ColorAdjustParams, CompositeMode};
    use crate::types::{BackendKind, BlendFactors};
    use glam::Vec4;

    fn context() -> (DeviceContext, DummyRecorder) {
        let backend = DummyBackend::new(BackendKind::OpenGL, 64, 64);
        let recorder = backend.recorder();
        (DeviceContext::new(Box::new(backend)), recorder)
    }

    fn rect(x: i32) -> RenderNode {
        RenderNode::DrawRect {
            region: Region::new(x, 0, 8, 8),
            color: Vec4::ONE,
        }
    }

    #[test]
    fn test_effect_scoping() {
        let blur = RenderNode::Blur(BlurParams::default());
        let viewport = Region::from_size(64, 64);

        assert_eq!(effect_regions(&[blur], viewport), vec![viewport]);
        assert_eq!(
            effect_regions(&[blur, rect(1), blur, rect(2), blur], viewport),
            vec![
                Region::new(1, 0, 8, 8),
                Region::new(1, 0, 8, 8),
                Region::new(2, 0, 8, 8),
                Region::new(2, 0, 8, 8),
                Region::new(2, 0, 8, 8),
            ]
        );
    }

    #[test]
    fn test_effects_scope_to_any_fill() {
        let blur = RenderNode::Blur(BlurParams::default());
        let region = Region::new(3, 5, 7, 9);
        let rounded = RenderNode::RoundedRect {
            region,
            color: Vec4::ONE,
            radius: 2.0,
        };
        assert_eq!(
            effect_regions(&[blur, rounded], Region::from_size(64, 64)),
            vec![region, region]
        );
    }

    #[test]
    fn test_executes_in_order() {
        let (mut ctx, recorder) = context();
        let graph = RenderGraph::from_nodes(vec![
            RenderNode::Clear {
                color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            },
            RenderNode::Composite(CompositeMode::Multiply),
            rect(4),
        ]);
        let report = graph.execute(&mut ctx).unwrap();
        assert_eq!(report.executed, 3);

        let calls = recorder.calls();
        let clear = calls
            .iter()
            .position(|call| matches!(call, DummyCall::Clear { .. }))
            .unwrap();
        let draw = calls
            .iter()
            .position(|call| matches!(call, DummyCall::Draw { .. }))
            .unwrap();
        assert!(clear < draw);
        assert!(matches!(
            &calls[draw],
            DummyCall::Draw { blend: Some(b), .. } if *b == CompositeMode::Multiply.factors()
        ));
    }

    #[test]
    fn test_decode_failure_runs_nothing() {
        let (mut ctx, recorder) = context();
        let wire = WireGraph::new(vec![0, 2], vec![0.0, 0.0, 0.0, 1.0, 4.0]);
        let err = wire.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, GraphError::Decode(DecodeError::Truncated { .. })));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_pass_failure_aborts_remaining_nodes() {
        let (mut ctx, recorder) = context();
        let graph = RenderGraph::from_nodes(vec![
            RenderNode::Clear { color: Vec4::ONE },
            RenderNode::ColorAdjust(ColorAdjustParams::new(-1.0, 1.0, 1.0)),
            RenderNode::Clear { color: Vec4::ZERO },
        ]);
        let err = graph.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, GraphError::Pass { index: 1, .. }));

        let clears = recorder
            .calls()
            .iter()
            .filter(|call| matches!(call, DummyCall::Clear { .. }))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn test_composite_persists_after_graph() {
        let (mut ctx, _) = context();
        RenderGraph::from_nodes(vec![RenderNode::Composite(CompositeMode::Overlay)])
            .execute(&mut ctx)
            .unwrap();
        assert_eq!(
            ctx.blend(),
            Some(BlendFactors::new(
                crate::types::BlendFactor::SrcAlpha,
                crate::types::BlendFactor::One
            ))
        );
    }
}
