//! Stage interface reflection and program linking.

use std::collections::BTreeMap;

use naga::{AddressSpace, Binding, Handle, Module, Type, TypeInner, VectorSize};

use super::{CompiledStage, ShaderStage};
use crate::types::Vertex;

/// Uniform member types the setters can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    /// Size of the value in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }

    fn from_naga(inner: &TypeInner) -> Option<Self> {
        match *inner {
            TypeInner::Scalar(scalar) if scalar == naga::Scalar::I32 => Some(Self::Int),
            TypeInner::Scalar(scalar) if scalar == naga::Scalar::F32 => Some(Self::Float),
            TypeInner::Vector { size, scalar } if scalar == naga::Scalar::F32 => match size {
                VectorSize::Bi => Some(Self::Vec2),
                VectorSize::Tri => Some(Self::Vec3),
                VectorSize::Quad => Some(Self::Vec4),
            },
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == naga::Scalar::F32 => Some(Self::Mat4),
            _ => None,
        }
    }
}

/// Which stages reference a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageMask {
    pub vertex: bool,
    pub fragment: bool,
}

impl StageMask {
    fn of(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self {
                vertex: true,
                fragment: false,
            },
            ShaderStage::Fragment => Self {
                vertex: false,
                fragment: true,
            },
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            vertex: self.vertex || other.vertex,
            fragment: self.fragment || other.fragment,
        }
    }
}

/// One member of a uniform block.
///
/// `ty` is `None` for members the setters cannot address (integers,
/// arrays, nested structs); their bytes stay zeroed.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub ty: Option<UniformType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub name: String,
    pub binding: u32,
    /// Block size in bytes, std140 padded.
    pub size: u32,
    pub members: Vec<UniformMember>,
    pub visibility: StageMask,
}

impl UniformBlock {
    fn same_layout(&self, other: &UniformBlock) -> bool {
        self.size == other.size && self.members == other.members
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub name: String,
    pub binding: u32,
    /// Sampling slot this texture reads from.
    pub slot: u32,
    pub visibility: StageMask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerBinding {
    pub binding: u32,
    pub visibility: StageMask,
}

/// Resource interface of a linked program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramLayout {
    /// Sorted by binding.
    pub uniform_blocks: Vec<UniformBlock>,
    /// Sorted by binding; the k-th texture samples slot k.
    pub textures: Vec<TextureBinding>,
    pub samplers: Vec<SamplerBinding>,
    pub vertex_inputs: Vec<u32>,
}

impl ProgramLayout {
    /// Find a uniform member by name across all blocks.
    pub fn find_uniform(&self, name: &str) -> Option<(usize, &UniformMember)> {
        self.uniform_blocks.iter().enumerate().find_map(|(index, block)| {
            block
                .members
                .iter()
                .find(|member| member.name == name)
                .map(|member| (index, member))
        })
    }
}

#[derive(Debug, Default)]
struct StageInterface {
    uniform_blocks: Vec<UniformBlock>,
    textures: Vec<(String, u32)>,
    samplers: Vec<u32>,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
}

fn reflect(stage: &CompiledStage) -> Result<StageInterface, String> {
    let module = &stage.module;
    let mut interface = StageInterface::default();

    for (_, var) in module.global_variables.iter() {
        let binding = match (&var.space, &var.binding) {
            (AddressSpace::Uniform | AddressSpace::Handle, Some(binding)) => binding,
            (AddressSpace::Uniform | AddressSpace::Handle, None) => {
                return Err(format!(
                    "{} stage: resource '{}' has no binding",
                    stage.stage,
                    var.name.as_deref().unwrap_or("<unnamed>")
                ));
            }
            _ => continue,
        };

        if binding.group != 0 {
            return Err(format!(
                "{} stage: only descriptor set 0 is supported, found set {}",
                stage.stage, binding.group
            ));
        }

        let ty = &module.types[var.ty];
        match (&var.space, &ty.inner) {
            (AddressSpace::Uniform, TypeInner::Struct { members, span }) => {
                interface.uniform_blocks.push(UniformBlock {
                    name: ty.name.clone().unwrap_or_default(),
                    binding: binding.binding,
                    size: *span,
                    members: members
                        .iter()
                        .map(|member| UniformMember {
                            name: member.name.clone().unwrap_or_default(),
                            offset: member.offset,
                            ty: UniformType::from_naga(&module.types[member.ty].inner),
                        })
                        .collect(),
                    visibility: StageMask::of(stage.stage),
                });
            }
            (AddressSpace::Uniform, inner) => {
                let ty = UniformType::from_naga(inner);
                interface.uniform_blocks.push(UniformBlock {
                    name: var.name.clone().unwrap_or_default(),
                    binding: binding.binding,
                    size: ty.map_or(16, |t| (t.size() as u32).next_multiple_of(16)),
                    members: vec![UniformMember {
                        name: var.name.clone().unwrap_or_default(),
                        offset: 0,
                        ty,
                    }],
                    visibility: StageMask::of(stage.stage),
                });
            }
            (AddressSpace::Handle, TypeInner::Image { .. }) => {
                interface
                    .textures
                    .push((var.name.clone().unwrap_or_default(), binding.binding));
            }
            (AddressSpace::Handle, TypeInner::Sampler { .. }) => {
                interface.samplers.push(binding.binding);
            }
            _ => {}
        }
    }

    let entry = module
        .entry_points
        .first()
        .ok_or_else(|| format!("{} stage has no entry point", stage.stage))?;

    for argument in &entry.function.arguments {
        collect_locations(module, argument.binding.as_ref(), argument.ty, &mut interface.inputs);
    }
    if let Some(result) = &entry.function.result {
        collect_locations(module, result.binding.as_ref(), result.ty, &mut interface.outputs);
    }

    Ok(interface)
}

fn collect_locations(
    module: &Module,
    binding: Option<&Binding>,
    ty: Handle<Type>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(*location),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    Uniform,
    Texture,
    Sampler,
}

/// Check that a vertex and a fragment stage agree and merge their
/// resource interfaces.
///
/// Fails when a fragment input has no matching vertex output, a vertex
/// input lies outside the fixed vertex layout, or the stages declare
/// different resources at the same binding.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<ProgramLayout, String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err("link expects a vertex stage and a fragment stage".to_string());
    }

    let vs = reflect(vertex)?;
    let fs = reflect(fragment)?;

    for location in &vs.inputs {
        if *location > Vertex::MAX_LOCATION {
            return Err(format!(
                "vertex input at location {location} is outside the vertex layout (0..={})",
                Vertex::MAX_LOCATION
            ));
        }
    }
    for location in &fs.inputs {
        if !vs.outputs.contains(location) {
            return Err(format!(
                "fragment input at location {location} has no matching vertex output"
            ));
        }
    }

    let mut kinds: BTreeMap<u32, BindingKind> = BTreeMap::new();
    let mut claim = |binding: u32, kind: BindingKind| -> Result<(), String> {
        match kinds.insert(binding, kind) {
            Some(previous) if previous != kind => Err(format!(
                "binding {binding} is declared as different resource types across stages"
            )),
            _ => Ok(()),
        }
    };

    let mut blocks: BTreeMap<u32, UniformBlock> = BTreeMap::new();
    for block in vs.uniform_blocks.into_iter().chain(fs.uniform_blocks) {
        claim(block.binding, BindingKind::Uniform)?;
        match blocks.get_mut(&block.binding) {
            Some(existing) => {
                if !existing.same_layout(&block) {
                    return Err(format!(
                        "uniform block at binding {} differs between stages",
                        block.binding
                    ));
                }
                existing.visibility = existing.visibility.union(block.visibility);
            }
            None => {
                blocks.insert(block.binding, block);
            }
        }
    }

    let mut textures: BTreeMap<u32, (String, StageMask)> = BTreeMap::new();
    for (stage, list) in [
        (ShaderStage::Vertex, &vs.textures),
        (ShaderStage::Fragment, &fs.textures),
    ] {
        for (name, binding) in list {
            claim(*binding, BindingKind::Texture)?;
            let entry = textures
                .entry(*binding)
                .or_insert_with(|| (name.clone(), StageMask::default()));
            entry.1 = entry.1.union(StageMask::of(stage));
        }
    }

    let mut samplers: BTreeMap<u32, StageMask> = BTreeMap::new();
    for (stage, list) in [
        (ShaderStage::Vertex, &vs.samplers),
        (ShaderStage::Fragment, &fs.samplers),
    ] {
        for binding in list {
            claim(*binding, BindingKind::Sampler)?;
            let entry = samplers.entry(*binding).or_default();
            *entry = entry.union(StageMask::of(stage));
        }
    }

    let mut vertex_inputs = vs.inputs;
    vertex_inputs.sort_unstable();

    Ok(ProgramLayout {
        uniform_blocks: blocks.into_values().collect(),
        textures: textures
            .into_iter()
            .enumerate()
            .map(|(slot, (binding, (name, visibility)))| TextureBinding {
                name,
                binding,
                slot: slot as u32,
                visibility,
            })
            .collect(),
        samplers: samplers
            .into_iter()
            .map(|(binding, visibility)| SamplerBinding {
                binding,
                visibility,
            })
            .collect(),
        vertex_inputs,
    })
}
