//! Shader programs and uniform setters.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::backend::{Backend, NativeId};
use crate::error::ResourceError;
use crate::shader::{self, ProgramLayout, ShaderStage, UniformType};
use crate::types::ShaderHandle;
use crate::DeviceContext;

/// Compile both stages and link them, releasing the stages on every path.
fn build_program(
    backend: &mut dyn Backend,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<(NativeId, ProgramLayout), ResourceError> {
    let vertex = shader::compile(ShaderStage::Vertex, vertex_source).map_err(|log| {
        ResourceError::Compile {
            stage: ShaderStage::Vertex,
            log,
        }
    })?;
    let vertex_id = backend.create_stage(&vertex)?;

    let fragment = match shader::compile(ShaderStage::Fragment, fragment_source) {
        Ok(fragment) => fragment,
        Err(log) => {
            backend.release_stage(vertex_id);
            return Err(ResourceError::Compile {
                stage: ShaderStage::Fragment,
                log,
            });
        }
    };
    let fragment_id = match backend.create_stage(&fragment) {
        Ok(id) => id,
        Err(e) => {
            backend.release_stage(vertex_id);
            return Err(e.into());
        }
    };

    let linked = shader::link(&vertex, &fragment)
        .map_err(ResourceError::Link)
        .and_then(|layout| {
            let native = backend.link_program(vertex_id, fragment_id, &layout)?;
            Ok((native, layout))
        });

    backend.release_stage(vertex_id);
    backend.release_stage(fragment_id);
    linked
}

impl DeviceContext {
    /// Compile and link a program from GLSL 450 vertex and fragment sources.
    ///
    /// On failure the error carries the compiler or linker diagnostic and no
    /// native stage is left behind.
    pub fn create_shader(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ResourceError> {
        let backend = self
            .backend_mut("create_shader")
            .ok_or(ResourceError::InvalidContext)?;

        let (native, layout) = build_program(backend, vertex_source, fragment_source)
            .inspect_err(|e| log::warn!("create_shader failed: {e}"))?;

        let id = self.registry.insert_shader(native, layout);
        log::debug!("created shader {id} (native {native})");
        Ok(ShaderHandle::new(self.id(), id))
    }

    /// Bind a program for following uniform and draw calls. `None` unbinds.
    pub fn use_shader(&mut self, shader: Option<ShaderHandle>) {
        if let Some(handle) = shader {
            if !self.owns(handle.context, "use_shader") {
                return;
            }
            if !self.registry.shaders.contains_key(&handle.id) {
                log::warn!("use_shader ignored: shader {} does not exist", handle.raw());
                return;
            }
        }
        self.state.program = shader;
    }

    /// The currently bound program.
    pub fn bound_shader(&self) -> Option<ShaderHandle> {
        self.state.program
    }

    /// Release a program. Deleting the bound program leaves it bound, and
    /// draws fail until another program is bound.
    pub fn delete_shader(&mut self, shader: ShaderHandle) {
        if !self.owns(shader.context, "delete_shader") {
            return;
        }
        let Some(entry) = self.registry.shaders.remove(&shader.id) else {
            log::warn!("delete_shader: shader {} does not exist", shader.raw());
            return;
        };
        if let Some(backend) = self.backend_mut("delete_shader") {
            backend.delete_program(entry.native);
        }
        log::debug!("deleted shader {}", shader.raw());
    }

    pub fn set_uniform_int(&mut self, name: &str, value: i32) {
        self.write_uniform(name, UniformType::Int, bytemuck::bytes_of(&value));
    }

    pub fn set_uniform_float(&mut self, name: &str, value: f32) {
        self.write_uniform(name, UniformType::Float, bytemuck::bytes_of(&value));
    }

    pub fn set_uniform_vec2(&mut self, name: &str, value: Vec2) {
        self.write_uniform(name, UniformType::Vec2, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn set_uniform_vec3(&mut self, name: &str, value: Vec3) {
        self.write_uniform(name, UniformType::Vec3, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn set_uniform_vec4(&mut self, name: &str, value: Vec4) {
        self.write_uniform(name, UniformType::Vec4, bytemuck::bytes_of(&value.to_array()));
    }

    /// Column-major, matching GLSL `mat4`.
    pub fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) {
        self.write_uniform(
            name,
            UniformType::Mat4,
            bytemuck::bytes_of(&value.to_cols_array()),
        );
    }

    /// Current value of a uniform in a program's staging copy. Integer
    /// uniforms are converted to `f32`.
    pub fn uniform_value(&self, shader: ShaderHandle, name: &str) -> Option<Vec<f32>> {
        if shader.context != self.id() {
            return None;
        }
        let entry = self.registry.shaders.get(&shader.id)?;
        let (block, member) = entry.layout.find_uniform(name)?;
        let ty = member.ty?;
        let offset = member.offset as usize;
        let bytes = entry.uniforms[block].bytes.get(offset..offset + ty.size())?;
        let words = bytes.chunks_exact(4);
        Some(match ty {
            UniformType::Int => words
                .map(|word| bytemuck::pod_read_unaligned::<i32>(word) as f32)
                .collect(),
            _ => words.map(bytemuck::pod_read_unaligned::<f32>).collect(),
        })
    }

    /// Write into the bound program's staging copy. A name the program does
    /// not declare, or a type that does not match, leaves everything as is.
    fn write_uniform(&mut self, name: &str, ty: UniformType, bytes: &[u8]) {
        if !self.is_valid() {
            log::warn!("set uniform '{name}' ignored: device context is invalid");
            return;
        }
        let Some(handle) = self.state.program else {
            log::trace!("set uniform '{name}' ignored: no shader bound");
            return;
        };
        let Some(entry) = self.registry.shaders.get_mut(&handle.id) else {
            return;
        };
        let Some((block, offset, declared)) = entry
            .layout
            .find_uniform(name)
            .map(|(block, member)| (block, member.offset as usize, member.ty))
        else {
            log::trace!("uniform '{name}' not declared by shader {}", handle.raw());
            return;
        };
        if declared != Some(ty) {
            log::warn!("uniform '{name}' is {declared:?}, not {ty:?}; ignored");
            return;
        }

        if let Some(slot) = entry.uniforms[block]
            .bytes
            .get_mut(offset..offset + bytes.len())
        {
            slot.copy_from_slice(bytes);
        }
    }
}
