//! Recording GPU for unit tests (no GPU required).
//!
//! Every call is appended to `calls` so tests can assert upload counts,
//! texture bindings, uniform assignments and draw order.

use super::gpu::{
    BufferHandle, DepthFunc, GpuContext, GpuError, MeshBuffers, PolygonMode, ProgramHandle,
    ShaderHandle, ShaderStage, TextureHandle, TextureImage, TextureTarget, UniformValue,
    VertexArrayHandle, VertexLayout,
};
use std::num::NonZeroU32;

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateMeshBuffers {
        buffers: MeshBuffers,
        vertex_bytes: usize,
        index_count: Option<usize>,
        stride: usize,
        attributes: usize,
    },
    CreateTexture2D {
        texture: TextureHandle,
        has_data: bool,
    },
    CreateCubeMap {
        texture: TextureHandle,
        faces_with_data: usize,
    },
    CompileShader(ShaderStage),
    LinkProgram(ProgramHandle),
    DeleteShader(ShaderHandle),
    UseProgram(ProgramHandle),
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: UniformValue,
    },
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<TextureHandle>),
    DrawElements(VertexArrayHandle, usize),
    DrawArrays(VertexArrayHandle, usize),
    Viewport(u32, u32),
    Clear,
    PolygonMode(PolygonMode),
    DepthFunc(DepthFunc),
    DeleteMeshBuffers(MeshBuffers),
    DeleteTexture(TextureHandle),
    DeleteProgram(ProgramHandle),
}

#[derive(Debug, Default)]
pub struct RecordingGpu {
    pub calls: Vec<GpuCall>,
    pub fail_compile: Option<ShaderStage>,
    pub fail_link: bool,
    next_id: u32,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).expect("id counter starts above zero")
    }

    pub fn count(&self, predicate: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn texture_uploads(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::CreateTexture2D { .. }))
    }

    pub fn uniforms_named(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::SetUniform {
                    name: set, value, ..
                } if set == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl GpuContext for RecordingGpu {
    fn create_mesh_buffers(
        &mut self,
        vertex_bytes: &[u8],
        indices: Option<&[u32]>,
        layout: &VertexLayout<'_>,
    ) -> Result<MeshBuffers, GpuError> {
        let vertex_array = VertexArrayHandle(self.next());
        let vertex_buffer = BufferHandle(self.next());
        let index_buffer = indices.map(|_| BufferHandle(self.next()));
        let buffers = MeshBuffers {
            vertex_array,
            vertex_buffer,
            index_buffer,
        };
        self.calls.push(GpuCall::CreateMeshBuffers {
            buffers,
            vertex_bytes: vertex_bytes.len(),
            index_count: indices.map(<[u32]>::len),
            stride: layout.stride,
            attributes: layout.attributes.len(),
        });
        Ok(buffers)
    }

    fn create_texture_2d(
        &mut self,
        image: Option<&TextureImage>,
    ) -> Result<TextureHandle, GpuError> {
        let texture = TextureHandle(self.next());
        self.calls.push(GpuCall::CreateTexture2D {
            texture,
            has_data: image.is_some(),
        });
        Ok(texture)
    }

    fn create_cube_map(
        &mut self,
        faces: &[Option<TextureImage>; 6],
    ) -> Result<TextureHandle, GpuError> {
        let texture = TextureHandle(self.next());
        self.calls.push(GpuCall::CreateCubeMap {
            texture,
            faces_with_data: faces.iter().filter(|face| face.is_some()).count(),
        });
        Ok(texture)
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        _source: &str,
    ) -> Result<ShaderHandle, GpuError> {
        self.calls.push(GpuCall::CompileShader(stage));
        if self.fail_compile == Some(stage) {
            return Err(GpuError::ShaderCompile {
                stage,
                log: "0:1(1): error: syntax error".to_string(),
            });
        }
        Ok(ShaderHandle(self.next()))
    }

    fn link_program(
        &mut self,
        _vertex: ShaderHandle,
        _fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GpuError> {
        if self.fail_link {
            return Err(GpuError::ProgramLink {
                log: "error: unresolved varying".to_string(),
            });
        }
        let program = ProgramHandle(self.next());
        self.calls.push(GpuCall::LinkProgram(program));
        Ok(program)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(GpuCall::DeleteShader(shader));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        self.calls.push(GpuCall::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn set_active_texture_unit(&mut self, unit: u32) {
        self.calls.push(GpuCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.calls.push(GpuCall::BindTexture(target, texture));
    }

    fn draw_elements(&mut self, vertex_array: VertexArrayHandle, index_count: usize) {
        self.calls
            .push(GpuCall::DrawElements(vertex_array, index_count));
    }

    fn draw_arrays(&mut self, vertex_array: VertexArrayHandle, vertex_count: usize) {
        self.calls
            .push(GpuCall::DrawArrays(vertex_array, vertex_count));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(GpuCall::Viewport(width, height));
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.calls.push(GpuCall::Clear);
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.calls.push(GpuCall::PolygonMode(mode));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.calls.push(GpuCall::DepthFunc(func));
    }

    fn delete_mesh_buffers(&mut self, buffers: MeshBuffers) {
        self.calls.push(GpuCall::DeleteMeshBuffers(buffers));
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.calls.push(GpuCall::DeleteTexture(texture));
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.calls.push(GpuCall::DeleteProgram(program));
    }
}
