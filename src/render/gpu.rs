//! Bound-state GPU command target.
//!
//! Mirrors the OpenGL model the renderer is written against: the active
//! program, texture unit and texture bindings are global state, so callers
//! bind before acting and leave texture unit 0 active between unrelated
//! operations.

use glam::{Mat4, Vec3};
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("VERTEX"),
            ShaderStage::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    Less,
    LessEqual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

/// One float vertex attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct VertexLayout<'a> {
    pub stride: usize,
    pub attributes: &'a [VertexAttribute],
}

/// GPU objects backing one piece of geometry. `index_buffer` is `None` for
/// geometry drawn with `draw_arrays`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex_array: VertexArrayHandle,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
}

/// Decoded pixel rows, top row first, tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create {kind}: {message}")]
    Create { kind: &'static str, message: String },
    #[error("failed to compile {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("failed to link program:\n{log}")]
    ProgramLink { log: String },
}

pub trait GpuContext {
    /// Uploads interleaved vertex data (and indices when given) and records
    /// the attribute layout in a new vertex array.
    fn create_mesh_buffers(
        &mut self,
        vertex_bytes: &[u8],
        indices: Option<&[u32]>,
        layout: &VertexLayout<'_>,
    ) -> Result<MeshBuffers, GpuError>;

    /// Creates a mipmapped, repeat-wrapped, linear-filtered 2D texture. With
    /// `None` the texture object exists but has no storage.
    fn create_texture_2d(&mut self, image: Option<&TextureImage>)
        -> Result<TextureHandle, GpuError>;

    /// Creates a clamp-to-edge, linear-filtered cube map from faces ordered
    /// +X, -X, +Y, -Y, +Z, -Z. Missing faces are left empty.
    fn create_cube_map(&mut self, faces: &[Option<TextureImage>; 6])
        -> Result<TextureHandle, GpuError>;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str)
        -> Result<ShaderHandle, GpuError>;
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GpuError>;
    fn delete_shader(&mut self, shader: ShaderHandle);

    fn use_program(&mut self, program: ProgramHandle);
    /// Unknown uniform names are ignored.
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    fn set_active_texture_unit(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>);

    fn draw_elements(&mut self, vertex_array: VertexArrayHandle, index_count: usize);
    fn draw_arrays(&mut self, vertex_array: VertexArrayHandle, vertex_count: usize);

    fn set_viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: [f32; 4]);
    fn set_polygon_mode(&mut self, mode: PolygonMode);
    fn set_depth_func(&mut self, func: DepthFunc);

    fn delete_mesh_buffers(&mut self, buffers: MeshBuffers);
    fn delete_texture(&mut self, texture: TextureHandle);
    fn delete_program(&mut self, program: ProgramHandle);
}
