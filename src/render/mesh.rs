use super::gpu::{
    GpuContext, GpuError, MeshBuffers, TextureHandle, TextureTarget, VertexAttribute, VertexLayout,
};
use super::shader::ShaderProgram;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::mem::{offset_of, size_of};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

const VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset: offset_of!(Vertex, position),
    },
    VertexAttribute {
        location: 1,
        components: 3,
        offset: offset_of!(Vertex, normal),
    },
    VertexAttribute {
        location: 2,
        components: 2,
        offset: offset_of!(Vertex, tex_coords),
    },
];

impl Vertex {
    pub fn layout() -> VertexLayout<'static> {
        VertexLayout {
            stride: size_of::<Vertex>(),
            attributes: &VERTEX_ATTRIBUTES,
        }
    }
}

/// Semantic slot a texture is bound to in the `material` uniform struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureStatus {
    Uploaded,
    /// Decoding failed; the handle is valid but has no image storage.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRecord {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    /// Source path as written in the asset; the dedup key.
    pub path: String,
    pub status: TextureStatus,
}

/// `material.<kind><n>` where `n` counts from 1 separately for each kind.
pub fn material_uniform_name(kind: TextureKind, ordinal: u32) -> String {
    format!("material.{}{}", kind.as_str(), ordinal)
}

/// Texture unit, uniform name and handle for each texture, in binding order.
pub fn texture_bindings(textures: &[TextureRecord]) -> Vec<(u32, String, TextureHandle)> {
    let mut diffuse = 0;
    let mut specular = 0;
    textures
        .iter()
        .enumerate()
        .map(|(unit, texture)| {
            let counter = match texture.kind {
                TextureKind::Diffuse => &mut diffuse,
                TextureKind::Specular => &mut specular,
            };
            *counter += 1;
            (
                unit as u32,
                material_uniform_name(texture.kind, *counter),
                texture.handle,
            )
        })
        .collect()
}

/// GPU-resident geometry for one mesh. Buffers are uploaded once in `new`.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<TextureRecord>,
    buffers: MeshBuffers,
}

impl Mesh {
    pub fn new(
        gpu: &mut dyn GpuContext,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<TextureRecord>,
    ) -> Result<Self, GpuError> {
        let buffers = gpu.create_mesh_buffers(
            bytemuck::cast_slice(vertices.as_slice()),
            Some(indices.as_slice()),
            &Vertex::layout(),
        )?;
        Ok(Self {
            vertices,
            indices,
            textures,
            buffers,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[TextureRecord] {
        &self.textures
    }

    pub fn buffers(&self) -> MeshBuffers {
        self.buffers
    }

    pub fn draw(&self, gpu: &mut dyn GpuContext, shader: &ShaderProgram) {
        for (unit, uniform, handle) in texture_bindings(&self.textures) {
            gpu.set_active_texture_unit(unit);
            shader.set_int(gpu, &uniform, unit as i32);
            gpu.bind_texture(TextureTarget::Texture2D, Some(handle));
        }
        gpu.set_active_texture_unit(0);

        gpu.draw_elements(self.buffers.vertex_array, self.indices.len());
    }

    /// Frees the vertex array and buffers. Textures belong to the owning
    /// model's cache and are released there.
    pub fn release(self, gpu: &mut dyn GpuContext) {
        gpu.delete_mesh_buffers(self.buffers);
    }
}
