//! Scene graph as handed over by an asset importer.
//!
//! Everything is index based: nodes reference meshes and child nodes by
//! position in the owning `ImportedScene`, meshes reference materials the same
//! way. The adapter in `assets` walks this structure read-only.

use crate::render::mesh::TextureKind;
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::path::Path;

/// Post-processing requested from the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Emit only triangle faces.
    pub triangulate: bool,
    /// Deliver texture coordinates with a top-left origin.
    pub flip_uvs: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Same length as `positions` when present.
    pub normals: Option<Vec<Vec3>>,
    /// First UV channel, same length as `positions` when present.
    pub tex_coords0: Option<Vec<Vec2>>,
    pub faces: Vec<Vec<u32>>,
    pub material_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMaterial {
    pub name: String,
    /// Texture slots in declaration order with their source path.
    pub textures: Vec<(TextureKind, String)>,
}

impl SceneMaterial {
    pub fn texture_paths(&self, kind: TextureKind) -> impl Iterator<Item = &str> + '_ {
        self.textures
            .iter()
            .filter(move |(slot, _)| *slot == kind)
            .map(|(_, path)| path.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    pub root: Option<usize>,
    pub nodes: Vec<SceneNode>,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
    /// Encoded image bytes addressed by `*<index>` texture paths.
    pub embedded_textures: HashMap<usize, Vec<u8>>,
    /// The importer could not produce the full scene.
    pub incomplete: bool,
}

impl ImportedScene {
    /// Bytes for an embedded texture path such as `*3`.
    pub fn embedded_texture(&self, path: &str) -> Option<&[u8]> {
        let index = embedded_index(path)?;
        self.embedded_textures.get(&index).map(Vec::as_slice)
    }
}

/// Index encoded in a `*<n>` texture path, `None` for ordinary paths.
pub fn embedded_index(path: &str) -> Option<usize> {
    path.strip_prefix('*')?.parse().ok()
}

pub fn embedded_path(index: usize) -> String {
    format!("*{index}")
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    #[error("file contains no scene")]
    NoScene,
}

pub trait SceneImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError>;
}
