pub mod gltf_importer;
pub mod image_decoder;
pub mod import;

use crate::render::gpu::{GpuContext, GpuError, TextureImage};
use crate::render::mesh::{Mesh, TextureKind, TextureRecord, TextureStatus, Vertex};
use crate::render::shader::ShaderProgram;
use glam::{Vec2, Vec3};
use image_decoder::{DecodeError, ImageDecoder};
use import::{embedded_index, ImportOptions, ImportedScene, SceneImporter, SceneMaterial, SceneMesh};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import {path}: {message}")]
    Import { path: String, message: String },
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Resolves `path` against the crate directory unless it is absolute.
pub fn resolve_asset_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
    }
}

/// Everything produced by one import: draw-ready meshes plus the texture
/// cache they share.
#[derive(Debug)]
pub struct Model {
    meshes: Vec<Mesh>,
    directory: PathBuf,
    /// One entry per unique source path, in upload order.
    textures_loaded: Vec<TextureRecord>,
}

impl Model {
    pub fn empty(directory: PathBuf) -> Self {
        Self {
            meshes: Vec::new(),
            directory,
            textures_loaded: Vec::new(),
        }
    }

    pub fn load(
        path: &Path,
        importer: &dyn SceneImporter,
        decoder: &dyn ImageDecoder,
        gpu: &mut dyn GpuContext,
    ) -> Result<Self, AssetError> {
        let import_failure = |message: String| AssetError::Import {
            path: path.display().to_string(),
            message,
        };
        let options = ImportOptions {
            triangulate: true,
            flip_uvs: true,
        };
        let scene = importer
            .import(path, options)
            .map_err(|err| import_failure(err.to_string()))?;
        if scene.incomplete {
            return Err(import_failure("scene is incomplete".to_string()));
        }
        let root = scene
            .root
            .ok_or_else(|| import_failure("scene has no root node".to_string()))?;

        let mut model = Self::empty(model_directory(path));
        if let Err(err) = model.process_scene(&scene, root, decoder, gpu) {
            model.release(gpu);
            return Err(err.into());
        }

        log::info!(
            "Loaded model {} ({} meshes, {} textures)",
            path.display(),
            model.meshes.len(),
            model.textures_loaded.len()
        );
        Ok(model)
    }

    /// Like [`Model::load`], but a failure is logged and yields a model with
    /// nothing to draw.
    pub fn load_or_empty(
        path: &Path,
        importer: &dyn SceneImporter,
        decoder: &dyn ImageDecoder,
        gpu: &mut dyn GpuContext,
    ) -> Self {
        match Self::load(path, importer, decoder, gpu) {
            Ok(model) => model,
            Err(err) => {
                log::error!("{}", err);
                Self::empty(model_directory(path))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_meshes(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes,
            directory: PathBuf::from("."),
            textures_loaded: Vec::new(),
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn loaded_textures(&self) -> &[TextureRecord] {
        &self.textures_loaded
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn draw(&self, gpu: &mut dyn GpuContext, shader: &ShaderProgram) {
        for mesh in &self.meshes {
            mesh.draw(gpu, shader);
        }
    }

    /// Frees every mesh and each cached texture once.
    pub fn release(self, gpu: &mut dyn GpuContext) {
        for mesh in self.meshes {
            mesh.release(gpu);
        }
        for texture in self.textures_loaded {
            gpu.delete_texture(texture.handle);
        }
    }

    /// Pre-order walk from `root`; a node's meshes come before its children.
    fn process_scene(
        &mut self,
        scene: &ImportedScene,
        root: usize,
        decoder: &dyn ImageDecoder,
        gpu: &mut dyn GpuContext,
    ) -> Result<(), GpuError> {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let Some(node) = scene.nodes.get(index) else {
                log::warn!("Skipping missing scene node {}", index);
                continue;
            };
            if !visited.insert(index) {
                log::warn!("Scene node {} ('{}') reached twice, skipping", index, node.name);
                continue;
            }
            for &mesh_index in &node.meshes {
                match scene.meshes.get(mesh_index) {
                    Some(mesh) => {
                        let mesh = self.process_mesh(scene, mesh, decoder, gpu)?;
                        self.meshes.push(mesh);
                    }
                    None => log::warn!(
                        "Node '{}' references missing mesh {}",
                        node.name,
                        mesh_index
                    ),
                }
            }
            stack.extend(node.children.iter().rev());
        }
        Ok(())
    }

    fn process_mesh(
        &mut self,
        scene: &ImportedScene,
        mesh: &SceneMesh,
        decoder: &dyn ImageDecoder,
        gpu: &mut dyn GpuContext,
    ) -> Result<Mesh, GpuError> {
        let vertices = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: mesh
                    .normals
                    .as_ref()
                    .and_then(|normals| normals.get(i).copied())
                    .unwrap_or(Vec3::ZERO),
                tex_coords: mesh
                    .tex_coords0
                    .as_ref()
                    .and_then(|coords| coords.get(i).copied())
                    .unwrap_or(Vec2::ZERO),
            })
            .collect();
        let indices = mesh.faces.iter().flatten().copied().collect();

        let mut textures = Vec::new();
        if let Some(material) = mesh
            .material_index
            .and_then(|index| scene.materials.get(index))
        {
            for kind in [TextureKind::Diffuse, TextureKind::Specular] {
                let loaded = self.load_material_textures(scene, material, kind, decoder, gpu)?;
                textures.extend(loaded);
            }
        }

        Mesh::new(gpu, vertices, indices, textures)
    }

    fn load_material_textures(
        &mut self,
        scene: &ImportedScene,
        material: &SceneMaterial,
        kind: TextureKind,
        decoder: &dyn ImageDecoder,
        gpu: &mut dyn GpuContext,
    ) -> Result<Vec<TextureRecord>, GpuError> {
        let mut textures = Vec::new();
        for path in material.texture_paths(kind) {
            if let Some(cached) = self.textures_loaded.iter().find(|t| t.path == path) {
                textures.push(cached.clone());
                continue;
            }

            let decoded = self.decode_texture(scene, path, decoder);
            let (handle, status) = match decoded {
                Ok(image) => (gpu.create_texture_2d(Some(&image))?, TextureStatus::Uploaded),
                Err(err) => {
                    log::warn!("Texture {} failed to load: {}", path, err);
                    (gpu.create_texture_2d(None)?, TextureStatus::Empty)
                }
            };
            let record = TextureRecord {
                handle,
                kind,
                path: path.to_string(),
                status,
            };
            self.textures_loaded.push(record.clone());
            textures.push(record);
        }
        Ok(textures)
    }

    fn decode_texture(
        &self,
        scene: &ImportedScene,
        path: &str,
        decoder: &dyn ImageDecoder,
    ) -> Result<TextureImage, DecodeError> {
        if embedded_index(path).is_some() {
            let bytes = scene
                .embedded_texture(path)
                .ok_or_else(|| DecodeError::NoData(path.to_string()))?;
            decoder.decode_memory(bytes)
        } else {
            decoder.decode_file(&self.directory.join(path))
        }
    }
}

/// Directory part of `path`, `.` when it has none.
fn model_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
