use super::import::{
    embedded_path, ImportError, ImportOptions, ImportedScene, SceneImporter, SceneMaterial,
    SceneMesh, SceneNode,
};
use crate::render::mesh::TextureKind;
use base64::Engine as _;
use glam::{Vec2, Vec3};
use gltf::image::Source;
use gltf::mesh::Mode;
use std::collections::HashMap;
use std::path::Path;

/// Reads `.gltf`/`.glb` files into an [`ImportedScene`].
///
/// Each glTF primitive becomes one scene mesh. Nodes keep their glTF indices
/// and a synthetic root is appended whose children are the roots of the
/// default scene.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(ImportError::NoScene)?;

        let mut meshes = Vec::new();
        let mut primitive_ranges = Vec::with_capacity(document.meshes().len());
        for mesh in document.meshes() {
            let start = meshes.len();
            let mesh_name = mesh.name().unwrap_or_default();
            for (index, primitive) in mesh.primitives().enumerate() {
                meshes.push(read_primitive(
                    &primitive,
                    &buffers,
                    format!("{mesh_name}#{index}"),
                    options,
                ));
            }
            primitive_ranges.push(start..meshes.len());
        }

        let mut nodes: Vec<SceneNode> = document
            .nodes()
            .map(|node| SceneNode {
                name: node.name().unwrap_or_default().to_string(),
                meshes: node
                    .mesh()
                    .map(|mesh| primitive_ranges[mesh.index()].clone().collect())
                    .unwrap_or_default(),
                children: node.children().map(|child| child.index()).collect(),
            })
            .collect();
        let root = nodes.len();
        nodes.push(SceneNode {
            name: scene.name().unwrap_or("root").to_string(),
            meshes: Vec::new(),
            children: scene.nodes().map(|node| node.index()).collect(),
        });

        let materials = document.materials().map(read_material).collect();

        let mut embedded_textures = HashMap::new();
        for image in document.images() {
            let bytes = match image.source() {
                Source::View { view, .. } => {
                    let start = view.offset();
                    let end = start + view.length();
                    buffers
                        .get(view.buffer().index())
                        .and_then(|data| data.get(start..end))
                        .map(<[u8]>::to_vec)
                }
                Source::Uri { uri, .. } => match decode_data_uri(uri) {
                    Some(Ok(bytes)) => Some(bytes),
                    Some(Err(err)) => {
                        log::warn!("Image {} has a malformed data URI: {}", image.index(), err);
                        None
                    }
                    None => None,
                },
            };
            if let Some(bytes) = bytes {
                embedded_textures.insert(image.index(), bytes);
            }
        }

        Ok(ImportedScene {
            root: Some(root),
            nodes,
            incomplete: meshes.is_empty(),
            meshes,
            materials,
            embedded_textures,
        })
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    name: String,
    options: ImportOptions,
) -> SceneMesh {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .map(|iter| iter.map(Vec3::from_array).collect())
        .unwrap_or_default();
    let normals = reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from_array).collect());
    let tex_coords0 = reader.read_tex_coords(0).map(|coords| {
        coords
            .into_f32()
            .map(|uv| flip_uv(Vec2::from_array(uv), options.flip_uvs))
            .collect()
    });
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    SceneMesh {
        name,
        positions,
        normals,
        tex_coords0,
        faces: faces(primitive.mode(), &indices, options.triangulate),
        material_index: primitive.material().index(),
    }
}

/// glTF stores UVs with a top-left origin; the unflipped convention is
/// bottom-left.
fn flip_uv(uv: Vec2, flip_uvs: bool) -> Vec2 {
    if flip_uvs {
        uv
    } else {
        Vec2::new(uv.x, 1.0 - uv.y)
    }
}

fn faces(mode: Mode, indices: &[u32], triangulate: bool) -> Vec<Vec<u32>> {
    match mode {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|triangle| triangle.to_vec())
            .collect(),
        Mode::TriangleStrip if triangulate => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[1], w[0], w[2]]
                }
            })
            .collect(),
        Mode::TriangleFan if triangulate => match indices.split_first() {
            Some((&hub, rest)) => rest.windows(2).map(|w| vec![hub, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        Mode::TriangleStrip | Mode::TriangleFan if indices.len() >= 3 => vec![indices.to_vec()],
        // Points and lines have no triangle faces to draw.
        _ => Vec::new(),
    }
}

fn read_material(material: gltf::Material) -> SceneMaterial {
    let mut textures = Vec::new();
    if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
        textures.push((TextureKind::Diffuse, image_path(&info.texture())));
    }
    if let Some(specular) = material.specular() {
        if let Some(info) = specular.specular_color_texture() {
            textures.push((TextureKind::Specular, image_path(&info.texture())));
        }
        if let Some(info) = specular.specular_texture() {
            textures.push((TextureKind::Specular, image_path(&info.texture())));
        }
    }
    SceneMaterial {
        name: material.name().unwrap_or_default().to_string(),
        textures,
    }
}

/// Texture path as seen by the model loader: `*<image index>` for images
/// carried inside the asset, otherwise the percent-decoded relative URI.
fn image_path(texture: &gltf::Texture) -> String {
    let image = texture.source();
    match image.source() {
        Source::Uri { uri, .. } if !is_data_uri(uri) => match urlencoding::decode(uri) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => uri.to_string(),
        },
        _ => embedded_path(image.index()),
    }
}

fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Payload of a `data:` URI, or `None` for any other URI.
fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, base64::DecodeError>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',').unwrap_or((rest, ""));
    if header.ends_with(";base64") {
        Some(base64::engine::general_purpose::STANDARD.decode(payload))
    } else {
        Some(Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned()))
    }
}
