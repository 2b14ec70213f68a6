use super::gpu::{
    DepthFunc, GpuContext, GpuError, MeshBuffers, PolygonMode, TextureHandle, TextureImage,
    TextureTarget, VertexAttribute, VertexLayout,
};
use super::shader::ShaderProgram;
use crate::assets::image_decoder::ImageDecoder;
use glam::{Mat3, Mat4};
use std::path::PathBuf;

const SKYBOX_VERTEX_COUNT: usize = 36;

#[rustfmt::skip]
const SKYBOX_VERTICES: [f32; SKYBOX_VERTEX_COUNT * 3] = [
    -1.0,  1.0, -1.0,
    -1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
     1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,

    -1.0, -1.0,  1.0,
    -1.0, -1.0, -1.0,
    -1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,
    -1.0,  1.0,  1.0,
    -1.0, -1.0,  1.0,

     1.0, -1.0, -1.0,
     1.0, -1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0, -1.0,
     1.0, -1.0, -1.0,

    -1.0, -1.0,  1.0,
    -1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0, -1.0,  1.0,
    -1.0, -1.0,  1.0,

    -1.0,  1.0, -1.0,
     1.0,  1.0, -1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
    -1.0,  1.0,  1.0,
    -1.0,  1.0, -1.0,

    -1.0, -1.0, -1.0,
    -1.0, -1.0,  1.0,
     1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
    -1.0, -1.0,  1.0,
     1.0, -1.0,  1.0,
];

const POSITION_ONLY: [VertexAttribute; 1] = [VertexAttribute {
    location: 0,
    components: 3,
    offset: 0,
}];

pub struct Skybox {
    buffers: MeshBuffers,
    cube_map: TextureHandle,
}

impl Skybox {
    /// Faces are ordered +X, -X, +Y, -Y, +Z, -Z. A face that fails to decode
    /// is logged and left empty.
    pub fn load(
        gpu: &mut dyn GpuContext,
        decoder: &dyn ImageDecoder,
        faces: &[PathBuf; 6],
    ) -> Result<Self, GpuError> {
        let images: [Option<TextureImage>; 6] = std::array::from_fn(|index| {
            let path = &faces[index];
            match decoder.decode_file(path) {
                Ok(image) => Some(image),
                Err(err) => {
                    log::warn!("Failed to load skybox face {}: {}", path.display(), err);
                    None
                }
            }
        });
        let cube_map = gpu.create_cube_map(&images)?;
        Self::from_parts(gpu, cube_map)
    }

    /// Builds the cube geometry around an existing cube map. The cube map is
    /// deleted again if the geometry cannot be created.
    pub fn from_parts(gpu: &mut dyn GpuContext, cube_map: TextureHandle) -> Result<Self, GpuError> {
        let layout = VertexLayout {
            stride: 3 * std::mem::size_of::<f32>(),
            attributes: &POSITION_ONLY,
        };
        match gpu.create_mesh_buffers(bytemuck::cast_slice(&SKYBOX_VERTICES), None, &layout) {
            Ok(buffers) => Ok(Self { buffers, cube_map }),
            Err(err) => {
                gpu.delete_texture(cube_map);
                Err(err)
            }
        }
    }

    /// Draws behind everything already in the depth buffer, using only the
    /// rotation part of `view`.
    pub fn draw(
        &self,
        gpu: &mut dyn GpuContext,
        shader: &ShaderProgram,
        view: Mat4,
        projection: Mat4,
    ) {
        gpu.set_polygon_mode(PolygonMode::Fill);
        gpu.set_depth_func(DepthFunc::LessEqual);
        shader.activate(gpu);
        shader.set_mat4(gpu, "view", Mat4::from_mat3(Mat3::from_mat4(view)));
        shader.set_mat4(gpu, "projection", projection);
        shader.set_int(gpu, "skybox", 0);
        gpu.set_active_texture_unit(0);
        gpu.bind_texture(TextureTarget::CubeMap, Some(self.cube_map));
        gpu.draw_arrays(self.buffers.vertex_array, SKYBOX_VERTEX_COUNT);
        gpu.set_depth_func(DepthFunc::Less);
    }

    pub fn release(self, gpu: &mut dyn GpuContext) {
        gpu.delete_mesh_buffers(self.buffers);
        gpu.delete_texture(self.cube_map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::image_decoder::DecodeError;
    use crate::render::gpu::UniformValue;
    use crate::render::recording::{GpuCall, RecordingGpu};
    use glam::Vec3;
    use std::path::Path;

    struct HalfDecoder;

    impl ImageDecoder for HalfDecoder {
        fn decode_file(&self, path: &Path) -> Result<TextureImage, DecodeError> {
            if path.to_string_lossy().contains("missing") {
                return Err(DecodeError::NoData(path.display().to_string()));
            }
            Ok(TextureImage {
                width: 1,
                height: 1,
                channels: 3,
                pixels: vec![0, 0, 0],
            })
        }

        fn decode_memory(&self, _bytes: &[u8]) -> Result<TextureImage, DecodeError> {
            Err(DecodeError::NoData("memory".to_string()))
        }
    }

    fn faces() -> [PathBuf; 6] {
        ["right", "left", "missing-top", "bottom", "missing-front", "back"]
            .map(|name| PathBuf::from(format!("{name}.bmp")))
    }

    #[test]
    fn missing_faces_leave_cube_map_partially_filled() {
        let mut gpu = RecordingGpu::new();
        Skybox::load(&mut gpu, &HalfDecoder, &faces()).unwrap();
        assert!(gpu.calls.iter().any(|call| matches!(
            call,
            GpuCall::CreateCubeMap {
                faces_with_data: 4,
                ..
            }
        )));
    }

    #[test]
    fn draw_strips_translation_and_restores_depth_func() {
        let mut gpu = RecordingGpu::new();
        let shader = ShaderProgram::from_sources(&mut gpu, "skybox", "vs", "fs").unwrap();
        let skybox = Skybox::load(&mut gpu, &HalfDecoder, &faces()).unwrap();
        gpu.clear_calls();

        let view = Mat4::from_translation(Vec3::new(5.0, -2.0, 9.0))
            * Mat4::from_rotation_y(0.7);
        skybox.draw(&mut gpu, &shader, view, Mat4::IDENTITY);

        let uploaded = gpu.uniforms_named("view");
        assert_eq!(uploaded.len(), 1);
        let UniformValue::Mat4(stripped) = uploaded[0] else {
            panic!("view must be a mat4");
        };
        assert_eq!(stripped.w_axis, glam::Vec4::W);
        assert!(stripped.abs_diff_eq(Mat4::from_rotation_y(0.7), 1e-5));

        assert_eq!(gpu.calls.first(), Some(&GpuCall::PolygonMode(PolygonMode::Fill)));
        assert_eq!(gpu.calls.get(1), Some(&GpuCall::DepthFunc(DepthFunc::LessEqual)));
        assert_eq!(gpu.calls.last(), Some(&GpuCall::DepthFunc(DepthFunc::Less)));
        assert_eq!(
            gpu.count(|call| matches!(call, GpuCall::DrawArrays(_, 36))),
            1
        );
    }
}
