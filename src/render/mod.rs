pub mod camera;
pub mod gl_backend;
pub mod gpu;
pub mod mesh;
#[cfg(test)]
pub(crate) mod recording;
pub mod shader;
pub mod skybox;

pub use camera::{Camera, CameraMovement};

use crate::assets::Model;
use glam::{Mat4, Vec3};
use gpu::{GpuContext, PolygonMode};
use shader::ShaderProgram;
use skybox::Skybox;

const CLEAR_COLOUR: [f32; 4] = [0.2, 0.2, 0.3, 1.0];

/// Per-frame inputs to [`SceneRenderer::render`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub model: Mat4,
    pub ambient_strength: f32,
    pub ambient_colour: Vec3,
    pub wireframe: bool,
    pub draw_skybox: bool,
}

/// Owns the shader programs and skybox and issues the scene draws in a fixed
/// order: clear, model, skybox. The overlay is drawn by the caller afterwards.
pub struct SceneRenderer {
    model_shader: ShaderProgram,
    skybox_shader: ShaderProgram,
    skybox: Option<Skybox>,
    viewport: (u32, u32),
}

impl SceneRenderer {
    pub fn new(
        model_shader: ShaderProgram,
        skybox_shader: ShaderProgram,
        skybox: Option<Skybox>,
        viewport: (u32, u32),
    ) -> Self {
        Self {
            model_shader,
            skybox_shader,
            skybox,
            viewport,
        }
    }

    pub fn resize(&mut self, gpu: &mut dyn GpuContext, width: u32, height: u32) {
        self.viewport = (width, height);
        gpu.set_viewport(width, height);
    }

    /// Width over height of the current viewport; 1 while minimised.
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    pub fn render(&self, gpu: &mut dyn GpuContext, model: &Model, frame: &FrameUniforms) {
        gpu.set_polygon_mode(if frame.wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        });
        gpu.clear(CLEAR_COLOUR);

        let shader = &self.model_shader;
        shader.activate(gpu);
        shader.set_mat4(gpu, "projection", frame.projection);
        shader.set_mat4(gpu, "view", frame.view);
        shader.set_mat4(gpu, "model", frame.model);
        shader.set_float(gpu, "ambientStrength", frame.ambient_strength);
        shader.set_vec3(gpu, "ambientColour", frame.ambient_colour);
        model.draw(gpu, shader);

        if frame.draw_skybox {
            if let Some(skybox) = &self.skybox {
                skybox.draw(gpu, &self.skybox_shader, frame.view, frame.projection);
            }
        }
    }

    pub fn release(self, gpu: &mut dyn GpuContext) {
        self.model_shader.release(gpu);
        self.skybox_shader.release(gpu);
        if let Some(skybox) = self.skybox {
            skybox.release(gpu);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::gpu::{DepthFunc, UniformValue};
    use crate::render::mesh::{Mesh, Vertex};
    use crate::render::recording::{GpuCall, RecordingGpu};

    fn frame(wireframe: bool, draw_skybox: bool) -> FrameUniforms {
        FrameUniforms {
            view: Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)),
            projection: Camera::default().projection(4.0 / 3.0),
            model: Mat4::from_scale(Vec3::splat(0.001)),
            ambient_strength: 0.5,
            ambient_colour: Vec3::ONE,
            wireframe,
            draw_skybox,
        }
    }

    fn renderer(gpu: &mut RecordingGpu) -> SceneRenderer {
        let model_shader = ShaderProgram::from_sources(gpu, "model", "vs", "fs").unwrap();
        let skybox_shader = ShaderProgram::from_sources(gpu, "skybox", "vs", "fs").unwrap();
        let cube_map = gpu.create_cube_map(&Default::default()).unwrap();
        let skybox = Skybox::from_parts(gpu, cube_map).unwrap();
        SceneRenderer::new(model_shader, skybox_shader, Some(skybox), (800, 600))
    }

    #[test]
    fn aspect_ratio_uses_live_viewport() {
        let mut gpu = RecordingGpu::new();
        let mut renderer = renderer(&mut gpu);
        assert!((renderer.aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);

        renderer.resize(&mut gpu, 1920, 1080);
        assert!(gpu.calls.contains(&GpuCall::Viewport(1920, 1080)));
        assert!((renderer.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);

        renderer.resize(&mut gpu, 0, 0);
        assert_eq!(renderer.aspect_ratio(), 1.0);
    }

    #[test]
    fn frame_draws_model_before_skybox_with_uniforms_set_first() {
        let mut gpu = RecordingGpu::new();
        let renderer = renderer(&mut gpu);
        let mesh = Mesh::new(&mut gpu, vec![Vertex::default(); 3], vec![0, 1, 2], Vec::new()).unwrap();
        let model = Model::from_meshes(vec![mesh]);
        gpu.clear_calls();

        let uniforms = frame(true, true);
        renderer.render(&mut gpu, &model, &uniforms);

        assert_eq!(gpu.calls[0], GpuCall::PolygonMode(PolygonMode::Line));
        assert_eq!(gpu.calls[1], GpuCall::Clear);
        let position = |pred: fn(&GpuCall) -> bool| gpu.calls.iter().position(pred).unwrap();
        let ambient = position(|call| {
            matches!(call, GpuCall::SetUniform { name, .. } if name == "ambientStrength")
        });
        let model_draw = position(|call| matches!(call, GpuCall::DrawElements(..)));
        let skybox_draw = position(|call| matches!(call, GpuCall::DrawArrays(..)));
        assert!(ambient < model_draw);
        assert!(model_draw < skybox_draw);
        assert_eq!(gpu.calls.last(), Some(&GpuCall::DepthFunc(DepthFunc::Less)));
        assert_eq!(
            gpu.uniforms_named("ambientColour"),
            vec![UniformValue::Vec3(Vec3::ONE)]
        );
    }

    #[test]
    fn skybox_toggle_skips_the_cube() {
        let mut gpu = RecordingGpu::new();
        let renderer = renderer(&mut gpu);
        let model = Model::from_meshes(Vec::new());
        gpu.clear_calls();

        renderer.render(&mut gpu, &model, &frame(false, false));
        assert_eq!(gpu.calls[0], GpuCall::PolygonMode(PolygonMode::Fill));
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::DrawArrays(..))), 0);
    }

    #[test]
    fn release_frees_programs_and_skybox() {
        let mut gpu = RecordingGpu::new();
        let renderer = renderer(&mut gpu);
        gpu.clear_calls();

        renderer.release(&mut gpu);
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::DeleteProgram(_))), 2);
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::DeleteTexture(_))), 1);
        assert_eq!(
            gpu.count(|call| matches!(call, GpuCall::DeleteMeshBuffers(_))),
            1
        );
    }
}
