pub mod config;

use crate::render::camera::WORLD_UP;
use crate::render::{Camera, CameraMovement, FrameUniforms};
use config::{ControlsConfig, DemoConfig};
use glam::{Mat4, Vec2, Vec3};
use std::path::PathBuf;

/// Axis of the model's third rotation slider.
const TILT_AXIS: Vec3 = Vec3::new(1.0, 0.0, 1.0);

/// Translate/scale/rotate values edited from the menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub position: Vec3,
    pub rotation_deg: Vec3,
    pub scale: Vec3,
}

impl ModelTransform {
    /// `T * S * Rx * Ry * R(1,0,1)`, angles in degrees.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(self.scale)
            * Mat4::from_rotation_x(self.rotation_deg.x.to_radians())
            * Mat4::from_rotation_y(self.rotation_deg.y.to_radians())
            * Mat4::from_axis_angle(TILT_AXIS.normalize(), self.rotation_deg.z.to_radians())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient_strength: f32,
    pub ambient_colour: Vec3,
}

/// One-shot toggles raised by key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneAction {
    ToggleMouseLock,
    ToggleWireframe,
    ToggleSkybox,
}

/// Everything the frame loop mutates: camera pose, menu toggles, model
/// transform and lighting.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub camera: Camera,
    pub controls: ControlsConfig,
    pub model_path: PathBuf,
    pub model_transform: ModelTransform,
    pub lighting: Lighting,
}

impl SceneState {
    pub fn from_config(config: &DemoConfig) -> Self {
        let mut camera = Camera::new(
            Vec3::from_array(config.camera.position),
            WORLD_UP,
            config.camera.yaw,
            config.camera.pitch,
        );
        camera.movement_speed = config.camera.movement_speed;
        camera.mouse_sensitivity = config.camera.mouse_sensitivity;
        camera.fov = config.camera.fov;
        camera.near_plane = config.camera.near;
        camera.far_plane = config.camera.far;

        Self {
            camera,
            controls: config.controls,
            model_path: config.model.path.clone(),
            model_transform: ModelTransform {
                position: Vec3::from_array(config.model.position),
                rotation_deg: Vec3::from_array(config.model.rotation_deg),
                scale: Vec3::from_array(config.model.scale),
            },
            lighting: Lighting {
                ambient_strength: config.lighting.ambient_strength,
                ambient_colour: Vec3::from_array(config.lighting.ambient_colour),
            },
        }
    }

    /// Copies the editable state over `base`, leaving paths that are not
    /// edited at runtime untouched.
    pub fn to_config(&self, base: &DemoConfig) -> DemoConfig {
        let mut config = base.clone();
        config.camera.position = self.camera.position().to_array();
        config.camera.yaw = self.camera.yaw();
        config.camera.pitch = self.camera.pitch();
        config.camera.movement_speed = self.camera.movement_speed;
        config.camera.mouse_sensitivity = self.camera.mouse_sensitivity;
        config.camera.fov = self.camera.fov;
        config.camera.near = self.camera.near_plane;
        config.camera.far = self.camera.far_plane;
        config.controls = self.controls;
        config.model.path = self.model_path.clone();
        config.model.position = self.model_transform.position.to_array();
        config.model.rotation_deg = self.model_transform.rotation_deg.to_array();
        config.model.scale = self.model_transform.scale.to_array();
        config.lighting.ambient_strength = self.lighting.ambient_strength;
        config.lighting.ambient_colour = self.lighting.ambient_colour.to_array();
        config
    }

    pub fn apply_action(&mut self, action: SceneAction) {
        let flag = match action {
            SceneAction::ToggleMouseLock => &mut self.controls.mouse_lock,
            SceneAction::ToggleWireframe => &mut self.controls.wireframe,
            SceneAction::ToggleSkybox => &mut self.controls.skybox,
        };
        *flag = !*flag;
    }

    /// Applies one frame of held movement keys and accumulated mouse motion.
    /// Motion is in screen pixels, y growing downward; it is ignored unless
    /// the mouse is locked.
    pub fn advance(&mut self, dt: f32, movements: &[CameraMovement], mouse_delta: Vec2) {
        for &movement in movements {
            self.camera.apply_movement(movement, dt);
        }
        if self.controls.mouse_lock && mouse_delta != Vec2::ZERO {
            self.camera.apply_look(mouse_delta.x, -mouse_delta.y, true);
        }
    }

    pub fn frame_uniforms(&self, aspect_ratio: f32) -> FrameUniforms {
        FrameUniforms {
            view: self.camera.view_matrix(),
            projection: self.camera.projection(aspect_ratio),
            model: self.model_transform.matrix(),
            ambient_strength: self.lighting.ambient_strength,
            ambient_colour: self.lighting.ambient_colour,
            wireframe: self.controls.wireframe,
            draw_skybox: self.controls.skybox,
        }
    }
}
