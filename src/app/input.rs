use crate::render::CameraMovement;
use crate::scene::SceneAction;
use glam::Vec2;
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a key press asks the frame loop to do beyond movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Scene(SceneAction),
    Exit,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    mouse_delta: Vec2,
}

impl InputState {
    /// Updates held movement keys and reports toggles on the initial press.
    /// Auto-repeat events should be filtered out by the caller.
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> Option<InputAction> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match code {
            KeyCode::KeyW => self.move_forward = pressed,
            KeyCode::KeyS => self.move_backward = pressed,
            KeyCode::KeyA => self.move_left = pressed,
            KeyCode::KeyD => self.move_right = pressed,
            KeyCode::Space => self.move_up = pressed,
            KeyCode::ShiftLeft => self.move_down = pressed,
            KeyCode::KeyM if pressed => {
                return Some(InputAction::Scene(SceneAction::ToggleMouseLock))
            }
            KeyCode::KeyN if pressed => {
                return Some(InputAction::Scene(SceneAction::ToggleWireframe))
            }
            KeyCode::KeyB if pressed => return Some(InputAction::Scene(SceneAction::ToggleSkybox)),
            KeyCode::Escape if pressed => return Some(InputAction::Exit),
            _ => {}
        }
        None
    }

    /// Held movement keys in W, S, A, D, Space, LeftShift order.
    pub fn pressed_movements(&self) -> Vec<CameraMovement> {
        [
            (self.move_forward, CameraMovement::Forward),
            (self.move_backward, CameraMovement::Backward),
            (self.move_left, CameraMovement::Left),
            (self.move_right, CameraMovement::Right),
            (self.move_up, CameraMovement::Up),
            (self.move_down, CameraMovement::Down),
        ]
        .into_iter()
        .filter_map(|(held, movement)| held.then_some(movement))
        .collect()
    }

    pub fn add_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta += Vec2::new(dx as f32, dy as f32);
    }

    /// Motion accumulated since the last call.
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Releases every held key, e.g. when focus is lost.
    pub fn clear_held(&mut self) {
        *self = Self {
            mouse_delta: self.mouse_delta,
            ..Self::default()
        };
    }
}
