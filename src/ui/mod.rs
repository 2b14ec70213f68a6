use crate::scene::SceneState;
use glam::Vec3;
use std::ops::RangeInclusive;

/// Buttons pressed in the menu this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuActions {
    pub open_model: bool,
    pub save_settings: bool,
}

pub struct UiState {
    status: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            status: String::new(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// Draws the "Menu" window, editing `scene` in place.
    pub fn draw(
        &mut self,
        ctx: &egui::Context,
        scene: &mut SceneState,
        ms_per_frame: u32,
    ) -> MenuActions {
        let mut actions = MenuActions::default();
        egui::Window::new("Menu").show(ctx, |ui| {
            ui.colored_label(egui::Color32::RED, frame_time_label(ms_per_frame));

            ui.checkbox(&mut scene.controls.mouse_lock, "Mouse Lock (M)");
            ui.checkbox(&mut scene.controls.wireframe, "Wireframe (N)");
            ui.checkbox(&mut scene.controls.skybox, "Skybox (B)");

            ui.separator();
            let transform = &mut scene.model_transform;
            slider3(ui, "Scale", &mut transform.scale, 0.001..=0.01);
            slider3(ui, "Translate", &mut transform.position, -1.0..=1.0);
            slider3(ui, "Rotate", &mut transform.rotation_deg, 0.0..=359.0);

            ui.separator();
            ui.add(
                egui::Slider::new(&mut scene.lighting.ambient_strength, 0.0..=1.0).text("Ambient"),
            );
            slider3(ui, "Ambient Colour", &mut scene.lighting.ambient_colour, 0.0..=1.0);

            ui.separator();
            ui.horizontal(|ui| {
                actions.open_model = ui.button("Open model...").clicked();
                actions.save_settings = ui.button("Save settings").clicked();
            });
            if !self.status.is_empty() {
                ui.label(&self.status);
            }
        });
        actions
    }
}

pub fn frame_time_label(ms_per_frame: u32) -> String {
    format!("{}ms/frame", ms_per_frame)
}

fn slider3(ui: &mut egui::Ui, label: &str, value: &mut Vec3, range: RangeInclusive<f32>) {
    ui.horizontal(|ui| {
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            ui.add(egui::Slider::new(component, range.clone()).show_value(true));
        }
        ui.label(label);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::config::DemoConfig;

    fn run_menu(ui_state: &mut UiState, scene: &mut SceneState) -> MenuActions {
        let ctx = egui::Context::default();
        let mut actions = MenuActions::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = ui_state.draw(ctx, scene, 16);
        });
        actions
    }

    #[test]
    fn label_shows_whole_milliseconds() {
        assert_eq!(frame_time_label(16), "16ms/frame");
    }

    #[test]
    fn idle_menu_reports_no_actions_and_keeps_state() {
        let mut ui_state = UiState::new();
        let mut scene = SceneState::from_config(&DemoConfig::default());
        let before = (scene.controls, scene.model_transform, scene.lighting);

        let actions = run_menu(&mut ui_state, &mut scene);
        assert_eq!(actions, MenuActions::default());
        assert_eq!((scene.controls, scene.model_transform, scene.lighting), before);
    }

    #[test]
    fn status_message_is_kept_between_frames() {
        let mut ui_state = UiState::new();
        ui_state.set_status("Failed to load model".to_string());
        let mut scene = SceneState::from_config(&DemoConfig::default());
        run_menu(&mut ui_state, &mut scene);
        assert_eq!(ui_state.status(), "Failed to load model");
    }
}
