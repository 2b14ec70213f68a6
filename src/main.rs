//! freelook - a small OpenGL scene viewer.
//!
//! Loads a textured glTF model and a cube-map skybox, then lets you fly
//! around them with a free-look camera:
//! - WASD moves, Space and Left Shift move up and down
//! - M toggles mouse look, N wireframe, B the skybox, Escape quits
//! - the egui "Menu" window edits the model transform and ambient light
//!
//! Settings live in `assets/demo.json`. The model and the six skybox faces it
//! names under `res/` are not shipped with the crate: put your own there, or
//! point the config at other files. Anything missing is logged and the viewer
//! starts with an empty scene, a blank skybox, or both.

mod app;
mod assets;
mod render;
mod scene;
mod ui;

fn main() {
    app::run();
}
