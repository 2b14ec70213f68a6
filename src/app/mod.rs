mod egui_host;
mod gl_window;
mod input;
mod timing;

use crate::assets::gltf_importer::GltfImporter;
use crate::assets::image_decoder::FileImageDecoder;
use crate::assets::{resolve_asset_path, Model};
use crate::render::gl_backend::GlowGpu;
use crate::render::gpu::{GpuContext, PolygonMode};
use crate::render::shader::ShaderProgram;
use crate::render::skybox::Skybox;
use crate::render::SceneRenderer;
use crate::scene::config::{self, DemoConfig, DEFAULT_CONFIG_PATH};
use crate::scene::SceneState;
use crate::ui::{MenuActions, UiState};
use egui_host::EguiHost;
use gl_window::{GlWindow, GlWindowError};
use input::{InputAction, InputState};
use timing::FrameTiming;

use std::path::{Path, PathBuf};
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

/// Everything tied to the live GL context.
struct Runtime {
    gl_window: GlWindow,
    gpu: GlowGpu,
    renderer: SceneRenderer,
    model: Model,
    egui: EguiHost,
}

pub struct App {
    config_path: PathBuf,
    config: DemoConfig,
    scene: SceneState,
    ui: UiState,
    input: InputState,
    timing: FrameTiming,
    cursor_locked: bool,
    runtime: Option<Runtime>,
}

impl App {
    fn new(config_path: PathBuf, config: DemoConfig) -> Self {
        Self {
            scene: SceneState::from_config(&config),
            config_path,
            config,
            ui: UiState::new(),
            input: InputState::default(),
            timing: FrameTiming::new(Instant::now()),
            cursor_locked: false,
            runtime: None,
        }
    }

    fn init_runtime(&mut self, event_loop: &ActiveEventLoop) -> Result<Runtime, GlWindowError> {
        let window_attrs = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_resizable(true);
        let gl_window = GlWindow::create(event_loop, window_attrs)?;

        let egui =
            EguiHost::new(gl_window.window(), gl_window.gl()).map_err(GlWindowError::Painter)?;
        let mut gpu = GlowGpu::new(gl_window.gl());
        let size = gl_window.window().inner_size();
        gpu.set_viewport(size.width, size.height);

        let shaders = &self.config.shaders;
        let model_shader = ShaderProgram::load_or_unusable(
            &mut gpu,
            "model",
            &resolve_asset_path(&shaders.model_vertex),
            &resolve_asset_path(&shaders.model_fragment),
        );
        let skybox_shader = ShaderProgram::load_or_unusable(
            &mut gpu,
            "skybox",
            &resolve_asset_path(&shaders.skybox_vertex),
            &resolve_asset_path(&shaders.skybox_fragment),
        );
        let faces = self
            .config
            .skybox
            .faces
            .each_ref()
            .map(|face| resolve_asset_path(face));
        let skybox = match Skybox::load(&mut gpu, &FileImageDecoder, &faces) {
            Ok(skybox) => Some(skybox),
            Err(err) => {
                log::error!("Skybox unavailable: {}", err);
                None
            }
        };
        let unusable: Vec<&str> = [&model_shader, &skybox_shader]
            .into_iter()
            .filter(|program| !program.is_usable())
            .map(|program| program.name())
            .collect();
        if !unusable.is_empty() {
            self.ui.set_status(format!(
                "Shader programs unusable: {} (see log)",
                unusable.join(", ")
            ));
        }
        let renderer = SceneRenderer::new(
            model_shader,
            skybox_shader,
            skybox,
            (size.width, size.height),
        );

        let model = Model::load_or_empty(
            &resolve_asset_path(&self.scene.model_path),
            &GltfImporter,
            &FileImageDecoder,
            &mut gpu,
        );

        Ok(Runtime {
            gl_window,
            gpu,
            renderer,
            model,
            egui,
        })
    }

    fn redraw(&mut self) {
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        self.timing.update(Instant::now());
        let movements = self.input.pressed_movements();
        let mouse_delta = self.input.take_mouse_delta();
        self.scene
            .advance(self.timing.frame_dt, &movements, mouse_delta);

        runtime.gpu.begin_scene_pass();
        let frame = self.scene.frame_uniforms(runtime.renderer.aspect_ratio());
        runtime.renderer.render(&mut runtime.gpu, &runtime.model, &frame);

        let ms_per_frame = self.timing.ms_per_frame();
        let (ui, scene) = (&mut self.ui, &mut self.scene);
        let mut actions = MenuActions::default();
        let output = runtime.egui.run_ui(runtime.gl_window.window(), |ctx| {
            actions = ui.draw(ctx, scene, ms_per_frame);
        });
        runtime.gpu.set_polygon_mode(PolygonMode::Fill);
        runtime.egui.paint(&output);

        if let Err(err) = runtime.gl_window.swap_buffers() {
            log::error!("Failed to present frame: {}", err);
        }

        self.sync_cursor_lock();
        if actions.open_model {
            self.handle_open_model_action();
        }
        if actions.save_settings {
            self.handle_save_settings_action();
        }
    }

    /// Grabs and hides the cursor while mouse look is on.
    fn sync_cursor_lock(&mut self) {
        let locked = self.scene.controls.mouse_lock;
        if locked == self.cursor_locked {
            return;
        }
        let Some(runtime) = &self.runtime else {
            return;
        };
        let window = runtime.gl_window.window();
        if locked {
            if let Err(err) = grab_cursor(window) {
                log::warn!("Cursor grab unavailable: {}", err);
            }
            // Motion gathered before the lock would jump the view.
            self.input.take_mouse_delta();
        } else if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Failed to release cursor: {}", err);
        }
        window.set_cursor_visible(!locked);
        self.cursor_locked = locked;
    }

    fn handle_open_model_action(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("glTF", &["gltf", "glb"])
            .pick_file()
        else {
            return;
        };
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };

        log::info!("Loading model: {}", path.display());
        match Model::load(&path, &GltfImporter, &FileImageDecoder, &mut runtime.gpu) {
            Ok(model) => {
                self.ui.set_status(format!(
                    "Loaded {} meshes, {} textures",
                    model.meshes().len(),
                    model.loaded_textures().len()
                ));
                let previous = std::mem::replace(&mut runtime.model, model);
                previous.release(&mut runtime.gpu);
                self.scene.model_path = path;
            }
            Err(err) => {
                log::warn!("Keeping current model: {}", err);
                self.ui.set_status(format!("Failed to load model:\n{}", err));
            }
        }
    }

    fn handle_save_settings_action(&mut self) {
        let updated = self.scene.to_config(&self.config);
        match config::save_config(&updated, &self.config_path) {
            Ok(()) => {
                log::info!("Settings saved to {}", self.config_path.display());
                self.config = updated;
                self.ui
                    .set_status(format!("Saved to {}", self.config_path.display()));
            }
            Err(err) => {
                log::warn!("Failed to save settings: {}", err);
                self.ui.set_status(format!("Failed to save settings:\n{}", err));
            }
        }
    }

    /// Releases every GPU object once; later calls are no-ops.
    fn shutdown(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        let Runtime {
            gl_window,
            mut gpu,
            renderer,
            model,
            mut egui,
        } = runtime;
        egui.destroy();
        model.release(&mut gpu);
        renderer.release(&mut gpu);
        drop(gpu);
        drop(gl_window);
        log::info!("GPU resources released");
    }
}

fn grab_cursor(window: &Window) -> Result<(), winit::error::ExternalError> {
    window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.runtime.is_some() {
            return;
        }

        match self.init_runtime(event_loop) {
            Ok(runtime) => {
                self.runtime = Some(runtime);
                self.sync_cursor_lock();
            }
            Err(err) => {
                log::error!("Failed to initialise window: {}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(runtime) = self.runtime.as_mut() else {
            return;
        };
        let consumed_by_ui = runtime
            .egui
            .on_window_event(runtime.gl_window.window(), &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }
            WindowEvent::Focused(false) => self.input.clear_held(),
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state.is_pressed();
                // Releases always go through so held keys cannot stick.
                if pressed && consumed_by_ui {
                    return;
                }
                match self.input.handle_key(event.physical_key, pressed) {
                    Some(InputAction::Exit) => {
                        log::info!("Escape pressed, shutting down...");
                        event_loop.exit();
                    }
                    Some(InputAction::Scene(action)) if !event.repeat => {
                        self.scene.apply_action(action);
                        self.sync_cursor_lock();
                    }
                    _ => {}
                }
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
                runtime.gl_window.resize(new_size);
                runtime
                    .renderer
                    .resize(&mut runtime.gpu, new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.scene.controls.mouse_lock {
                self.input.add_mouse_motion(dx, dy);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(runtime) = &self.runtime {
            runtime.gl_window.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = resolve_asset_path(Path::new(DEFAULT_CONFIG_PATH));
    let config = config::load_config_or_default(&config_path);

    log::info!("freelook - {}", config.window.title);
    log::info!("   WASD/Space/LShift move, M mouse lock, N wireframe, B skybox, ESC exit");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config_path, config);
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye!");
}
