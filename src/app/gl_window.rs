use glutin::config::{Config, ConfigTemplate, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::GlWindow as _;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::num::NonZeroU32;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

#[derive(Debug, thiserror::Error)]
pub enum GlWindowError {
    #[error("GL display offered no usable framebuffer config")]
    NoConfig,
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("native handle unavailable: {0}")]
    Handle(#[from] raw_window_handle::HandleError),
    #[error("GL context error: {0}")]
    Glutin(#[from] glutin::error::Error),
    #[error("failed to create GUI painter: {0}")]
    Painter(String),
}

/// A winit window with a current OpenGL context and a `glow` function table.
pub struct GlWindow {
    window: Arc<Window>,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    gl: Arc<glow::Context>,
}

impl GlWindow {
    pub fn create(
        event_loop: &ActiveEventLoop,
        attributes: WindowAttributes,
    ) -> Result<Self, GlWindowError> {
        let (gl_display, gl_config, window) = open_display(event_loop, attributes)?;
        let window = Arc::new(window);

        let raw_handle = window.window_handle()?.as_raw();
        let desktop = ContextAttributesBuilder::new().build(Some(raw_handle));
        let gles = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(None))
            .build(Some(raw_handle));
        let not_current = match unsafe { gl_display.create_context(&gl_config, &desktop) } {
            Ok(context) => context,
            Err(err) => {
                log::warn!("Desktop GL context unavailable ({}), trying GLES", err);
                unsafe { gl_display.create_context(&gl_config, &gles)? }
            }
        };

        let surface_attributes = window.build_surface_attributes(Default::default())?;
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };
        let context = not_current.make_current(&surface)?;

        if let Err(err) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::warn!("Could not enable vsync: {}", err);
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
        };
        log::info!(
            "GL context ready ({} samples, depth {})",
            gl_config.num_samples(),
            gl_config.depth_size()
        );

        Ok(Self {
            window,
            surface,
            context,
            gl: Arc::new(gl),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn gl(&self) -> Arc<glow::Context> {
        Arc::clone(&self.gl)
    }

    /// Resizes the default framebuffer; zero sizes (minimised) are ignored.
    pub fn resize(&self, size: PhysicalSize<u32>) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            self.surface.resize(&self.context, width, height);
        }
    }

    pub fn swap_buffers(&self) -> Result<(), GlWindowError> {
        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }
}

fn config_template() -> ConfigTemplateBuilder {
    ConfigTemplateBuilder::new().with_depth_size(24)
}

fn pick_config(display: &Display, template: ConfigTemplate) -> Result<Config, GlWindowError> {
    let configs = unsafe { display.find_configs(template)? };
    most_samples(configs, |config| config.num_samples()).ok_or(GlWindowError::NoConfig)
}

/// Highest sample count wins; the earliest candidate breaks ties.
fn most_samples<T>(candidates: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    candidates.reduce(|best, next| if samples(&next) > samples(&best) { next } else { best })
}

/// WGL needs the native window before the display can pick a config.
#[cfg(target_os = "windows")]
fn open_display(
    event_loop: &ActiveEventLoop,
    attributes: WindowAttributes,
) -> Result<(Display, Config, Window), GlWindowError> {
    let window = event_loop.create_window(attributes)?;
    let raw_window = window.window_handle()?.as_raw();
    let raw_display = event_loop.display_handle()?.as_raw();
    let display =
        unsafe { Display::new(raw_display, DisplayApiPreference::WglThenEgl(Some(raw_window)))? };
    let template = config_template()
        .compatible_with_native_window(raw_window)
        .build();
    let config = pick_config(&display, template)?;
    Ok((display, config, window))
}

#[cfg(not(target_os = "windows"))]
fn open_display(
    event_loop: &ActiveEventLoop,
    attributes: WindowAttributes,
) -> Result<(Display, Config, Window), GlWindowError> {
    let raw_display = event_loop.display_handle()?.as_raw();
    let display = unsafe { Display::new(raw_display, display_preference())? };
    let config = pick_config(&display, config_template().build())?;
    let window = glutin_winit::finalize_window(event_loop, attributes, &config)?;
    Ok((display, config, window))
}

#[cfg(target_os = "macos")]
fn display_preference() -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(target_os = "android")]
fn display_preference() -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
fn display_preference() -> DisplayApiPreference {
    DisplayApiPreference::EglThenGlx(Box::new(winit::platform::x11::register_xlib_error_hook))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_candidates_yields_none() {
        let empty: Vec<(u8, &str)> = Vec::new();
        assert_eq!(most_samples(empty.into_iter(), |c| c.0), None);
    }

    #[test]
    fn highest_sample_count_wins_and_first_breaks_ties() {
        let candidates = vec![(0, "a"), (4, "b"), (2, "c"), (4, "d")];
        assert_eq!(most_samples(candidates.into_iter(), |c| c.0), Some((4, "b")));
    }
}
