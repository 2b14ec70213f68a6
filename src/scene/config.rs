use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the demo configuration, relative to the crate directory.
pub const DEFAULT_CONFIG_PATH: &str = "assets/demo.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub model: ModelConfig,
    pub shaders: ShaderConfig,
    pub skybox: SkyboxConfig,
    pub lighting: LightingConfig,
    pub controls: ControlsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "MAT392 - Mathematics in Computer Graphics Demo".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Model file plus the transform edited from the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub position: [f32; 3],
    pub rotation_deg: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("res/models/airplane/airplane.gltf"),
            position: [0.0; 3],
            rotation_deg: [0.0; 3],
            scale: [0.001; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub model_vertex: PathBuf,
    pub model_fragment: PathBuf,
    pub skybox_vertex: PathBuf,
    pub skybox_fragment: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            model_vertex: PathBuf::from("shaders/model.vert"),
            model_fragment: PathBuf::from("shaders/model.frag"),
            skybox_vertex: PathBuf::from("shaders/skybox.vert"),
            skybox_fragment: PathBuf::from("shaders/skybox.frag"),
        }
    }
}

/// Cube faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    pub faces: [PathBuf; 6],
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            faces: [
                "res/images/skyrender0005.bmp",
                "res/images/skyrender0001.bmp",
                "res/images/skyrender0003.bmp",
                "res/images/skyrender0006.bmp",
                "res/images/skyrender0004.bmp",
                "res/images/skyrender0002.bmp",
            ]
            .map(PathBuf::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_strength: f32,
    pub ambient_colour: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_strength: 0.5,
            ambient_colour: [1.0; 3],
        }
    }
}

/// Initial state of the menu toggles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub mouse_lock: bool,
    pub wireframe: bool,
    pub skybox: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            mouse_lock: false,
            wireframe: false,
            skybox: true,
        }
    }
}

pub fn save_config(config: &DemoConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<DemoConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: DemoConfig = serde_json::from_str(&json)?;
    Ok(config)
}

/// Loads `path`, falling back to the built-in defaults with a warning.
pub fn load_config_or_default(path: &Path) -> DemoConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(err) => {
            log::warn!(
                "Using default config, {} could not be loaded: {}",
                path.display(),
                err
            );
            DemoConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(tag: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "freelook_{}_{}_{}.json",
            tag,
            std::process::id(),
            nonce
        ))
    }

    #[test]
    fn defaults_match_the_demo_constants() {
        let config = DemoConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.camera.position, [0.0, 0.0, 3.0]);
        assert_eq!(config.camera.yaw, -90.0);
        assert_eq!(config.model.scale, [0.001; 3]);
        assert_eq!(config.lighting.ambient_strength, 0.5);
        assert!(config.controls.skybox);
        assert!(!config.controls.mouse_lock);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: DemoConfig =
            serde_json::from_str(r#"{ "camera": { "fov": 60.0 }, "controls": { "wireframe": true } }"#)
                .unwrap();
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.movement_speed, 2.5);
        assert!(config.controls.wireframe);
        assert!(config.controls.skybox);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn save_then_load_through_file() {
        let path = temp_config_path("save");
        let mut config = DemoConfig::default();
        config.model.rotation_deg = [10.0, 20.0, 30.0];
        config.lighting.ambient_colour = [0.2, 0.4, 0.6];

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_config_path("broken");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
        assert_eq!(load_config_or_default(&path), DemoConfig::default());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn bundled_config_names_user_supplied_res_assets() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = load_config(&path).unwrap();
        assert!(config.model.path.starts_with("res"));
        assert!(config.skybox.faces.iter().all(|face| face.starts_with("res")));
        let shaders = &config.shaders;
        for shader in [
            &shaders.model_vertex,
            &shaders.model_fragment,
            &shaders.skybox_vertex,
            &shaders.skybox_fragment,
        ] {
            assert!(Path::new(env!("CARGO_MANIFEST_DIR")).join(shader).is_file());
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = temp_config_path("missing");
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }
}
