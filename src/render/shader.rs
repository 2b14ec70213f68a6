use super::gpu::{GpuContext, GpuError, ProgramHandle, ShaderStage, UniformValue};
use glam::{Mat4, Vec3};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// A linked vertex + fragment program.
///
/// A program that failed to build stays around in an unusable state: binding
/// it and setting uniforms become no-ops, so the frame loop keeps running and
/// simply renders without it.
#[derive(Debug)]
pub struct ShaderProgram {
    name: String,
    program: Option<ProgramHandle>,
}

impl ShaderProgram {
    pub fn from_sources(
        gpu: &mut dyn GpuContext,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = gpu.compile_shader(ShaderStage::Vertex, vertex_source)?;
        let fragment = match gpu.compile_shader(ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                gpu.delete_shader(vertex);
                return Err(err.into());
            }
        };
        let linked = gpu.link_program(vertex, fragment);
        gpu.delete_shader(vertex);
        gpu.delete_shader(fragment);

        let program = linked?;
        log::debug!("Shader program '{}' linked", name);
        Ok(Self {
            name: name.to_string(),
            program: Some(program),
        })
    }

    pub fn from_files(
        gpu: &mut dyn GpuContext,
        name: &str,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Result<Self, ShaderError> {
        let vertex_source = read_source(vertex_path)?;
        let fragment_source = read_source(fragment_path)?;
        Self::from_sources(gpu, name, &vertex_source, &fragment_source)
    }

    /// Builds from files, logging any failure and returning an unusable
    /// program instead.
    pub fn load_or_unusable(
        gpu: &mut dyn GpuContext,
        name: &str,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Self {
        match Self::from_files(gpu, name, vertex_path, fragment_path) {
            Ok(program) => program,
            Err(err) => {
                log::error!("Shader program '{}' unusable: {}", name, err);
                Self::unusable(name)
            }
        }
    }

    pub fn unusable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            program: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_usable(&self) -> bool {
        self.program.is_some()
    }

    pub fn activate(&self, gpu: &mut dyn GpuContext) {
        if let Some(program) = self.program {
            gpu.use_program(program);
        }
    }

    pub fn set_uniform(&self, gpu: &mut dyn GpuContext, name: &str, value: UniformValue) {
        if let Some(program) = self.program {
            gpu.set_uniform(program, name, value);
        }
    }

    pub fn set_int(&self, gpu: &mut dyn GpuContext, name: &str, value: i32) {
        self.set_uniform(gpu, name, UniformValue::Int(value));
    }

    pub fn set_float(&self, gpu: &mut dyn GpuContext, name: &str, value: f32) {
        self.set_uniform(gpu, name, UniformValue::Float(value));
    }

    pub fn set_vec3(&self, gpu: &mut dyn GpuContext, name: &str, value: Vec3) {
        self.set_uniform(gpu, name, UniformValue::Vec3(value));
    }

    pub fn set_mat4(&self, gpu: &mut dyn GpuContext, name: &str, value: Mat4) {
        self.set_uniform(gpu, name, UniformValue::Mat4(value));
    }

    pub fn release(self, gpu: &mut dyn GpuContext) {
        if let Some(program) = self.program {
            gpu.delete_program(program);
        }
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{GpuCall, RecordingGpu};

    #[test]
    fn builds_and_frees_intermediate_shaders() {
        let mut gpu = RecordingGpu::new();
        let program = ShaderProgram::from_sources(&mut gpu, "model", "vs", "fs").unwrap();
        assert!(program.is_usable());
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::DeleteShader(_))), 2);
    }

    #[test]
    fn compile_failure_reports_stage_and_log() {
        let mut gpu = RecordingGpu::new();
        gpu.fail_compile = Some(ShaderStage::Fragment);
        let err = ShaderProgram::from_sources(&mut gpu, "model", "vs", "fs").unwrap_err();
        match err {
            ShaderError::Gpu(GpuError::ShaderCompile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("syntax error"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        // The vertex shader that did compile is not leaked.
        assert_eq!(gpu.count(|call| matches!(call, GpuCall::DeleteShader(_))), 1);
    }

    #[test]
    fn link_failure_is_an_error() {
        let mut gpu = RecordingGpu::new();
        gpu.fail_link = true;
        let err = ShaderProgram::from_sources(&mut gpu, "model", "vs", "fs").unwrap_err();
        assert!(matches!(err, ShaderError::Gpu(GpuError::ProgramLink { .. })));
    }

    #[test]
    fn missing_file_degrades_to_unusable_program() {
        let mut gpu = RecordingGpu::new();
        let program = ShaderProgram::load_or_unusable(
            &mut gpu,
            "missing",
            Path::new("does/not/exist.vert"),
            Path::new("does/not/exist.frag"),
        );
        assert!(!program.is_usable());

        program.activate(&mut gpu);
        program.set_float(&mut gpu, "ambientStrength", 0.5);
        program.set_mat4(&mut gpu, "view", Mat4::IDENTITY);
        assert!(gpu.calls.is_empty());
    }

    #[test]
    fn uniforms_go_to_the_linked_program() {
        let mut gpu = RecordingGpu::new();
        let program = ShaderProgram::from_sources(&mut gpu, "model", "vs", "fs").unwrap();
        gpu.clear_calls();

        program.set_int(&mut gpu, "material.texture_diffuse1", 0);
        program.set_float(&mut gpu, "ambientStrength", 0.5);
        program.set_vec3(&mut gpu, "ambientColour", Vec3::ONE);
        program.set_mat4(&mut gpu, "model", Mat4::IDENTITY);
        assert_eq!(
            gpu.uniforms_named("material.texture_diffuse1"),
            vec![UniformValue::Int(0)]
        );
        assert_eq!(
            gpu.uniforms_named("ambientStrength"),
            vec![UniformValue::Float(0.5)]
        );
        assert_eq!(
            gpu.uniforms_named("ambientColour"),
            vec![UniformValue::Vec3(Vec3::ONE)]
        );
        assert_eq!(
            gpu.uniforms_named("model"),
            vec![UniformValue::Mat4(Mat4::IDENTITY)]
        );
    }
}
