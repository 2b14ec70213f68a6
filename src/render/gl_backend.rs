//! `GpuContext` over a `glow` OpenGL 3.3 core context.

use super::gpu::{
    BufferHandle, DepthFunc, GpuContext, GpuError, MeshBuffers, PolygonMode, ProgramHandle,
    ShaderHandle, ShaderStage, TextureHandle, TextureImage, TextureTarget, UniformValue,
    VertexArrayHandle, VertexLayout,
};
use glow::HasContext as _;
use std::sync::Arc;

pub struct GlowGpu {
    gl: Arc<glow::Context>,
}

impl GlowGpu {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        }
        Self { gl }
    }

    /// Re-establishes the state the scene pass expects after another
    /// renderer (the GUI painter) has used the context.
    pub fn begin_scene_pass(&mut self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.disable(glow::BLEND);
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.depth_func(glow::LESS);
        }
    }
}

fn gl_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn pixel_format(channels: u8) -> u32 {
    match channels {
        1 => glow::RED,
        2 => glow::RG,
        3 => glow::RGB,
        _ => glow::RGBA,
    }
}

fn create_error(kind: &'static str) -> impl FnOnce(String) -> GpuError {
    move |message| GpuError::Create { kind, message }
}

unsafe fn upload_image(gl: &glow::Context, target: u32, image: &TextureImage) {
    let format = pixel_format(image.channels);
    gl.tex_image_2d(
        target,
        0,
        format as i32,
        image.width as i32,
        image.height as i32,
        0,
        format,
        glow::UNSIGNED_BYTE,
        glow::PixelUnpackData::Slice(Some(&image.pixels)),
    );
}

impl GpuContext for GlowGpu {
    fn create_mesh_buffers(
        &mut self,
        vertex_bytes: &[u8],
        indices: Option<&[u32]>,
        layout: &VertexLayout<'_>,
    ) -> Result<MeshBuffers, GpuError> {
        let gl = &self.gl;
        unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(create_error("vertex array"))?;
            let vbo = gl.create_buffer().map_err(create_error("vertex buffer"))?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertex_bytes, glow::STATIC_DRAW);

            let ebo = match indices {
                Some(indices) => {
                    let ebo = gl.create_buffer().map_err(create_error("index buffer"))?;
                    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                    gl.buffer_data_u8_slice(
                        glow::ELEMENT_ARRAY_BUFFER,
                        bytemuck::cast_slice(indices),
                        glow::STATIC_DRAW,
                    );
                    Some(ebo)
                }
                None => None,
            };

            for attribute in layout.attributes {
                gl.enable_vertex_attrib_array(attribute.location);
                gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    layout.stride as i32,
                    attribute.offset as i32,
                );
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(MeshBuffers {
                vertex_array: VertexArrayHandle(vao.0),
                vertex_buffer: BufferHandle(vbo.0),
                index_buffer: ebo.map(|ebo| BufferHandle(ebo.0)),
            })
        }
    }

    fn create_texture_2d(
        &mut self,
        image: Option<&TextureImage>,
    ) -> Result<TextureHandle, GpuError> {
        let gl = &self.gl;
        unsafe {
            let texture = gl.create_texture().map_err(create_error("texture"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            if let Some(image) = image {
                upload_image(gl, glow::TEXTURE_2D, image);
                gl.generate_mipmap(glow::TEXTURE_2D);
            }
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureHandle(texture.0))
        }
    }

    fn create_cube_map(
        &mut self,
        faces: &[Option<TextureImage>; 6],
    ) -> Result<TextureHandle, GpuError> {
        let gl = &self.gl;
        unsafe {
            let texture = gl.create_texture().map_err(create_error("cube map"))?;
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            for (index, face) in faces.iter().enumerate() {
                if let Some(image) = face {
                    upload_image(gl, glow::TEXTURE_CUBE_MAP_POSITIVE_X + index as u32, image);
                }
            }
            let target = glow::TEXTURE_CUBE_MAP;
            gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE as i32);
            gl.bind_texture(target, None);
            Ok(TextureHandle(texture.0))
        }
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, GpuError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let gl = &self.gl;
        unsafe {
            let shader = gl.create_shader(kind).map_err(create_error("shader"))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(GpuError::ShaderCompile { stage, log });
            }
            Ok(ShaderHandle(shader.0))
        }
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, GpuError> {
        let gl = &self.gl;
        let vertex = glow::NativeShader(vertex.0);
        let fragment = glow::NativeShader(fragment.0);
        unsafe {
            let program = gl.create_program().map_err(create_error("program"))?;
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(GpuError::ProgramLink { log });
            }
            Ok(ProgramHandle(program.0))
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        unsafe { self.gl.use_program(Some(glow::NativeProgram(program.0))) }
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let gl = &self.gl;
        unsafe {
            let location = gl.get_uniform_location(glow::NativeProgram(program.0), name);
            let location = location.as_ref();
            match value {
                UniformValue::Int(value) => gl.uniform_1_i32(location, value),
                UniformValue::Float(value) => gl.uniform_1_f32(location, value),
                UniformValue::Vec3(value) => gl.uniform_3_f32_slice(location, &value.to_array()),
                UniformValue::Mat4(value) => {
                    gl.uniform_matrix_4_f32_slice(location, false, &value.to_cols_array())
                }
            }
        }
    }

    fn set_active_texture_unit(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>) {
        unsafe {
            self.gl.bind_texture(
                gl_target(target),
                texture.map(|texture| glow::NativeTexture(texture.0)),
            )
        }
    }

    fn draw_elements(&mut self, vertex_array: VertexArrayHandle, index_count: usize) {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            self.gl.draw_elements(
                glow::TRIANGLES,
                index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
            self.gl.bind_vertex_array(None);
        }
    }

    fn draw_arrays(&mut self, vertex_array: VertexArrayHandle, vertex_count: usize) {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            self.gl.draw_arrays(glow::TRIANGLES, 0, vertex_count as i32);
            self.gl.bind_vertex_array(None);
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(
                0,
                0,
                width.min(i32::MAX as u32) as i32,
                height.min(i32::MAX as u32) as i32,
            )
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        let func = match func {
            DepthFunc::Less => glow::LESS,
            DepthFunc::LessEqual => glow::LEQUAL,
        };
        unsafe { self.gl.depth_func(func) }
    }

    fn delete_mesh_buffers(&mut self, buffers: MeshBuffers) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(buffers.vertex_array.0));
            self.gl
                .delete_buffer(glow::NativeBuffer(buffers.vertex_buffer.0));
            if let Some(index_buffer) = buffers.index_buffer {
                self.gl.delete_buffer(glow::NativeBuffer(index_buffer.0));
            }
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }
}
