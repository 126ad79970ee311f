use super::{RenderError, RenderSurface};
use glow::HasContext;
use huewheel::letterbox::{self, Letterbox};
use huewheel::{DecodedImage, Handoff};

const VERTEX_SHADER: &str = include_str!("shaders/quad.vert");
const FRAGMENT_SHADER: &str = include_str!("shaders/quad.frag");

// position xy, texture uv; texture row 0 is the top of the image
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 16] = [
    0.0, 0.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 0.0,
    1.0, 0.0, 1.0, 1.0,
    1.0, 1.0, 1.0, 0.0,
];
const VERTEX_STRIDE: i32 = 4 * size_of::<f32>() as i32;
const TEXCOORD_OFFSET: i32 = 2 * size_of::<f32>() as i32;

const COLOR_UNIT: i32 = 0;
const DATA_UNIT: i32 = 1;

fn exhausted(resource: &'static str) -> impl FnOnce(String) -> RenderError {
    move |reason| RenderError::GpuResourceExhaustion { resource, reason }
}

struct Uniforms {
    world: Option<glow::UniformLocation>,
    projection: Option<glow::UniformLocation>,
    texture: Option<glow::UniformLocation>,
    data_texture: Option<glow::UniformLocation>,
    do_harmonization: Option<glow::UniformLocation>,
}

impl Uniforms {
    fn locate(gl: &glow::Context, program: glow::Program) -> Self {
        let find = |name: &str| unsafe { gl.get_uniform_location(program, name) };
        Self {
            world: find("WorldMatrix"),
            projection: find("ProjectionMatrix"),
            texture: find("Texture"),
            data_texture: find("DataTexture"),
            do_harmonization: find("DoHarmonization"),
        }
    }
}

struct GpuResources {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    uniforms: Uniforms,
    texture: Option<glow::Texture>,
    data_texture: Option<glow::Texture>,
}

/// Draws the most recently decoded image as a letterboxed quad. Images arrive
/// through a [`Handoff`] and are uploaded on the next frame.
pub struct QuadRenderer {
    pending: Handoff<DecodedImage>,
    do_harmonization: bool,
    viewport: (i32, i32),
    image_size: Option<(u32, u32)>,
    letterbox: Letterbox,
    resources: Option<GpuResources>,
}

impl QuadRenderer {
    pub fn new(pending: Handoff<DecodedImage>, do_harmonization: bool) -> Self {
        Self {
            pending,
            do_harmonization,
            viewport: (1, 1),
            image_size: None,
            letterbox: Letterbox::IDENTITY,
            resources: None,
        }
    }

    fn upload(&mut self, gl: &glow::Context, image: DecodedImage) -> Result<(), RenderError> {
        let Some(resources) = self.resources.as_mut() else {
            return Ok(());
        };
        let (width, height) = (image.width() as i32, image.height() as i32);

        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, None);
            if let Some(old) = resources.texture.take() {
                gl.delete_texture(old);
            }

            let texture = gl.create_texture().map_err(exhausted("image texture"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.pixels())),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            resources.texture = Some(texture);

            // per-pixel harmonization data; all zeros leaves the image as is
            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, None);
            if let Some(old) = resources.data_texture.take() {
                gl.delete_texture(old);
            }

            let data = vec![0.0f32; image.pixel_count() * 4];
            let data_texture = gl.create_texture().map_err(exhausted("data texture"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(data_texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA32F as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(Some(bytemuck::cast_slice(&data))),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            resources.data_texture = Some(data_texture);
        }

        log::debug!("Uploaded {}x{} texture", width, height);
        self.image_size = Some(image.size());
        self.refit(gl);
        Ok(())
    }

    fn refit(&mut self, gl: &glow::Context) {
        self.letterbox = self
            .image_size
            .map_or(Letterbox::IDENTITY, |size| Letterbox::fit(size, self.viewport));

        if let Some(resources) = &self.resources {
            unsafe {
                gl.use_program(Some(resources.program));
                gl.uniform_matrix_4_f32_slice(
                    resources.uniforms.world.as_ref(),
                    false,
                    &self.letterbox.world_matrix().to_cols_array(),
                );
            }
        }
    }
}

impl RenderSurface for QuadRenderer {
    fn load(&mut self, gl: &glow::Context) -> Result<(), RenderError> {
        let program = link_program(gl)?;

        let resources = unsafe {
            gl.disable(glow::CULL_FACE);

            let vertex_array = gl.create_vertex_array().map_err(exhausted("vertex array"))?;
            let vertex_buffer = gl.create_buffer().map_err(exhausted("vertex buffer"))?;
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, VERTEX_STRIDE, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, VERTEX_STRIDE, TEXCOORD_OFFSET);

            gl.use_program(Some(program));
            let uniforms = Uniforms::locate(gl, program);
            gl.uniform_matrix_4_f32_slice(
                uniforms.projection.as_ref(),
                false,
                &letterbox::projection().to_cols_array(),
            );
            gl.uniform_1_i32(uniforms.texture.as_ref(), COLOR_UNIT);
            gl.uniform_1_i32(uniforms.data_texture.as_ref(), DATA_UNIT);
            gl.uniform_1_i32(
                uniforms.do_harmonization.as_ref(),
                i32::from(self.do_harmonization),
            );

            GpuResources {
                program,
                vertex_array,
                vertex_buffer,
                uniforms,
                texture: None,
                data_texture: None,
            }
        };

        self.resources = Some(resources);
        self.refit(gl);
        log::debug!("Quad renderer loaded");
        Ok(())
    }

    fn resize(&mut self, gl: &glow::Context, width: i32, height: i32) {
        self.viewport = (width.max(1), height.max(1));
        unsafe { gl.viewport(0, 0, width, height) };
        self.refit(gl);
    }

    fn render(&mut self, gl: &glow::Context) -> Result<(), RenderError> {
        if let Some(image) = self.pending.take() {
            self.upload(gl, image)?;
        }

        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }

        let Some(resources) = &self.resources else {
            return Ok(());
        };
        let Some(texture) = resources.texture else {
            return Ok(());
        };

        unsafe {
            gl.use_program(Some(resources.program));
            gl.bind_vertex_array(Some(resources.vertex_array));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, resources.data_texture);
            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
        }
        Ok(())
    }

    fn unload(&mut self, gl: &glow::Context) {
        let Some(resources) = self.resources.take() else {
            return;
        };

        unsafe {
            for texture in [resources.texture, resources.data_texture].into_iter().flatten() {
                gl.delete_texture(texture);
            }
            gl.delete_buffer(resources.vertex_buffer);
            gl.delete_vertex_array(resources.vertex_array);
            gl.delete_program(resources.program);
        }
        log::debug!("Quad renderer unloaded");
    }
}

fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader, RenderError> {
    unsafe {
        let shader = gl.create_shader(kind).map_err(exhausted("shader"))?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            Ok(shader)
        } else {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            Err(RenderError::ShaderCompile { stage, log })
        }
    }
}

fn link_program(gl: &glow::Context) -> Result<glow::Program, RenderError> {
    let vertex = compile_shader(gl, glow::VERTEX_SHADER, "Vertex", VERTEX_SHADER)?;
    let fragment = match compile_shader(gl, glow::FRAGMENT_SHADER, "Fragment", FRAGMENT_SHADER) {
        Ok(shader) => shader,
        Err(e) => {
            unsafe { gl.delete_shader(vertex) };
            return Err(e);
        }
    };

    unsafe {
        let program = gl.create_program().map_err(exhausted("shader program"));
        let linked = program.and_then(|program| {
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);

            if gl.get_program_link_status(program) {
                Ok(program)
            } else {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                Err(RenderError::ShaderLink(log))
            }
        });

        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        linked
    }
}
