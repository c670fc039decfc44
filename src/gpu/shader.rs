//! Shader management
//!
//! GLSL ES 3.00 shader compilation and linking

use anyhow::{anyhow, Result};
use glow::HasContext;
use log::info;

/// Glyph vertex shader (GLSL ES 3.00)
///
/// Input:
///   a_pos:    Vertex position relative to the pen (pixels, Y-up)
///   a_uv:     Texture coordinates
///   a_normal: Surface normal (zero for flat geometry)
/// Uniform:
///   u_projection: Orthographic projection matrix
///   u_origin:     Pen position
const GLYPH_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

layout(location = 0) in vec3 a_pos;
layout(location = 1) in vec2 a_uv;
layout(location = 2) in vec3 a_normal;

uniform mat4 u_projection;
uniform vec3 u_origin;

out vec2 v_uv;
out vec3 v_normal;

void main() {
    gl_Position = u_projection * vec4(a_pos + u_origin, 1.0);
    v_uv = a_uv;
    v_normal = a_normal;
}
"#;

/// Glyph fragment shader
///
/// u_mode 0: solid color (lines, triangles), shaded by the normal's Z
/// u_mode 1: color modulated by R8 coverage texture (rasters, atlas quads)
const GLYPH_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 v_uv;
in vec3 v_normal;

uniform vec4 u_color;
uniform int u_mode;
uniform sampler2D u_texture;

out vec4 frag_color;

void main() {
    if (u_mode == 1) {
        float alpha = texture(u_texture, v_uv).r;
        frag_color = vec4(u_color.rgb, u_color.a * alpha);
    } else {
        float shade = 1.0;
        if (dot(v_normal, v_normal) > 0.0) {
            shade = 0.55 + 0.45 * abs(normalize(v_normal).z);
        }
        frag_color = vec4(u_color.rgb * shade, u_color.a);
    }
}
"#;

/// Fragment shader mode: solid color
pub const MODE_SOLID: i32 = 0;
/// Fragment shader mode: coverage texture
pub const MODE_COVERAGE: i32 = 1;

/// Compiled glyph shader program
pub struct GlyphShader {
    program: glow::Program,
    pub u_projection: glow::UniformLocation,
    pub u_origin: glow::UniformLocation,
    pub u_color: glow::UniformLocation,
    pub u_mode: glow::UniformLocation,
    pub u_texture: glow::UniformLocation,
}

impl GlyphShader {
    /// Compile and link the glyph shader
    pub fn new(gl: &glow::Context) -> Result<Self> {
        let program = compile_program(gl, GLYPH_VERTEX_SHADER, GLYPH_FRAGMENT_SHADER)?;

        let uniform = |name: &str| unsafe {
            gl.get_uniform_location(program, name)
                .ok_or_else(|| anyhow!("{} uniform not found", name))
        };
        let u_projection = uniform("u_projection")?;
        let u_origin = uniform("u_origin")?;
        let u_color = uniform("u_color")?;
        let u_mode = uniform("u_mode")?;
        let u_texture = uniform("u_texture")?;

        info!("Glyph shader compiled");
        Ok(Self {
            program,
            u_projection,
            u_origin,
            u_color,
            u_mode,
            u_texture,
        })
    }

    /// Activate the shader
    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(Some(self.program));
        }
    }

    pub fn set_projection(&self, gl: &glow::Context, matrix: &[f32; 16]) {
        unsafe {
            gl.uniform_matrix_4_f32_slice(Some(&self.u_projection), false, matrix);
        }
    }

    pub fn set_origin(&self, gl: &glow::Context, origin: [f32; 3]) {
        unsafe {
            gl.uniform_3_f32(Some(&self.u_origin), origin[0], origin[1], origin[2]);
        }
    }

    pub fn set_color(&self, gl: &glow::Context, color: [f32; 4]) {
        unsafe {
            gl.uniform_4_f32(Some(&self.u_color), color[0], color[1], color[2], color[3]);
        }
    }

    pub fn set_mode(&self, gl: &glow::Context, mode: i32) {
        unsafe {
            gl.uniform_1_i32(Some(&self.u_mode), mode);
        }
    }

    /// Set texture unit
    pub fn set_texture_unit(&self, gl: &glow::Context, unit: i32) {
        unsafe {
            gl.uniform_1_i32(Some(&self.u_texture), unit);
        }
    }

    /// Release resources
    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
        }
    }
}

/// Generate orthographic projection matrix (bottom-left origin, Y-up)
///
/// Map pixel coordinates (0,0)-(width,height) to NDC (-1,-1)-(1,1).
/// `depth` is the visible Z range either side of the text plane.
pub fn ortho_projection(width: f32, height: f32, depth: f32) -> [f32; 16] {
    let l = 0.0_f32;
    let r = width;
    let b = 0.0_f32;
    let t = height;
    let n = -depth;
    let f = depth;

    // Column-major (OpenGL convention)
    [
        2.0 / (r - l),
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 / (t - b),
        0.0,
        0.0,
        0.0,
        0.0,
        -2.0 / (f - n),
        0.0,
        -(r + l) / (r - l),
        -(t + b) / (t - b),
        -(f + n) / (f - n),
        1.0,
    ]
}

/// Compile shader and link program
fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program> {
    unsafe {
        let vs = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
        let fs = compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src)?;

        let program = gl
            .create_program()
            .map_err(|e| anyhow!("Failed to create program: {}", e))?;

        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(anyhow!("Shader link failed: {}", log));
        }

        // Shader objects no longer needed after linking
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        Ok(program)
    }
}

/// Compile individual shader
fn compile_shader(gl: &glow::Context, shader_type: u32, source: &str) -> Result<glow::Shader> {
    unsafe {
        let shader = gl
            .create_shader(shader_type)
            .map_err(|e| anyhow!("Failed to create shader: {}", e))?;

        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            let type_name = match shader_type {
                glow::VERTEX_SHADER => "vertex",
                glow::FRAGMENT_SHADER => "fragment",
                _ => "unknown",
            };
            return Err(anyhow!("{} shader compile failed: {}", type_name, log));
        }

        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &[f32; 16], p: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (row, value) in out.iter_mut().enumerate() {
            *value = m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row];
        }
        out
    }

    #[test]
    fn test_ortho_maps_corners() {
        let close = |a: [f32; 3], b: [f32; 3]| a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5);
        let m = ortho_projection(800.0, 600.0, 100.0);
        assert!(close(apply(&m, [0.0, 0.0, 0.0]), [-1.0, -1.0, 0.0]));
        assert!(close(apply(&m, [800.0, 600.0, 0.0]), [1.0, 1.0, 0.0]));
        // Front of an extrusion (z = 0) is nearer than its back (z < 0)
        assert!(apply(&m, [0.0, 0.0, -50.0])[2] > apply(&m, [0.0, 0.0, 0.0])[2]);
    }
}
