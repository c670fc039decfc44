//! OpenGL renderer
//!
//! Draws glyph payloads with one shader (see `shader.rs`). Geometry is either
//! streamed through a shared buffer each call or, when the glyph asks for it,
//! uploaded once and kept keyed by its `GlyphId` (the display-list cache).
//! Atlas pages are uploaded once per generation.

use std::collections::HashMap;
use std::ffi::c_void;

use anyhow::{anyhow, Result};
use glow::HasContext;
use log::{debug, info, warn};

use crate::constants::VERTEX_FLOATS;
use crate::face::Raster;
use crate::font::atlas::AtlasPage;
use crate::geometry::Vector;

use super::shader::{self, GlyphShader, MODE_COVERAGE, MODE_SOLID};
use super::{DrawState, GlyphId, LineLoops, Mesh, Renderer, TexturedQuad};

/// Visible Z range either side of the text plane (extruded text)
const DEPTH_RANGE: f32 = 1000.0;

/// Draw state captured by `push_state`
#[derive(Debug, Clone, Copy)]
struct SavedState {
    blend: bool,
    depth_test: bool,
    line_smooth: bool,
    blend_src: i32,
    blend_dst: i32,
}

/// GPU copy of glyph geometry
struct Retained {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    /// (first vertex, vertex count) per primitive run
    ranges: Vec<(i32, i32)>,
}

/// Texture with the generation it was uploaded at
struct PageTexture {
    texture: glow::Texture,
    generation: u64,
}

pub struct GlRenderer {
    gl: glow::Context,
    shader: GlyphShader,
    /// Streaming buffers for non-retained geometry
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    projection: [f32; 16],
    color: [f32; 4],
    saved: Vec<SavedState>,
    /// Desktop GL only: ES has no LINE_SMOOTH
    has_line_smooth: bool,
    geometry: HashMap<GlyphId, Retained>,
    rasters: HashMap<GlyphId, glow::Texture>,
    pages: HashMap<u64, PageTexture>,
}

impl GlRenderer {
    /// Load GL entry points through `loader` (the current context must be live)
    pub fn from_loader<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        Self::new(gl)
    }

    pub fn new(gl: glow::Context) -> Result<Self> {
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        info!("OpenGL: {}", version);
        let has_line_smooth = !gl.version().is_embedded;

        let shader = GlyphShader::new(&gl)?;
        let (vao, vbo) = unsafe { create_vertex_buffer(&gl)? };

        Ok(Self {
            gl,
            shader,
            vao,
            vbo,
            projection: shader::ortho_projection(1.0, 1.0, DEPTH_RANGE),
            color: [1.0, 1.0, 1.0, 1.0],
            saved: Vec::new(),
            has_line_smooth,
            geometry: HashMap::new(),
            rasters: HashMap::new(),
            pages: HashMap::new(),
        })
    }

    /// Map pixel coordinates (0,0)-(width,height) to the viewport
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
        self.projection =
            shader::ortho_projection(width.max(1) as f32, height.max(1) as f32, DEPTH_RANGE);
    }

    /// Text color [r, g, b, a] (0.0-1.0)
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    /// Drop every retained buffer and texture
    pub fn clear_retained(&mut self) {
        unsafe {
            for (_, r) in self.geometry.drain() {
                self.gl.delete_vertex_array(r.vao);
                self.gl.delete_buffer(r.vbo);
            }
            for (_, tex) in self.rasters.drain() {
                self.gl.delete_texture(tex);
            }
            for (_, page) in self.pages.drain() {
                self.gl.delete_texture(page.texture);
            }
        }
        debug!("GL retained resources released");
    }

    fn begin(&self, origin: Vector, mode: i32) {
        self.shader.bind(&self.gl);
        self.shader.set_projection(&self.gl, &self.projection);
        self.shader.set_origin(&self.gl, [origin.x, origin.y, origin.z]);
        self.shader.set_color(&self.gl, self.color);
        self.shader.set_mode(&self.gl, mode);
        self.shader.set_texture_unit(&self.gl, 0);
    }

    /// Upload `vertices` to the streaming buffer and draw `ranges`
    fn draw_streamed(&self, primitive: u32, vertices: &[f32], ranges: &[(i32, i32)]) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STREAM_DRAW,
            );
            for &(first, count) in ranges {
                self.gl.draw_arrays(primitive, first, count);
            }
            self.gl.bind_vertex_array(None);
        }
    }

    /// Draw the retained copy of `id`, building and uploading it on first use
    fn draw_retained<F>(&mut self, primitive: u32, id: GlyphId, build: F)
    where
        F: FnOnce() -> (Vec<f32>, Vec<(i32, i32)>),
    {
        if !self.geometry.contains_key(&id) {
            let (vertices, ranges) = build();
            match unsafe { upload_retained(&self.gl, &vertices) } {
                Ok((vao, vbo)) => {
                    self.geometry.insert(id, Retained { vao, vbo, ranges });
                }
                Err(e) => {
                    warn!("Failed to retain glyph geometry: {}", e);
                    return;
                }
            }
        }
        let Some(retained) = self.geometry.get(&id) else {
            return;
        };
        unsafe {
            self.gl.bind_vertex_array(Some(retained.vao));
            for &(first, count) in &retained.ranges {
                self.gl.draw_arrays(primitive, first, count);
            }
            self.gl.bind_vertex_array(None);
        }
    }

    /// Coverage texture for a raster, cached when `retain`
    fn raster_texture(&mut self, id: GlyphId, raster: &Raster, retain: bool) -> Option<(glow::Texture, bool)> {
        if let Some(&tex) = self.rasters.get(&id) {
            return Some((tex, false));
        }
        let coverage: Vec<u8> = (0..raster.rows)
            .flat_map(|y| (0..raster.width).map(move |x| raster.coverage(x, y)))
            .collect();
        let tex = match unsafe { upload_r8(&self.gl, raster.width, raster.rows, &coverage) } {
            Ok(tex) => tex,
            Err(e) => {
                warn!("Failed to upload glyph raster: {}", e);
                return None;
            }
        };
        if retain {
            self.rasters.insert(id, tex);
            Some((tex, false))
        } else {
            Some((tex, true))
        }
    }

    fn draw_raster(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool) {
        let Some((tex, transient)) = self.raster_texture(id, raster, retain) else {
            return;
        };
        let left = raster.left as f32;
        let top = raster.top as f32;
        let quad = TexturedQuad {
            lower: Vector::xy(left, top - raster.rows as f32),
            upper: Vector::xy(left + raster.width as f32, top),
            uv_min: [0.0, 0.0],
            uv_max: [1.0, 1.0],
        };
        self.draw_quad(origin, tex, &quad);
        if transient {
            unsafe { self.gl.delete_texture(tex) };
        }
    }

    fn draw_quad(&mut self, origin: Vector, tex: glow::Texture, quad: &TexturedQuad) {
        self.begin(origin, MODE_COVERAGE);
        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        }
        let vertices = quad_vertices(quad);
        let count = (vertices.len() / VERTEX_FLOATS) as i32;
        self.draw_streamed(glow::TRIANGLES, &vertices, &[(0, count)]);
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, None) };
    }

    /// Release resources
    pub fn destroy(&mut self) {
        self.clear_retained();
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
        }
        self.shader.destroy(&self.gl);
    }
}

impl Renderer for GlRenderer {
    fn push_state(&mut self, state: DrawState) {
        let gl = &self.gl;
        unsafe {
            self.saved.push(SavedState {
                blend: gl.is_enabled(glow::BLEND),
                depth_test: gl.is_enabled(glow::DEPTH_TEST),
                line_smooth: self.has_line_smooth && gl.is_enabled(glow::LINE_SMOOTH),
                blend_src: gl.get_parameter_i32(glow::BLEND_SRC_RGB),
                blend_dst: gl.get_parameter_i32(glow::BLEND_DST_RGB),
            });
            set_cap(gl, glow::BLEND, state.blend);
            if state.blend {
                gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            }
            set_cap(gl, glow::DEPTH_TEST, state.depth_test);
            if self.has_line_smooth {
                set_cap(gl, glow::LINE_SMOOTH, state.line_smooth);
            }
        }
    }

    fn pop_state(&mut self) {
        let Some(saved) = self.saved.pop() else {
            warn!("GL pop_state without matching push_state");
            return;
        };
        let gl = &self.gl;
        unsafe {
            set_cap(gl, glow::BLEND, saved.blend);
            gl.blend_func(saved.blend_src as u32, saved.blend_dst as u32);
            set_cap(gl, glow::DEPTH_TEST, saved.depth_test);
            if self.has_line_smooth {
                set_cap(gl, glow::LINE_SMOOTH, saved.line_smooth);
            }
        }
    }

    fn draw_bitmap(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool) {
        self.draw_raster(id, origin, raster, retain);
    }

    fn draw_pixmap(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool) {
        self.draw_raster(id, origin, raster, retain);
    }

    fn draw_line_loops(&mut self, origin: Vector, lines: &LineLoops, retain: bool) {
        self.begin(origin, MODE_SOLID);
        let build = || {
            let mut vertices = Vec::with_capacity(lines.point_count() * VERTEX_FLOATS);
            let mut ranges = Vec::with_capacity(lines.loops.len());
            for ring in &lines.loops {
                let first = (vertices.len() / VERTEX_FLOATS) as i32;
                for p in ring {
                    push_vertex(&mut vertices, *p, [0.0, 0.0], Vector::ZERO);
                }
                ranges.push((first, ring.len() as i32));
            }
            (vertices, ranges)
        };
        if retain {
            self.draw_retained(glow::LINE_LOOP, lines.id, build);
        } else {
            let (vertices, ranges) = build();
            self.draw_streamed(glow::LINE_LOOP, &vertices, &ranges);
        }
    }

    fn draw_triangles(&mut self, origin: Vector, mesh: &Mesh, retain: bool) {
        self.begin(origin, MODE_SOLID);
        let build = || {
            let mut vertices = Vec::with_capacity(mesh.positions.len() * VERTEX_FLOATS);
            for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
                push_vertex(&mut vertices, *p, [0.0, 0.0], *n);
            }
            (vertices, vec![(0, mesh.positions.len() as i32)])
        };
        if retain {
            self.draw_retained(glow::TRIANGLES, mesh.id, build);
        } else {
            let (vertices, ranges) = build();
            self.draw_streamed(glow::TRIANGLES, &vertices, &ranges);
        }
    }

    fn draw_textured_quad(&mut self, origin: Vector, page: &AtlasPage, quad: &TexturedQuad) {
        let stale = self
            .pages
            .get(&page.id)
            .map_or(true, |t| t.generation != page.generation);
        if stale {
            if let Some(old) = self.pages.remove(&page.id) {
                unsafe { self.gl.delete_texture(old.texture) };
            }
            match unsafe { upload_r8(&self.gl, page.width, page.height, &page.data) } {
                Ok(texture) => {
                    debug!("Atlas page {} uploaded (generation {})", page.id, page.generation);
                    self.pages.insert(
                        page.id,
                        PageTexture {
                            texture,
                            generation: page.generation,
                        },
                    );
                }
                Err(e) => {
                    warn!("Failed to upload atlas page {}: {}", page.id, e);
                    return;
                }
            }
        }
        let Some(texture) = self.pages.get(&page.id).map(|t| t.texture) else {
            return;
        };
        self.draw_quad(origin, texture, quad);
    }

    fn release(&mut self, glyphs: &[GlyphId], pages: &[u64]) {
        unsafe {
            for id in glyphs {
                if let Some(r) = self.geometry.remove(id) {
                    self.gl.delete_vertex_array(r.vao);
                    self.gl.delete_buffer(r.vbo);
                }
                if let Some(tex) = self.rasters.remove(id) {
                    self.gl.delete_texture(tex);
                }
            }
            for page in pages {
                if let Some(page) = self.pages.remove(page) {
                    self.gl.delete_texture(page.texture);
                }
            }
        }
        debug!(
            "GL released {} glyphs, {} pages ({} retained left)",
            glyphs.len(),
            pages.len(),
            self.geometry.len() + self.rasters.len()
        );
    }
}

unsafe fn set_cap(gl: &glow::Context, cap: u32, enable: bool) {
    if enable {
        gl.enable(cap);
    } else {
        gl.disable(cap);
    }
}

fn push_vertex(out: &mut Vec<f32>, p: Vector, uv: [f32; 2], n: Vector) {
    out.extend_from_slice(&[p.x, p.y, p.z, uv[0], uv[1], n.x, n.y, n.z]);
}

/// Two triangles covering the quad; texture row 0 is the top edge
fn quad_vertices(quad: &TexturedQuad) -> Vec<f32> {
    let (l, b) = (quad.lower.x, quad.lower.y);
    let (r, t) = (quad.upper.x, quad.upper.y);
    let [u0, v0] = quad.uv_min;
    let [u1, v1] = quad.uv_max;
    let corners = [
        (Vector::xy(l, t), [u0, v0]),
        (Vector::xy(r, t), [u1, v0]),
        (Vector::xy(r, b), [u1, v1]),
        (Vector::xy(l, t), [u0, v0]),
        (Vector::xy(r, b), [u1, v1]),
        (Vector::xy(l, b), [u0, v1]),
    ];
    let mut vertices = Vec::with_capacity(corners.len() * VERTEX_FLOATS);
    for (p, uv) in corners {
        push_vertex(&mut vertices, p, uv, Vector::ZERO);
    }
    vertices
}

/// Attribute layout: a_pos(3) a_uv(2) a_normal(3)
unsafe fn set_vertex_layout(gl: &glow::Context) {
    let stride = (VERTEX_FLOATS * 4) as i32;
    gl.enable_vertex_attrib_array(0);
    gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
    gl.enable_vertex_attrib_array(1);
    gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 12);
    gl.enable_vertex_attrib_array(2);
    gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, stride, 20);
}

unsafe fn create_vertex_buffer(gl: &glow::Context) -> Result<(glow::VertexArray, glow::Buffer)> {
    let vao = gl
        .create_vertex_array()
        .map_err(|e| anyhow!("Failed to create VAO: {}", e))?;
    gl.bind_vertex_array(Some(vao));
    let vbo = gl
        .create_buffer()
        .map_err(|e| anyhow!("Failed to create VBO: {}", e))?;
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
    set_vertex_layout(gl);
    gl.bind_vertex_array(None);
    Ok((vao, vbo))
}

unsafe fn upload_retained(
    gl: &glow::Context,
    vertices: &[f32],
) -> Result<(glow::VertexArray, glow::Buffer)> {
    let (vao, vbo) = create_vertex_buffer(gl)?;
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
    gl.buffer_data_u8_slice(
        glow::ARRAY_BUFFER,
        bytemuck::cast_slice(vertices),
        glow::STATIC_DRAW,
    );
    Ok((vao, vbo))
}

/// Upload 8-bit coverage as an R8 texture
unsafe fn upload_r8(gl: &glow::Context, width: u32, height: u32, data: &[u8]) -> Result<glow::Texture> {
    let tex = gl
        .create_texture()
        .map_err(|e| anyhow!("Failed to create texture: {}", e))?;

    gl.bind_texture(glow::TEXTURE_2D, Some(tex));
    gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::R8 as i32,
        width as i32,
        height as i32,
        0,
        glow::RED,
        glow::UNSIGNED_BYTE,
        Some(data),
    );
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    gl.bind_texture(glow::TEXTURE_2D, None);

    Ok(tex)
}
