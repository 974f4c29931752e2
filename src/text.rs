use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use freetype::Library;
use freetype::face::LoadFlag;
use thiserror::Error;

use crate::panel::ortho_projection;
use crate::ui::{TextAnchor, TextCommand};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextUniforms {
    pub projection: [[f32; 4]; 4],
}

#[derive(Clone, Copy)]
struct GlyphInfo {
    width: u32,
    height: u32,
    bearing_x: i32,
    bearing_y: i32,
    advance: f32,
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
}

/// Rasterisation results per (character, pixel size). Failures are kept
/// too: the atlas never frees space, so a miss stays a miss.
#[derive(Default)]
struct GlyphCache {
    entries: HashMap<(char, u32), Option<GlyphInfo>>,
}

impl GlyphCache {
    /// `None` if never tried; `Some(None)` for a remembered failure.
    fn lookup(&self, ch: char, px: u32) -> Option<Option<GlyphInfo>> {
        self.entries.get(&(ch, px)).copied()
    }

    fn record(&mut self, ch: char, px: u32, info: Option<GlyphInfo>) {
        self.entries.insert((ch, px), info);
    }
}

struct PendingGlyphUpload {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("no usable font found (tried {0:?})")]
    NotFound(Vec<PathBuf>),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("freetype: {0}")]
    FreeType(#[from] freetype::Error),
}

/// Tried in order after the configured font.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const ATLAS_SIZE: u32 = 1024;

/// Candidate font paths: the configured one (as given, then next to the
/// executable), then common system fonts.
pub fn font_candidates(configured: &str) -> Vec<PathBuf> {
    let mut out = vec![PathBuf::from(configured)];
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        out.push(dir.join(configured));
    }
    out.extend(FALLBACK_FONTS.iter().map(PathBuf::from));
    out
}

fn first_existing(candidates: &[PathBuf]) -> Option<&Path> {
    candidates.iter().map(PathBuf::as_path).find(|p| p.is_file())
}

/// Text runs rasterised on demand with FreeType into a shelf-packed R8
/// atlas. Glyphs are cached per (character, pixel size).
pub struct TextRenderer {
    glyphs: GlyphCache,
    ascenders: HashMap<u32, f32>,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    frame_vertices: Vec<TextVertex>,

    // FreeType context (kept alive for on-demand rasterization)
    _ft_lib: Library,
    ft_face: freetype::Face,
    face_px: u32,

    atlas_texture: wgpu::Texture,
    atlas_shelf_x: u32,
    atlas_shelf_y: u32,
    atlas_shelf_height: u32,
    atlas_full_logged: bool,
    pending_atlas_uploads: Vec<PendingGlyphUpload>,
}

impl TextRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        font_path: &str,
    ) -> Result<Self, FontError> {
        let candidates = font_candidates(font_path);
        let path = first_existing(&candidates)
            .ok_or_else(|| FontError::NotFound(candidates.clone()))?
            .to_path_buf();
        let font_bytes = std::fs::read(&path).map_err(|source| FontError::Read {
            path: path.clone(),
            source,
        })?;
        let ft_lib = Library::init()?;
        let ft_face = ft_lib.new_memory_face(Rc::new(font_bytes), 0)?;
        log::info!("using font {}", path.display());

        let atlas_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let blank = vec![0u8; (ATLAS_SIZE * ATLAS_SIZE) as usize];
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &atlas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &blank,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(ATLAS_SIZE),
                rows_per_image: Some(ATLAS_SIZE),
            },
            wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
        );

        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let atlas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("text_uniforms"),
            size: std::mem::size_of::<TextUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let initial_capacity = 6000;
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("text_vertices"),
            size: (initial_capacity * std::mem::size_of::<TextVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&atlas_sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("text_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("text.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("text_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TextVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                        2 => Float32x4,
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            glyphs: GlyphCache::default(),
            ascenders: HashMap::new(),
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            vertex_capacity: initial_capacity,
            frame_vertices: Vec::new(),
            _ft_lib: ft_lib,
            ft_face,
            face_px: 0,
            atlas_texture,
            atlas_shelf_x: 0,
            atlas_shelf_y: 0,
            atlas_shelf_height: 0,
            atlas_full_logged: false,
            pending_atlas_uploads: Vec::new(),
        })
    }

    /// Start a new frame. Clears accumulated vertices and writes uniforms.
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, screen_w: u32, screen_h: u32) {
        self.frame_vertices.clear();
        let uniforms = TextUniforms {
            projection: ortho_projection(screen_w, screen_h),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Vertices queued so far this frame.
    pub fn vertex_count(&self) -> u32 {
        self.frame_vertices.len() as u32
    }

    fn set_pixel_size(&mut self, px: u32) -> bool {
        if self.face_px == px {
            return true;
        }
        match self.ft_face.set_pixel_sizes(0, px) {
            Ok(()) => {
                self.face_px = px;
                true
            }
            Err(e) => {
                log::warn!("cannot set font size {px}px: {e}");
                false
            }
        }
    }

    fn ascender(&mut self, px: u32) -> f32 {
        if let Some(a) = self.ascenders.get(&px) {
            return *a;
        }
        let ascender = if self.set_pixel_size(px) {
            self.ft_face
                .size_metrics()
                .map(|m| (m.ascender as f32 / 64.0).ceil())
                .unwrap_or(px as f32 * 0.8)
        } else {
            px as f32 * 0.8
        };
        self.ascenders.insert(px, ascender);
        ascender
    }

    fn glyph(&mut self, ch: char, px: u32) -> Option<GlyphInfo> {
        if let Some(cached) = self.glyphs.lookup(ch, px) {
            return cached;
        }
        let info = self.rasterize(ch, px);
        self.glyphs.record(ch, px, info);
        info
    }

    /// Rasterize a single glyph into the atlas.
    fn rasterize(&mut self, ch: char, px: u32) -> Option<GlyphInfo> {
        if !self.set_pixel_size(px) {
            return None;
        }
        let load_flags = LoadFlag::RENDER | LoadFlag::TARGET_LIGHT;
        if self.ft_face.load_char(ch as usize, load_flags).is_err() {
            return None;
        }

        let glyph_slot = self.ft_face.glyph();
        let bitmap = glyph_slot.bitmap();
        let w = bitmap.width().max(0) as u32;
        let h = bitmap.rows().max(0) as u32;
        let advance = glyph_slot.advance().x as f32 / 64.0;

        let mut info = GlyphInfo {
            width: 0,
            height: 0,
            bearing_x: glyph_slot.bitmap_left(),
            bearing_y: glyph_slot.bitmap_top(),
            advance,
            u0: 0.0,
            v0: 0.0,
            u1: 0.0,
            v1: 0.0,
        };

        if w > 0 && h > 0 {
            let padding: u32 = 1;
            if self.atlas_shelf_x + w + padding > ATLAS_SIZE {
                self.atlas_shelf_y += self.atlas_shelf_height + padding;
                self.atlas_shelf_x = 0;
                self.atlas_shelf_height = 0;
            }
            if self.atlas_shelf_y + h > ATLAS_SIZE {
                if !self.atlas_full_logged {
                    log::warn!("glyph atlas full, dropping new glyphs");
                    self.atlas_full_logged = true;
                }
                return None;
            }

            let pos_x = self.atlas_shelf_x;
            let pos_y = self.atlas_shelf_y;
            self.atlas_shelf_height = self.atlas_shelf_height.max(h);
            self.atlas_shelf_x += w + padding;

            let pitch = bitmap.pitch();
            let buf = bitmap.buffer();
            let abs_pitch = pitch.unsigned_abs() as usize;
            let mut pixels = Vec::with_capacity((w * h) as usize);
            for row in 0..h {
                let src_row = if pitch >= 0 {
                    row as usize
                } else {
                    (h - 1 - row) as usize
                };
                let start = src_row * abs_pitch;
                let end = start + w as usize;
                match buf.get(start..end) {
                    Some(slice) => pixels.extend_from_slice(slice),
                    None => return None,
                }
            }

            self.pending_atlas_uploads.push(PendingGlyphUpload {
                x: pos_x,
                y: pos_y,
                width: w,
                height: h,
                pixels,
            });

            let size = ATLAS_SIZE as f32;
            info.width = w;
            info.height = h;
            info.u0 = pos_x as f32 / size;
            info.v0 = pos_y as f32 / size;
            info.u1 = (pos_x + w) as f32 / size;
            info.v1 = (pos_y + h) as f32 / size;
        }

        Some(info)
    }

    /// Append vertices for one text run.
    pub fn prepare(&mut self, cmd: &TextCommand) {
        if cmd.text.is_empty() || cmd.color[3] <= 0.0 {
            return;
        }
        let px = cmd.font_size.round().max(1.0) as u32;
        let baseline = match cmd.anchor {
            TextAnchor::Top => cmd.y + self.ascender(px),
            TextAnchor::Baseline => cmd.y,
        };
        let mut pen_x = cmd.x.floor();
        let pen_y = baseline.floor();
        let color = cmd.color;

        for ch in cmd.text.chars() {
            let Some(glyph) = self.glyph(ch, px).or_else(|| self.glyph('?', px)) else {
                pen_x += px as f32 * 0.5;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let x0 = (pen_x + glyph.bearing_x as f32).floor();
                let y0 = (pen_y - glyph.bearing_y as f32).floor();
                let x1 = x0 + glyph.width as f32;
                let y1 = y0 + glyph.height as f32;

                let v = |x: f32, y: f32, u: f32, t: f32| TextVertex {
                    position: [x, y],
                    uv: [u, t],
                    color,
                };
                self.frame_vertices.push(v(x0, y0, glyph.u0, glyph.v0));
                self.frame_vertices.push(v(x1, y0, glyph.u1, glyph.v0));
                self.frame_vertices.push(v(x0, y1, glyph.u0, glyph.v1));

                self.frame_vertices.push(v(x1, y0, glyph.u1, glyph.v0));
                self.frame_vertices.push(v(x1, y1, glyph.u1, glyph.v1));
                self.frame_vertices.push(v(x0, y1, glyph.u0, glyph.v1));
            }
            pen_x += glyph.advance;
        }
    }

    /// Upload new glyphs and accumulated vertices to the GPU.
    pub fn flush(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        // Drain pending atlas uploads (sub-region writes for on-demand glyphs)
        for upload in self.pending_atlas_uploads.drain(..) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.atlas_texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: upload.x,
                        y: upload.y,
                        z: 0,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &upload.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(upload.width),
                    rows_per_image: Some(upload.height),
                },
                wgpu::Extent3d {
                    width: upload.width,
                    height: upload.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        if self.frame_vertices.is_empty() {
            return;
        }

        if self.frame_vertices.len() > self.vertex_capacity {
            self.vertex_capacity = self.frame_vertices.len().next_power_of_two();
            self.vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("text_vertices"),
                size: (self.vertex_capacity * std::mem::size_of::<TextVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }

        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&self.frame_vertices),
        );
    }

    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, vertices: Range<u32>) {
        if vertices.is_empty() {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(vertices, 0..1);
    }
}
