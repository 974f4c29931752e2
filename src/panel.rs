use std::ops::Range;

use crate::ui::PanelCommand;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PanelVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub size_px: [f32; 2],
    pub bg_color: [f32; 4],
    pub border_color: [f32; 4],
    pub border_width: f32,
    pub shadow_width: f32,
    pub corner_radius: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PanelUniforms {
    pub projection: [[f32; 4]; 4],
}

/// Rounded rectangles, discs and grid lines. One draw call per layer:
/// callers bracket each layer with `vertex_count()` to get its range.
pub struct PanelRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    frame_vertices: Vec<PanelVertex>,
}

/// Top-left origin, y down, in physical pixels.
pub fn ortho_projection(screen_w: u32, screen_h: u32) -> [[f32; 4]; 4] {
    let sw = screen_w.max(1) as f32;
    let sh = screen_h.max(1) as f32;

    #[rustfmt::skip]
    let projection: [[f32; 4]; 4] = [
        [2.0 / sw,  0.0,        0.0, 0.0],
        [0.0,      -2.0 / sh,   0.0, 0.0],
        [0.0,       0.0,        1.0, 0.0],
        [-1.0,      1.0,        0.0, 1.0],
    ];
    projection
}

impl PanelRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panel_uniforms"),
            size: std::mem::size_of::<PanelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Grid lines dominate: ~100 lines plus markers at the default zoom.
        let initial_capacity = 6 * 512;
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panel_vertices"),
            size: (initial_capacity * std::mem::size_of::<PanelVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("panel_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panel_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("panel_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("panel.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("panel_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("panel_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PanelVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2, // position
                        1 => Float32x2, // uv
                        2 => Float32x2, // size_px
                        3 => Float32x4, // bg_color
                        4 => Float32x4, // border_color
                        5 => Float32,   // border_width
                        6 => Float32,   // shadow_width
                        7 => Float32,   // corner_radius
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

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            vertex_capacity: initial_capacity,
            frame_vertices: Vec::new(),
        }
    }

    /// Clear vertices and write the ortho projection uniform.
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, screen_w: u32, screen_h: u32) {
        self.frame_vertices.clear();
        let uniforms = PanelUniforms {
            projection: ortho_projection(screen_w, screen_h),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Vertices queued so far this frame.
    pub fn vertex_count(&self) -> u32 {
        self.frame_vertices.len() as u32
    }

    /// Push a panel quad (6 vertices). The quad grows by the shadow width so
    /// the shadow has room outside the panel body.
    pub fn add_command(&mut self, cmd: &PanelCommand) {
        if cmd.width <= 0.0 || cmd.height <= 0.0 {
            return;
        }
        let grow = cmd.shadow_width.max(0.0);
        let x0 = cmd.x - grow;
        let y0 = cmd.y - grow;
        let x1 = cmd.x + cmd.width + grow;
        let y1 = cmd.y + cmd.height + grow;
        let size_px = [x1 - x0, y1 - y0];
        let corner_radius = cmd.corner_radius.min(cmd.width.min(cmd.height) / 2.0).max(0.0);

        let make = |px: f32, py: f32, u: f32, v: f32| PanelVertex {
            position: [px, py],
            uv: [u, v],
            size_px,
            bg_color: cmd.bg_color,
            border_color: cmd.border_color,
            border_width: cmd.border_width,
            shadow_width: grow,
            corner_radius,
            _pad: 0.0,
        };

        self.frame_vertices.push(make(x0, y0, 0.0, 0.0));
        self.frame_vertices.push(make(x1, y0, 1.0, 0.0));
        self.frame_vertices.push(make(x0, y1, 0.0, 1.0));

        self.frame_vertices.push(make(x1, y0, 1.0, 0.0));
        self.frame_vertices.push(make(x1, y1, 1.0, 1.0));
        self.frame_vertices.push(make(x0, y1, 0.0, 1.0));
    }

    /// Upload vertices to GPU.
    pub fn flush(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        if self.frame_vertices.is_empty() {
            return;
        }

        if self.frame_vertices.len() > self.vertex_capacity {
            self.vertex_capacity = self.frame_vertices.len().next_power_of_two();
            self.vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("panel_vertices"),
                size: (self.vertex_capacity * std::mem::size_of::<PanelVertex>()) as u64,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_shader_offsets() {
        assert_eq!(std::mem::size_of::<PanelVertex>(), 72);
        assert_eq!(std::mem::size_of::<PanelUniforms>(), 64);
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let p = ortho_projection(800, 600);
        // x' = x * 2/w - 1, y' = -y * 2/h + 1
        let clip = |x: f32, y: f32| (x * p[0][0] + p[3][0], y * p[1][1] + p[3][1]);
        assert_eq!(clip(0.0, 0.0), (-1.0, 1.0));
        assert_eq!(clip(800.0, 600.0), (1.0, -1.0));
    }
}
