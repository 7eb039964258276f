use std::sync::Arc;
use winit::window::Window;
use instant::Instant;
use wgpu::util::DeviceExt;

use crate::canvas::DrawList;
use crate::color::BACKGROUND;
use crate::models::{Batch, CircleInstance, FillVertex, FrameGeometry, Vertex2D};
use crate::viewport::{Viewport, ViewportUniform};

const FILL_WGSL: &str = include_str!("./shaders/fill.wgsl");
const CIRCLES_WGSL: &str = include_str!("./shaders/circles.wgsl");

// Initial capacities; buffers grow on demand.
const INITIAL_CIRCLE_CAPACITY: usize = 512;
const INITIAL_FILL_CAPACITY: usize = 16 * 1024;

pub struct State {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub is_surface_configured: bool,
    pub needs_srgb_output_conversion: bool,

    pub viewport: Viewport,
    pub viewport_buffer: wgpu::Buffer,
    pub viewport_bind_group: wgpu::BindGroup,
    pub viewport_needs_update: bool,

    pub fill_render_pipeline: wgpu::RenderPipeline,
    pub circle_render_pipeline: wgpu::RenderPipeline,

    pub quad_vertex_buffer: wgpu::Buffer,
    pub quad_index_buffer: wgpu::Buffer,
    pub circle_instance_buffer: wgpu::Buffer,
    pub fill_vertex_buffer: wgpu::Buffer,

    /// What the driver painted this frame.
    pub draw_list: DrawList,
    pub geometry: FrameGeometry,

    pub last_frame_instant: Instant,
    pub frame_count_in_second: u32,
    pub current_fps: u32,
}

impl State {
    // Takes Arc<Window> for setup, doesn't store it.
    pub async fn new(window_arc: Arc<Window>) -> anyhow::Result<State> {
        let size = window_arc.inner_size();
        let scale_factor = window_arc.scale_factor();

        let gpu = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        // Surface itself is !Send on WASM due to HtmlCanvasElement
        let surface = gpu.create_surface(window_arc)?;

        let adapter = gpu
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            anyhow::bail!("surface reports no supported texture formats");
        };
        let texture_format = surface_caps.formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or_else(|| {
                log::warn!("No sRGB surface format found, falling back to {:?}", first_format);
                first_format
            });

        // Shaders convert to sRGB themselves when the surface won't.
        let needs_srgb_output_conversion = !texture_format.is_srgb();

        log::info!(
            "Using {} ({:?}, Target Format: {:?}), Needs Shader sRGB Output Conversion: {}",
            adapter_info.name,
            adapter_info.backend,
            texture_format,
            needs_srgb_output_conversion
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: texture_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let viewport = Viewport::new(size.width, size.height, scale_factor);
        let viewport_uniform: ViewportUniform = viewport.uniform(needs_srgb_output_conversion);

        let viewport_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Viewport Buffer"),
                contents: bytemuck::cast_slice(&[viewport_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }
        );

        let viewport_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }
            ],
            label: Some("Viewport Bind Group Layout"),
        });

        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &viewport_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport_buffer.as_entire_binding(),
                }
            ],
            label: Some("Viewport Bind Group"),
        });

        // --- Shader modules ---
        let fill_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fill Shader"),
            source: wgpu::ShaderSource::Wgsl(FILL_WGSL.into()),
        });

        let circles_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Circles Shader"),
            source: wgpu::ShaderSource::Wgsl(CIRCLES_WGSL.into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[
                &viewport_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let fill_render_pipeline = create_pipeline(
            &device,
            &render_pipeline_layout,
            &fill_shader_module,
            &[FillVertex::layout()],
            texture_format,
            "Fill Render Pipeline",
        );

        let circle_render_pipeline = create_pipeline(
            &device,
            &render_pipeline_layout,
            &circles_shader_module,
            &[Vertex2D::layout(), CircleInstance::layout()],
            texture_format,
            "Circle Render Pipeline",
        );

        let quad_vertex_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_VERTICES.as_slice()),
                usage: wgpu::BufferUsages::VERTEX,
            }
        );

        let quad_index_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Index Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_INDICES.as_slice()),
                usage: wgpu::BufferUsages::INDEX,
            }
        );

        let circle_instance_buffer = create_vertex_buffer::<CircleInstance>(&device, INITIAL_CIRCLE_CAPACITY, "Circle Instance Buffer");
        let fill_vertex_buffer = create_vertex_buffer::<FillVertex>(&device, INITIAL_FILL_CAPACITY, "Fill Vertex Buffer");

        let mut state = Self {
            surface, device, queue, config, is_surface_configured: false, needs_srgb_output_conversion,
            viewport, viewport_buffer, viewport_bind_group, viewport_needs_update: false,
            fill_render_pipeline, circle_render_pipeline,
            quad_vertex_buffer, quad_index_buffer, circle_instance_buffer, fill_vertex_buffer,
            draw_list: DrawList::new(),
            geometry: FrameGeometry::default(),
            last_frame_instant: Instant::now(), frame_count_in_second: 0, current_fps: 0,
        };
        state.resize(size.width, size.height, scale_factor);
        Ok(state)
    }

    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        if width > 0 && height > 0 {
            log::info!("Resize {}, {} (scale {})", width, height, scale_factor);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);

            self.viewport.update(width, height, scale_factor);
            self.viewport_needs_update = true;
            self.is_surface_configured = true;
        }
    }

    /// Reconfigures the surface with its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Turns the recorded draw list into GPU buffers.
    pub fn update(&mut self) {
        if self.viewport_needs_update {
            let uniform = self.viewport.uniform(self.needs_srgb_output_conversion);
            self.queue.write_buffer(&self.viewport_buffer, 0, bytemuck::cast_slice(&[uniform]));
            self.viewport_needs_update = false;
        }

        self.geometry = FrameGeometry::from_draw_list(&self.draw_list);

        let circle_data: &[u8] = bytemuck::cast_slice(&self.geometry.circles);
        if self.circle_instance_buffer.size() < circle_data.len() as u64 {
            let capacity = self.geometry.circles.len().next_power_of_two();
            self.circle_instance_buffer = create_vertex_buffer::<CircleInstance>(&self.device, capacity, "Circle Instance Buffer (Resized)");
        }
        if !circle_data.is_empty() {
            self.queue.write_buffer(&self.circle_instance_buffer, 0, circle_data);
        }

        let fill_data: &[u8] = bytemuck::cast_slice(&self.geometry.fill_vertices);
        if self.fill_vertex_buffer.size() < fill_data.len() as u64 {
            let capacity = self.geometry.fill_vertices.len().next_power_of_two();
            self.fill_vertex_buffer = create_vertex_buffer::<FillVertex>(&self.device, capacity, "Fill Vertex Buffer (Resized)");
        }
        if !fill_data.is_empty() {
            self.queue.write_buffer(&self.fill_vertex_buffer, 0, fill_data);
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        // --- FPS Calculation ---
        self.frame_count_in_second += 1;
        let now = Instant::now();
        let elapsed = (now - self.last_frame_instant).as_secs_f32();

        if elapsed >= 1.0 {
            self.current_fps = self.frame_count_in_second;
            self.frame_count_in_second = 0;
            self.last_frame_instant = now;
            log::debug!("FPS: {}", self.current_fps);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND.into_linear_wgpu_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.viewport_bind_group, &[]);

            for batch in &self.geometry.batches {
                match batch {
                    Batch::Fill(range) => {
                        render_pass.set_pipeline(&self.fill_render_pipeline);
                        render_pass.set_vertex_buffer(0, self.fill_vertex_buffer.slice(..));
                        render_pass.draw(range.clone(), 0..1);
                    }
                    Batch::Circles(range) => {
                        render_pass.set_pipeline(&self.circle_render_pipeline);
                        render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                        render_pass.set_vertex_buffer(1, self.circle_instance_buffer.slice(..));
                        render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                        render_pass.draw_indexed(0..Vertex2D::QUAD_INDICES.len() as u32, 0, range.clone());
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_vertex_buffer<T>(device: &wgpu::Device, capacity: usize, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity.max(1) * std::mem::size_of::<T>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
