//! WebGPU render pipeline setup
//!
//! Every box and particle is an instance of one unit cube. Opaque instances
//! are drawn first with depth writes, translucent ones (debris, particles)
//! afterwards with blending and depth testing only.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use super::headless::SceneObjects;
use super::shapes::{box_instance, particle_instances, unit_cube};
use super::vertex::{BoxInstance, Vertex};
use super::{BoxDesc, FrameParams, MeshHandle, PointsHandle, Scene};
use crate::sim::ParticleStyle;
use crate::srgb_to_linear;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform block (must match shader.wgsl)
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4], // offset 0
    camera_pos: [f32; 4],     // offset 64
    light_dir: [f32; 4],      // offset 80
    fog_color: [f32; 4],      // offset 96
    fog_params: [f32; 4],     // offset 112 - near, far, unused, unused
}

impl From<&FrameParams> for Globals {
    fn from(frame: &FrameParams) -> Self {
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            camera_pos: frame.camera_pos.extend(1.0).to_array(),
            light_dir: frame.light_dir.extend(0.0).to_array(),
            fog_color: srgb_to_linear(frame.background).extend(1.0).to_array(),
            fog_params: [frame.fog_near, frame.fog_far, 0.0, 0.0],
        }
    }
}

/// Main render state
pub struct WgpuScene {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    opaque_pipeline: wgpu::RenderPipeline,
    blend_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    globals_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    cube_vertices: wgpu::Buffer,
    cube_indices: wgpu::Buffer,
    index_count: u32,
    objects: SceneObjects,
    frame: FrameParams,
    /// Viewport size in pixels
    pub size: (u32, u32),
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    translucent: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if translucent { "blend_pipeline" } else { "opaque_pipeline" }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc(), BoxInstance::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: if translucent {
                    Some(wgpu::BlendState::ALPHA_BLENDING)
                } else {
                    None
                },
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !translucent,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

impl WgpuScene {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("brickfall-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let frame = FrameParams::default();
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::from(&frame)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let opaque_pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, false);
        let blend_pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, true);

        let (vertices, indices) = unit_cube();
        let cube_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let depth_view = create_depth_view(&device, width, height);

        Self {
            surface,
            device,
            queue,
            config,
            opaque_pipeline,
            blend_pipeline,
            depth_view,
            globals_buffer,
            bind_group,
            cube_vertices,
            cube_indices,
            index_count: indices.len() as u32,
            objects: SceneObjects::default(),
            frame,
            size: (width, height),
        }
    }

    /// Opaque instances, then translucent ones sorted far to near
    fn build_instances(&self) -> (Vec<BoxInstance>, Vec<BoxInstance>) {
        let mut opaque = Vec::with_capacity(self.objects.boxes.len());
        let mut translucent: Vec<(f32, BoxInstance)> = Vec::new();
        let eye = self.frame.camera_pos;

        for desc in self.objects.boxes.iter() {
            if desc.is_transparent() {
                translucent.push((desc.position.distance_squared(eye), box_instance(desc)));
            } else {
                opaque.push(box_instance(desc));
            }
        }
        translucent.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut blended: Vec<BoxInstance> = translucent.into_iter().map(|(_, inst)| inst).collect();
        for cloud in self.objects.points.iter() {
            blended.extend(particle_instances(&cloud.style, &cloud.positions));
        }
        (opaque, blended)
    }

    /// Upload this frame's instances and draw
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals::from(&self.frame)),
        );

        let (opaque, blended) = self.build_instances();
        let make_buffer = |label: &str, instances: &[BoxInstance]| {
            (!instances.is_empty()).then(|| {
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(label),
                        contents: bytemuck::cast_slice(instances),
                        usage: wgpu::BufferUsages::VERTEX,
                    })
            })
        };
        let opaque_buffer = make_buffer("opaque_instances", &opaque);
        let blended_buffer = make_buffer("blended_instances", &blended);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let bg: Vec3 = srgb_to_linear(self.frame.background);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.x as f64,
                            g: bg.y as f64,
                            b: bg.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.cube_vertices.slice(..));
            render_pass.set_index_buffer(self.cube_indices.slice(..), wgpu::IndexFormat::Uint16);

            if let Some(buffer) = &opaque_buffer {
                render_pass.set_pipeline(&self.opaque_pipeline);
                render_pass.set_vertex_buffer(1, buffer.slice(..));
                render_pass.draw_indexed(0..self.index_count, 0, 0..opaque.len() as u32);
            }
            if let Some(buffer) = &blended_buffer {
                render_pass.set_pipeline(&self.blend_pipeline);
                render_pass.set_vertex_buffer(1, buffer.slice(..));
                render_pass.draw_indexed(0..self.index_count, 0, 0..blended.len() as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Scene for WgpuScene {
    fn add_box(&mut self, desc: &BoxDesc) -> MeshHandle {
        self.objects.add_box(desc)
    }

    fn update_box(&mut self, handle: &MeshHandle, desc: &BoxDesc) {
        self.objects.update_box(handle, desc);
    }

    fn remove_box(&mut self, handle: MeshHandle) {
        self.objects.remove_box(handle);
    }

    fn add_points(&mut self, style: ParticleStyle, positions: &[Vec3]) -> PointsHandle {
        self.objects.add_points(style, positions)
    }

    fn update_points(&mut self, handle: &PointsHandle, positions: &[Vec3]) {
        self.objects.update_points(handle, positions);
    }

    fn remove_points(&mut self, handle: PointsHandle) {
        self.objects.remove_points(handle);
    }

    fn set_frame(&mut self, frame: &FrameParams) {
        self.frame = *frame;
    }

    fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height);
        }
    }
}
