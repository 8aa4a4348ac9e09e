//! wgpu renderer for the particle tree.
//!
//! Everything is drawn as instanced camera-facing sprites from one unit quad:
//! snow first, then the tree particles, then ornaments, trunk and star. The
//! tree group and the snow field each get their own uniform block so they can
//! rotate independently.

pub mod instances;

pub use instances::{
    object_instances, particle_instances, shape_params, snow_instances, PointInstance, ShapeParams,
    SpriteShape,
};

use glam::Mat4;
use tree_core::{Camera, DisplacementMode, FrameUniforms, RenderCollaborator, Scene, BACKGROUND_RGB};
use wgpu::util::DeviceExt;

pub const POINTS_WGSL: &str = include_str!("../shaders/points.wgsl");

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    time: f32,
    displace: f32,
    calm: f32,
    explosion_scale: f32,
    star_params: [f32; 4],
    solid_params: [f32; 4],
}

/// A vertex buffer sized for a fixed instance count.
struct InstanceBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &str, data: &[PointInstance]) -> Self {
        // Keep at least one element so the buffer is never zero-sized.
        let fallback = [<PointInstance as bytemuck::Zeroable>::zeroed()];
        let contents = if data.is_empty() { &fallback[..] } else { data };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            count: data.len() as u32,
        }
    }

    fn write(&self, queue: &wgpu::Queue, data: &[PointInstance]) {
        let n = data.len().min(self.count as usize);
        if n > 0 {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&data[..n]));
        }
    }
}

struct UniformBlock {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBlock {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

pub struct TreeRenderer<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    quad_vb: wgpu::Buffer,
    tree_uniforms: UniformBlock,
    snow_uniforms: UniformBlock,
    particles: InstanceBuffer,
    objects: InstanceBuffer,
    snow: InstanceBuffer,
    scratch: Vec<PointInstance>,
    uploaded_progress: f32,
    shape_params: ShapeParams,
    camera: Camera,
    clear_color: wgpu::Color,
    width: u32,
    height: u32,
    fatal: bool,
}

impl<'w> TreeRenderer<'w> {
    /// Set up the device, pipeline and static buffers for `scene` on an
    /// already created surface (window on native, canvas on web).
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'w>,
        width: u32,
        height: u32,
        scene: &Scene,
    ) -> anyhow::Result<Self> {
        let width = width.max(1);
        let height = height.max(1);
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!("request_device error: {e:?}"))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("points_shader"),
            source: wgpu::ShaderSource::Wgsl(POINTS_WGSL.into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bgl"),
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
        let tree_uniforms = UniformBlock::new(&device, &bind_group_layout, "tree_globals");
        let snow_uniforms = UniformBlock::new(&device, &bind_group_layout, "snow_globals");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("points_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let quad_vertices: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vertex_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: per-sprite data
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![
                    1 => Float32x3,
                    2 => Float32,
                    3 => Float32x3,
                    4 => Float32,
                    5 => Float32x3,
                    6 => Float32,
                    7 => Float32x2,
                ],
            },
        ];
        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("points_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        let mut scratch = Vec::new();
        particle_instances(scene.buffers(), false, &mut scratch);
        let particles = InstanceBuffer::new(&device, "particle_vb", &scratch);
        object_instances(scene.objects(), scene.star(), scene.trunk(), &mut scratch);
        let objects = InstanceBuffer::new(&device, "object_vb", &scratch);
        snow_instances(scene.snow(), &mut scratch);
        let snow = InstanceBuffer::new(&device, "snow_vb", &scratch);

        let mut camera = Camera::default();
        camera.set_viewport(width, height);
        let [r, g, b] = BACKGROUND_RGB;

        log::info!(
            "[render] {}x{} {:?}, {} particles, {} objects, {} snow",
            width,
            height,
            format,
            particles.count,
            objects.count,
            snow.count
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            quad_vb,
            tree_uniforms,
            snow_uniforms,
            particles,
            objects,
            snow,
            scratch,
            uploaded_progress: 0.0,
            shape_params: shape_params(scene.star(), scene.trunk()),
            camera,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            width,
            height,
            fatal: false,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Set after an unrecoverable surface error; the host should shut down.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Reconfigure the surface and camera aspect. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.camera.set_viewport(width, height);
    }

    fn globals(&self, model: Mat4, frame: &FrameUniforms, displace: f32, calm: f32) -> Globals {
        Globals {
            view: self.camera.view_matrix().to_cols_array_2d(),
            proj: self.camera.projection_matrix().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            time: frame.sway_phase,
            displace,
            calm,
            explosion_scale: frame.explosion_scale,
            star_params: self.shape_params.star,
            solid_params: self.shape_params.solids,
        }
    }

    fn upload(&mut self, scene: &Scene, frame: &FrameUniforms) {
        // The CPU path displaces positions in the scene; mirror them only
        // when the progress has moved.
        if scene.displacement_mode() == DisplacementMode::Cpu && frame.explosion != self.uploaded_progress {
            particle_instances(scene.buffers(), true, &mut self.scratch);
            self.particles.write(&self.queue, &self.scratch);
            self.uploaded_progress = frame.explosion;
        }
        object_instances(scene.objects(), scene.star(), scene.trunk(), &mut self.scratch);
        self.objects.write(&self.queue, &self.scratch);

        let calm = 1.0 - frame.explosion;
        let tree = self.globals(
            Mat4::from_rotation_y(frame.sculpture_yaw),
            frame,
            frame.shader_displacement,
            calm,
        );
        let snow = self.globals(Mat4::from_rotation_y(frame.snow_yaw), frame, 0.0, 0.0);
        self.queue
            .write_buffer(&self.tree_uniforms.buffer, 0, bytemuck::bytes_of(&tree));
        self.queue
            .write_buffer(&self.snow_uniforms.buffer, 0, bytemuck::bytes_of(&snow));
    }

    pub fn render_frame(&mut self, scene: &Scene, frame: &FrameUniforms) -> Result<(), wgpu::SurfaceError> {
        self.upload(scene, frame);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("points_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_vertex_buffer(0, self.quad_vb.slice(..));

            let draws = [
                (&self.snow_uniforms, &self.snow),
                (&self.tree_uniforms, &self.particles),
                (&self.tree_uniforms, &self.objects),
            ];
            for (uniforms, instances) in draws {
                if instances.count == 0 {
                    continue;
                }
                rpass.set_bind_group(0, &uniforms.bind_group, &[]);
                rpass.set_vertex_buffer(1, instances.buffer.slice(..));
                rpass.draw(0..6, 0..instances.count);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl RenderCollaborator for TreeRenderer<'_> {
    fn advance_camera(&mut self) {
        self.camera.update();
    }

    fn render(&mut self, scene: &Scene, frame: &FrameUniforms) {
        match self.render_frame(scene, frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("[render] out of GPU memory");
                self.fatal = true;
            }
            Err(e) => log::warn!("[render] frame skipped: {e:?}"),
        }
    }
}
