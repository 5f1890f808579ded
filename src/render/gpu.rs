//! wgpu implementation of [`RenderBackend`].

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::backend::{FullscreenInputs, OutputSettings, RenderBackend, Rgba};
use super::program::{self, Program, ProgramDesc, ProgramId, FRAGMENT_ENTRY};
use super::target::{Destination, FilterMode, PixelFormat, TargetDesc, TargetId, WrapMode};
use crate::camera::CameraMatrices;
use crate::core::GpuContext;
use crate::error::{PipelineError, Result};
use crate::scene::Scene;
use crate::types::{unit_cube, InstanceData, Vertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4
];

/// Colour attachment description a pipeline must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AttachmentKey {
    format: wgpu::TextureFormat,
    samples: u32,
}

struct GpuTarget {
    desc: TargetDesc,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    /// Single-sample copy of a multisampled target
    resolve: Option<(wgpu::Texture, wgpu::TextureView)>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl GpuTarget {
    fn allocate(device: &wgpu::Device, desc: &TargetDesc) -> Self {
        let format = texture_format(desc.format);
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let sampled = desc.samples == 1;

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label.as_str()),
            size,
            mip_level_count: 1,
            sample_count: desc.samples,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: if sampled {
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
            } else {
                wgpu::TextureUsages::RENDER_ATTACHMENT
            },
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let resolve = (!sampled).then(|| {
            let resolve_label = format!("{} (resolve)", desc.label);
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(resolve_label.as_str()),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });

        let depth = desc
            .depth
            .then(|| depth_texture(device, &desc.label, size, desc.samples));

        Self {
            desc: desc.clone(),
            color,
            color_view,
            resolve,
            depth,
        }
    }

    fn sampled_view(&self) -> &wgpu::TextureView {
        match &self.resolve {
            Some((_, view)) => view,
            None => &self.color_view,
        }
    }

    fn attachment(&self) -> AttachmentKey {
        AttachmentKey {
            format: texture_format(self.desc.format),
            samples: self.desc.samples,
        }
    }
}

struct LinkedProgram {
    module: wgpu::ShaderModule,
    version: u64,
    pipelines: HashMap<AttachmentKey, wgpu::RenderPipeline>,
}

struct ScenePipeline {
    bind_group_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    module: wgpu::ShaderModule,
    pipelines: HashMap<AttachmentKey, wgpu::RenderPipeline>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

pub struct GpuBackend {
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    screen_depth: (wgpu::Texture, wgpu::TextureView),
    targets: HashMap<TargetId, GpuTarget>,
    next_target: u32,
    programs: HashMap<ProgramId, LinkedProgram>,
    next_program: u32,
    fullscreen_bind_group_layout: wgpu::BindGroupLayout,
    fullscreen_layout: wgpu::PipelineLayout,
    samplers: HashMap<(FilterMode, WrapMode), wgpu::Sampler>,
    fallback_view: wgpu::TextureView,
    scene: ScenePipeline,
    destination: Destination,
    clear_color: Rgba,
    auto_clear: bool,
    output: OutputSettings,
    frame: Option<ActiveFrame>,
}

impl GpuBackend {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| PipelineError::Surface(e.to_string()))?;
        let (gpu, adapter) = GpuContext::for_surface(&instance, &surface).await?;

        let config = surface_config(&surface, &adapter, size.width, size.height)?;
        surface.configure(gpu.device(), &config);

        let device = gpu.device();
        let screen_depth = depth_texture(device, "screen", extent(config.width, config.height), 1);
        let fullscreen_bind_group_layout = fullscreen_bind_group_layout(device);
        let fullscreen_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fullscreen Pipeline Layout"),
            bind_group_layouts: &[&fullscreen_bind_group_layout],
            push_constant_ranges: &[],
        });
        let fallback_view = fallback_texture(&gpu);
        let scene = ScenePipeline::new(device);

        log::info!(
            "GPU backend ready: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            gpu,
            surface,
            config,
            screen_depth,
            targets: HashMap::new(),
            next_target: 1,
            programs: HashMap::new(),
            next_program: 1,
            fullscreen_bind_group_layout,
            fullscreen_layout,
            samplers: HashMap::new(),
            fallback_view,
            scene,
            destination: Destination::Screen,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            auto_clear: true,
            output: OutputSettings::default(),
            frame: None,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn attachment(&self) -> Result<(AttachmentKey, bool)> {
        match self.destination {
            Destination::Screen => Ok((
                AttachmentKey {
                    format: self.config.format,
                    samples: 1,
                },
                true,
            )),
            Destination::Target(id) => {
                let target = self.targets.get(&id).ok_or(PipelineError::UnknownTarget(id))?;
                Ok((target.attachment(), target.depth.is_some()))
            }
        }
    }

    /// Sampler settings follow the sampled target's description
    fn sampler_key(&self, id: Option<TargetId>) -> (FilterMode, WrapMode) {
        id.and_then(|id| self.targets.get(&id))
            .map(|t| (t.desc.filter, t.desc.wrap))
            .unwrap_or_default()
    }

    /// Recompile the module if the program's defines changed since last link
    fn link(&mut self, program: &mut Program) -> Result<()> {
        let stale = match self.programs.get(&program.id()) {
            Some(linked) => program.needs_update() || linked.version != program.version(),
            None => true,
        };
        if !stale {
            return Ok(());
        }

        let source = program::compile(program.desc())?;
        let module = self.gpu.device().create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        log::debug!("Linked program '{}' v{}", program.label(), program.version());
        self.programs.insert(
            program.id(),
            LinkedProgram {
                module,
                version: program.version(),
                pipelines: HashMap::new(),
            },
        );
        program.mark_linked();
        Ok(())
    }

    fn reacquire_surface(&mut self) -> Result<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost; reconfiguring");
                self.surface.configure(self.gpu.device(), &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| PipelineError::Surface(e.to_string()))
            }
            Err(e) => Err(PipelineError::Surface(e.to_string())),
        }
    }
}

impl RenderBackend for GpuBackend {
    fn begin_frame(&mut self) -> Result<()> {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice; dropping previous frame");
            self.frame = None;
        }
        let surface_texture = self.reacquire_surface()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.frame = Some(ActiveFrame {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self.frame.take().ok_or(PipelineError::NoActiveFrame)?;
        self.gpu.queue().submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize_screen(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(self.gpu.device(), &self.config);
        self.screen_depth = depth_texture(
            self.gpu.device(),
            "screen",
            extent(self.config.width, self.config.height),
            1,
        );
    }

    fn create_target(&mut self, desc: &TargetDesc) -> TargetId {
        let id = TargetId::new(self.next_target);
        self.next_target += 1;
        self.targets
            .insert(id, GpuTarget::allocate(self.gpu.device(), desc));
        log::debug!("Created target '{}' {}x{}", desc.label, desc.width, desc.height);
        id
    }

    fn resize_target(&mut self, id: TargetId, width: u32, height: u32) -> Result<()> {
        let target = self.targets.get_mut(&id).ok_or(PipelineError::UnknownTarget(id))?;
        let desc = target.desc.resized(width, height);
        *target = GpuTarget::allocate(self.gpu.device(), &desc);
        Ok(())
    }

    fn dispose_target(&mut self, id: TargetId) {
        if let Some(target) = self.targets.remove(&id) {
            target.color.destroy();
            if let Some((texture, _)) = target.resolve {
                texture.destroy();
            }
            if let Some((texture, _)) = target.depth {
                texture.destroy();
            }
        }
    }

    fn target_size(&self, id: TargetId) -> Option<(u32, u32)> {
        self.targets.get(&id).map(|t| t.desc.size())
    }

    fn set_render_target(&mut self, destination: Destination) {
        self.destination = destination;
    }

    fn render_target(&self) -> Destination {
        self.destination
    }

    fn clear_color(&self) -> Rgba {
        self.clear_color
    }

    fn set_clear_color(&mut self, color: Rgba) {
        self.clear_color = color;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn output_settings(&self) -> OutputSettings {
        self.output
    }

    fn set_output_settings(&mut self, settings: OutputSettings) {
        self.output = settings;
    }

    fn create_program(&mut self, desc: ProgramDesc) -> Result<Program> {
        let id = ProgramId::new(self.next_program);
        self.next_program += 1;
        let mut program = Program::new(id, desc);
        self.link(&mut program)?;
        Ok(program)
    }

    fn dispose_program(&mut self, program: &Program) {
        self.programs.remove(&program.id());
    }

    fn render_scene(&mut self, scene: &dyn Scene, camera: &CameraMatrices) -> Result<()> {
        if self.frame.is_none() {
            return Err(PipelineError::NoActiveFrame);
        }
        let (key, has_depth) = self.attachment()?;
        if !has_depth {
            return Err(PipelineError::InvalidConfig {
                pass: scene.name().to_string(),
                reason: "scene destination has no depth buffer".to_string(),
            });
        }

        let device = self.gpu.device();
        let scene_pipeline = &mut self.scene;
        if !scene_pipeline.pipelines.contains_key(&key) {
            let pipeline = scene_pipeline.build(device, key);
            scene_pipeline.pipelines.insert(key, pipeline);
        }

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &self.scene.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let instances: Vec<InstanceData> = scene.objects().iter().map(InstanceData::from).collect();
        let instance_buffer = (!instances.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let color_load = color_load(self.auto_clear, self.clear_color);
        let depth_load = if self.auto_clear {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        let frame = self.frame.as_mut().ok_or(PipelineError::NoActiveFrame)?;
        let (view, resolve, depth_view) = match self.destination {
            Destination::Screen => (&frame.view, None, &self.screen_depth.1),
            Destination::Target(id) => {
                let target = self.targets.get(&id).ok_or(PipelineError::UnknownTarget(id))?;
                let depth = target.depth.as_ref().map(|(_, v)| v).ok_or_else(|| {
                    PipelineError::InvalidConfig {
                        pass: scene.name().to_string(),
                        reason: "scene destination has no depth buffer".to_string(),
                    }
                })?;
                (&target.color_view, target.resolve.as_ref().map(|(_, v)| v), depth)
            }
        };

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(scene.name()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: resolve,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if let (Some(instance_buffer), Some(pipeline)) =
            (instance_buffer.as_ref(), self.scene.pipelines.get(&key))
        {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, self.scene.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, instance_buffer.slice(..));
            pass.set_index_buffer(self.scene.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.scene.index_count, 0, 0..instances.len() as u32);
        }
        Ok(())
    }

    fn draw_fullscreen(&mut self, program: &mut Program, inputs: &FullscreenInputs) -> Result<()> {
        if self.frame.is_none() {
            return Err(PipelineError::NoActiveFrame);
        }
        if let Destination::Target(id) = self.destination {
            if inputs.input == Some(id) || inputs.aux == Some(id) {
                return Err(PipelineError::InvalidConfig {
                    pass: program.label().to_string(),
                    reason: "destination is also bound as an input".to_string(),
                });
            }
        }
        let (key, _) = self.attachment()?;
        self.link(program)?;
        let input_key = self.sampler_key(inputs.input);
        let aux_key = self.sampler_key(inputs.aux);
        for (filter, wrap) in [input_key, aux_key] {
            if !self.samplers.contains_key(&(filter, wrap)) {
                let sampler = create_sampler(self.gpu.device(), filter, wrap);
                self.samplers.insert((filter, wrap), sampler);
            }
        }

        let device = self.gpu.device();
        let linked = self
            .programs
            .get_mut(&program.id())
            .ok_or_else(|| PipelineError::ShaderCompile {
                label: program.label().to_string(),
                message: "program was disposed".to_string(),
            })?;
        if !linked.pipelines.contains_key(&key) {
            let pipeline = fullscreen_pipeline(
                device,
                &self.fullscreen_layout,
                &linked.module,
                program.label(),
                key,
            );
            linked.pipelines.insert(key, pipeline);
        }

        let input_view = sampled_view(&self.targets, &self.fallback_view, inputs.input)?;
        let aux_view = sampled_view(&self.targets, &self.fallback_view, inputs.aux)?;
        let input_sampler = &self.samplers[&input_key];
        let aux_sampler = &self.samplers[&aux_key];

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Pass Uniforms"),
            contents: bytemuck::cast_slice(&[inputs.uniforms]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.label()),
            layout: &self.fullscreen_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(input_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(aux_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(aux_sampler),
                },
            ],
        });

        let load = color_load(self.auto_clear, self.clear_color);
        let pipeline = self
            .programs
            .get(&program.id())
            .and_then(|linked| linked.pipelines.get(&key))
            .ok_or_else(|| PipelineError::Device("pipeline cache miss".to_string()))?;
        let frame = self.frame.as_mut().ok_or(PipelineError::NoActiveFrame)?;
        let (view, resolve) = match self.destination {
            Destination::Screen => (&frame.view, None),
            Destination::Target(id) => {
                let target = self.targets.get(&id).ok_or(PipelineError::UnknownTarget(id))?;
                (&target.color_view, target.resolve.as_ref().map(|(_, v)| v))
            }
        };

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(program.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: resolve,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(())
    }
}

impl ScenePipeline {
    fn new(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("scene_bind_group_layout"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let (vertices, indices) = unit_cube();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            bind_group_layout,
            layout,
            module,
            pipelines: HashMap::new(),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn build(&self, device: &wgpu::Device, key: AttachmentKey) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: key.samples,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }
}

/// View bound for an optional input; `None` falls back to a 1x1 black texture
fn sampled_view<'a>(
    targets: &'a HashMap<TargetId, GpuTarget>,
    fallback: &'a wgpu::TextureView,
    id: Option<TargetId>,
) -> Result<&'a wgpu::TextureView> {
    match id {
        Some(id) => targets
            .get(&id)
            .map(GpuTarget::sampled_view)
            .ok_or(PipelineError::UnknownTarget(id)),
        None => Ok(fallback),
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    label: &str,
    key: AttachmentKey,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: key.samples,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn fullscreen_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
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
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            texture(2),
            texture(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("fullscreen_bind_group_layout"),
    })
}

fn surface_config(
    surface: &wgpu::Surface,
    adapter: &wgpu::Adapter,
    width: u32,
    height: u32,
) -> Result<wgpu::SurfaceConfiguration> {
    let caps = surface.get_capabilities(adapter);
    // The output pass encodes sRGB itself, so prefer a linear-storage format.
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| PipelineError::Surface("surface reports no formats".to_string()))?;

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}

fn depth_texture(
    device: &wgpu::Device,
    label: &str,
    size: wgpu::Extent3d,
    samples: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let label = format!("{} (depth)", label);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label.as_str()),
        size,
        mip_level_count: 1,
        sample_count: samples,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn fallback_texture(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device().create_texture_with_data(
        gpu.queue(),
        &wgpu::TextureDescriptor {
            label: Some("Fallback Texture"),
            size: extent(1, 1),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &[0, 0, 0, 255],
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_sampler(device: &wgpu::Device, filter: FilterMode, wrap: WrapMode) -> wgpu::Sampler {
    let filter = match filter {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    };
    let address = match wrap {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn color_load(auto_clear: bool, color: Rgba) -> wgpu::LoadOp<wgpu::Color> {
    if auto_clear {
        wgpu::LoadOp::Clear(wgpu::Color {
            r: color[0] as f64,
            g: color[1] as f64,
            b: color[2] as f64,
            a: color[3] as f64,
        })
    } else {
        wgpu::LoadOp::Load
    }
}

fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}
