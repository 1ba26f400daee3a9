//! wgpu backend: skins become sampled textures, display lists are baked into
//! one vertex buffer and one pipeline each and replayed batch by batch.
//! wgpu = 26.x

use asset::{SkinImage, TextureFilter};
use bytemuck::{Pod, Zeroable};
use corelib::{LoadError, LoadResult, Mat4};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    DepthBiasState, DepthStencilState, Device, Extent3d, FilterMode, FragmentState, Queue,
    RenderPass, RenderPipeline, RenderPipelineDescriptor, SamplerBindingType, ShaderModule,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, TextureDimension, TextureFormat,
    TextureSampleType, TextureUsages, TextureViewDimension, VertexBufferLayout, VertexState,
    VertexStepMode, util::DeviceExt,
};

use crate::backend::{ListHandle, RenderBackend, TextureHandle};
use crate::bake::{BakedVertex, Batch, bake};
use crate::display_list::{DisplayList, Winding};

const SKIN_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

impl BakedVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<BakedVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

/// Camera UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Attachment formats of the passes display lists are drawn into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTargets {
    pub color: TextureFormat,
    pub depth: Option<TextureFormat>,
}

impl Default for RenderTargets {
    fn default() -> Self {
        Self {
            color: TextureFormat::Rgba8UnormSrgb,
            depth: Some(TextureFormat::Depth32Float),
        }
    }
}

/// Uploaded skin plus everything needed to sample it.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub bind_group: BindGroup,
}

/// Baked display list resident on the GPU.
pub struct GpuDisplayList {
    pub vertex_buffer: Buffer,
    pub vertex_count: u32,
    pub batches: Vec<Batch>,
    pub front_face: wgpu::FrontFace,
    pub pipeline: RenderPipeline,
}

pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    targets: RenderTargets,
    shader: ShaderModule,
    texture_bgl: BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    camera_buf: Buffer,
    camera_bg: BindGroup,
    // Bound for batches recorded with texturing disabled.
    white: GpuTexture,
    textures: Vec<GpuTexture>,
    lists: Vec<GpuDisplayList>,
}

impl WgpuBackend {
    pub fn new(device: Device, queue: Queue, targets: RenderTargets) -> Self {
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Skin BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Camera BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CameraUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let camera_init = CameraUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera UBO"),
            contents: bytemuck::bytes_of(&camera_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera BG"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Skin WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/skin.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display list PipelineLayout"),
            bind_group_layouts: &[&texture_bgl, &camera_bgl],
            push_constant_ranges: &[],
        });

        let white = create_texture(
            &device,
            &queue,
            &texture_bgl,
            "White",
            1,
            1,
            &[255, 255, 255, 255],
            TextureFilter::Nearest,
        );

        Self {
            device,
            queue,
            targets,
            shader,
            texture_bgl,
            pipeline_layout,
            camera_buf,
            camera_bg,
            white,
            textures: Vec::new(),
            lists: Vec::new(),
        }
    }

    /// Create a backend on a device without a surface.
    pub fn headless(backends: wgpu::Backends) -> LoadResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| LoadError::Backend(format!("No suitable GPU adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Livery Device"),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                .using_resolution(adapter.limits()),
            ..Default::default()
        }))
        .map_err(|e| LoadError::Backend(format!("request_device failed: {e}")))?;

        Ok(Self::new(device, queue, RenderTargets::default()))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn targets(&self) -> RenderTargets {
        self.targets
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle.slot())
    }

    pub fn list(&self, handle: ListHandle) -> Option<&GpuDisplayList> {
        self.lists.get(handle.slot())
    }

    /// Update the view-projection matrix used by every list.
    pub fn set_view_proj(&self, view_proj: Mat4) {
        let cam = CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&cam));
    }

    /// Issue a compiled list into a render pass whose attachments match
    /// [`Self::targets`].
    pub fn draw(&self, pass: &mut RenderPass<'_>, handle: ListHandle) -> LoadResult<()> {
        let list = self
            .list(handle)
            .ok_or_else(|| LoadError::Backend(format!("Unknown display list {handle:?}")))?;
        if list.vertex_count == 0 {
            return Ok(());
        }

        pass.set_pipeline(&list.pipeline);
        pass.set_bind_group(1, &self.camera_bg, &[]);
        pass.set_vertex_buffer(0, list.vertex_buffer.slice(..));
        for batch in &list.batches {
            let texture = match batch.texture {
                Some(handle) if batch.textured => self.texture(handle).ok_or_else(|| {
                    LoadError::Backend(format!("Display list refers to unknown texture {handle:?}"))
                })?,
                _ => &self.white,
            };
            pass.set_bind_group(0, &texture.bind_group, &[]);
            pass.draw(batch.range.clone(), 0..1);
        }
        Ok(())
    }

    fn create_pipeline(&self, front_face: wgpu::FrontFace) -> RenderPipeline {
        self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Display list Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[BakedVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: self.targets.color,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                front_face,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: self.targets.depth.map(|format| DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn upload_texture(&mut self, skin: &SkinImage, filter: TextureFilter) -> LoadResult<TextureHandle> {
        if !skin.is_valid() {
            return Err(LoadError::Backend(format!(
                "Refusing to upload {}x{} skin with {} bytes",
                skin.width,
                skin.height,
                skin.data.len()
            )));
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if skin.width > limit || skin.height > limit {
            return Err(LoadError::Backend(format!(
                "Skin {}x{} exceeds max texture size {}",
                skin.width, skin.height, limit
            )));
        }

        let handle = TextureHandle::for_slot(self.textures.len())?;
        let texture = create_texture(
            &self.device,
            &self.queue,
            &self.texture_bgl,
            "Skin",
            skin.width,
            skin.height,
            &skin.data,
            filter,
        );
        self.textures.push(texture);
        log::info!("Uploaded skin {:?} ({}x{}, {:?})", handle, skin.width, skin.height, filter);
        Ok(handle)
    }

    fn compile_list(&mut self, list: &DisplayList) -> LoadResult<ListHandle> {
        let handle = ListHandle::for_slot(self.lists.len())?;
        let baked = bake(list)?;

        let vertex_count = u32::try_from(baked.vertices.len())
            .map_err(|_| LoadError::Backend(format!("Too many vertices (>{})", u32::MAX)))?;
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Display list VB"),
                contents: bytemuck::cast_slice(&baked.vertices),
                usage: BufferUsages::VERTEX,
            });
        let front_face = match baked.front_face {
            Winding::Ccw => wgpu::FrontFace::Ccw,
            Winding::Cw => wgpu::FrontFace::Cw,
        };
        let pipeline = self.create_pipeline(front_face);

        self.lists.push(GpuDisplayList {
            vertex_buffer,
            vertex_count,
            batches: baked.batches,
            front_face,
            pipeline,
        });
        log::info!("Compiled display list {:?} ({} vertices, {:?})", handle, vertex_count, front_face);
        Ok(handle)
    }
}

#[allow(clippy::too_many_arguments)]
fn create_texture(
    device: &Device,
    queue: &Queue,
    layout: &BindGroupLayout,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
    filter: TextureFilter,
) -> GpuTexture {
    let size = Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: SKIN_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * SkinImage::BYTES_PER_PIXEL),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mode = match filter {
        TextureFilter::Linear => FilterMode::Linear,
        TextureFilter::Nearest => FilterMode::Nearest,
    };
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        mag_filter: mode,
        min_filter: mode,
        ..Default::default()
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    GpuTexture {
        texture,
        view,
        sampler,
        bind_group,
    }
}
