//! Headless wgpu implementation of the compute, display and program traits.
//!
//! The "window" is an offscreen render target of the requested size; each
//! `present_frame` makes its contents the current frame, which
//! [`WgpuBackend::read_frame`] copies back for saving.
//!
//! ## Usage
//! ```ignore
//! let backend = WgpuBackend::new()?;
//! let mut renderer = Renderer::new(backend, scene, &config)?;
//! renderer.render_frame(&input)?;
//! let rgba = renderer.backend().read_frame()?;
//! ```

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::util::{Error, Result};

use super::backend::{
    ComputeBackend, DisplayBackend, ProgramHandle, ProgramService, SceneBuffers, UniformValue,
};
use super::dispatch::DispatchGrid;
use super::kernel::{ArgKind, ArgValue, BufferHandle, ImageHandle, KernelArg, KernelArgs};
use super::layout::{CameraUniform, FrameParams, GpuBvhNode, GpuPrimitive};
use super::scene_data::GpuScene;
use super::shared_image::SharedImage;
use super::vector::{GpuVector, UploadPlan};

/// Format of the shared image and of the display target.
const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const NODES: BufferHandle = BufferHandle(0);
const PRIMITIVES: BufferHandle = BufferHandle(1);
const CAMERA: BufferHandle = BufferHandle(2);
const OUTPUT: ImageHandle = ImageHandle(0);

/// Display program uniform matching `Display` in `quad.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DisplayUniform {
    exposure: f32,
    _pad: [f32; 3],
}

/// Device buffer kept in sync with a [`GpuVector`] mirror.
struct DeviceVector<T: Pod> {
    label: &'static str,
    host: GpuVector<T>,
    buffer: Option<wgpu::Buffer>,
}

impl<T: Pod> DeviceVector<T> {
    fn new(label: &'static str) -> Self {
        Self { label, host: GpuVector::new(), buffer: None }
    }

    /// Mirror holding `values`; the current one is untouched until [`commit`](Self::commit).
    fn staged(&self, values: &[T]) -> GpuVector<T> {
        let mut host = self.host.clone();
        host.assign(values);
        host
    }

    /// Buffer `host` needs before it can be written, or `None` to keep the current one.
    fn allocate(&self, device: &wgpu::Device, host: &GpuVector<T>) -> Option<wgpu::Buffer> {
        if self.buffer.is_some() && !host.needs_realloc() {
            return None;
        }
        Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: host.byte_capacity(),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }))
    }

    /// Adopt `host` and the buffer from [`allocate`](Self::allocate), then write what changed.
    fn commit(&mut self, queue: &wgpu::Queue, mut host: GpuVector<T>, fresh: Option<wgpu::Buffer>) {
        if let Some(buffer) = fresh {
            self.buffer = Some(buffer);
        }
        let plan = host.take_upload();
        self.host = host;
        let Some(buffer) = &self.buffer else { return };
        match plan {
            Some(UploadPlan::Realloc { capacity, len }) => {
                log::debug!("{}: allocating {} elements ({} in use)", self.label, capacity, len);
                if len > 0 {
                    queue.write_buffer(buffer, 0, self.host.as_bytes());
                }
            }
            Some(UploadPlan::Write(range)) => {
                let offset = (range.start * std::mem::size_of::<T>()) as u64;
                queue.write_buffer(buffer, offset, bytemuck::cast_slice(&self.host.as_slice()[range]));
            }
            None => {}
        }
    }
}

/// Largest scene buffer the device can create and bind as storage.
fn scene_buffer_limit(limits: &wgpu::Limits) -> u64 {
    limits.max_buffer_size.min(limits.max_storage_buffer_binding_size as u64)
}

fn check_buffer_size(label: &str, bytes: u64, limit: u64) -> Result<()> {
    if bytes > limit {
        return Err(Error::resource(label, format!("{bytes} bytes exceeds device limit of {limit}")));
    }
    Ok(())
}

/// Compiled trace kernel.
struct Kernel {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

/// Compiled display program.
struct Program {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
    values: DisplayUniform,
}

/// Shared output image and the offscreen display target.
struct Surface {
    image: wgpu::Texture,
    image_view: wgpu::TextureView,
    state: SharedImage,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
}

/// Headless wgpu device driving the trace kernel and the quad program.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    kernel: Option<Kernel>,
    camera_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    nodes: DeviceVector<GpuBvhNode>,
    primitives: DeviceVector<GpuPrimitive>,
    surface: Option<Surface>,
    programs: Vec<Program>,
    active_program: Option<ProgramHandle>,
    sampler: wgpu::Sampler,
    buffer_limit: u64,
    presented: u64,
}

impl WgpuBackend {
    /// Open the default adapter without a surface.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::NoAdapter(e.to_string()))?;
        let adapter_info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("star_device"),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::RequestDevice(e.to_string()))?;

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_params"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let buffer_limit = scene_buffer_limit(&device.limits());
        Ok(Self {
            device,
            queue,
            adapter_info,
            kernel: None,
            camera_buffer,
            params_buffer,
            nodes: DeviceVector::new("bvh_nodes"),
            primitives: DeviceVector::new("primitives"),
            surface: None,
            programs: Vec::new(),
            active_program: None,
            sampler,
            buffer_limit,
            presented: 0,
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Number of frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    /// Current shared image state.
    pub fn shared_image_state(&self) -> Option<&SharedImage> {
        self.surface.as_ref().map(|s| &s.state)
    }

    /// Copy the presented frame back as tightly packed RGBA8 rows.
    pub fn read_frame(&self) -> Result<(u32, u32, Vec<u8>)> {
        let surface = self.surface.as_ref().ok_or(Error::NotInitialized("create_window"))?;
        let (width, height) = surface.state.size();
        let row = width * 4;
        // bytes_per_row must be aligned to 256 (COPY_BYTES_PER_ROW_ALIGNMENT)
        let padded = row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_readback"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &surface.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.wait()?;
        rx.recv()
            .map_err(|e| Error::other(format!("readback channel closed: {e}")))?
            .map_err(|e| Error::other(format!("readback map failed: {e}")))?;

        let mut pixels = Vec::with_capacity((row * height) as usize);
        {
            let data = slice.get_mapped_range();
            for chunk in data.chunks(padded as usize).take(height as usize) {
                pixels.extend_from_slice(&chunk[..row as usize]);
            }
        }
        staging.unmap();
        Ok((width, height, pixels))
    }

    fn wait(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| Error::other(format!("device poll failed: {e}")))
    }

    /// Run `f` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, f: impl FnOnce(&Self) -> T) -> std::result::Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let out = f(self);
        // Scopes pop innermost first; both must come off.
        let oom = pollster::block_on(self.device.pop_error_scope());
        let invalid = pollster::block_on(self.device.pop_error_scope());
        match oom.or(invalid) {
            Some(err) => Err(err),
            None => Ok(out),
        }
    }

    fn create_surface(&self, width: u32, height: u32) -> Result<Surface> {
        let (image, image_view, target, target_view) = self.create_textures(width, height)?;
        Ok(Surface {
            image,
            image_view,
            state: SharedImage::new(width.max(1), height.max(1)),
            target,
            target_view,
        })
    }

    fn create_textures(
        &self,
        width: u32,
        height: u32,
    ) -> Result<(wgpu::Texture, wgpu::TextureView, wgpu::Texture, wgpu::TextureView)> {
        let size = wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 };
        let make = |label: &str, usage: wgpu::TextureUsages| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: IMAGE_FORMAT,
                usage,
                view_formats: &[],
            })
        };
        let (image, target) = self
            .scoped(|_| {
                let image = make(
                    "shared_image",
                    wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
                );
                let target = make(
                    "display_target",
                    wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                );
                (image, target)
            })
            .map_err(|e| Error::resource("shared image", e))?;

        let image_view = image.create_view(&wgpu::TextureViewDescriptor::default());
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        Ok((image, image_view, target, target_view))
    }

    fn surface(&self) -> Result<&Surface> {
        self.surface.as_ref().ok_or(Error::NotInitialized("create_window"))
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&wgpu::Buffer> {
        let buf = match handle {
            NODES => self.nodes.buffer.as_ref(),
            PRIMITIVES => self.primitives.buffer.as_ref(),
            CAMERA => Some(&self.camera_buffer),
            _ => None,
        };
        buf.ok_or_else(|| Error::resource(format!("buffer {}", handle.0), "not allocated"))
    }

    fn program(&self, handle: ProgramHandle) -> Result<&Program> {
        self.programs.get(handle.0 as usize).ok_or(Error::UnknownProgram(handle.0))
    }
}

fn kernel_layout_entry(arg: KernelArg) -> wgpu::BindGroupLayoutEntry {
    let ty = match arg.kind() {
        ArgKind::StorageBuffer => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ArgKind::UniformBuffer | ArgKind::Scalars => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ArgKind::Image => wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: IMAGE_FORMAT,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
    };
    wgpu::BindGroupLayoutEntry {
        binding: arg.binding(),
        visibility: wgpu::ShaderStages::COMPUTE,
        ty,
        count: None,
    }
}

impl ComputeBackend for WgpuBackend {
    fn build_kernel(&mut self, source: &str, entry: &str) -> Result<()> {
        let kernel = self
            .scoped(|b| {
                let module = b.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("trace_kernel"),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });
                let entries: Vec<_> = KernelArg::ALL.into_iter().map(kernel_layout_entry).collect();
                let layout = b.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("trace_bgl"),
                    entries: &entries,
                });
                let pipeline_layout = b.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("trace_pipeline_layout"),
                    bind_group_layouts: &[&layout],
                    push_constant_ranges: &[],
                });
                let pipeline = b.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("trace_pipeline"),
                    layout: Some(&pipeline_layout),
                    module: &module,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    cache: None,
                });
                Kernel { pipeline, layout }
            })
            .map_err(|e| Error::KernelBuild { log: e.to_string() })?;

        log::debug!("Trace kernel built (entry '{entry}')");
        self.kernel = Some(kernel);
        Ok(())
    }

    fn upload_scene(&mut self, scene: &GpuScene) -> Result<SceneBuffers> {
        let nodes = self.nodes.staged(&scene.nodes);
        let primitives = self.primitives.staged(&scene.primitives);
        check_buffer_size(self.nodes.label, nodes.byte_capacity(), self.buffer_limit)?;
        check_buffer_size(self.primitives.label, primitives.byte_capacity(), self.buffer_limit)?;

        let (fresh_nodes, fresh_primitives) = self
            .scoped(|b| (b.nodes.allocate(&b.device, &nodes), b.primitives.allocate(&b.device, &primitives)))
            .map_err(|e| Error::resource("scene buffers", e))?;
        self.nodes.commit(&self.queue, nodes, fresh_nodes);
        self.primitives.commit(&self.queue, primitives, fresh_primitives);
        log::info!(
            "Uploaded scene: {} nodes, {} primitives (capacity {} / {})",
            scene.node_count(),
            scene.primitive_count(),
            self.nodes.host.capacity(),
            self.primitives.host.capacity()
        );
        Ok(SceneBuffers { nodes: NODES, primitives: PRIMITIVES })
    }

    fn write_camera(&mut self, camera: &CameraUniform) -> Result<()> {
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
        Ok(())
    }

    fn camera_buffer(&self) -> Result<BufferHandle> {
        Ok(CAMERA)
    }

    fn shared_image(&self) -> Result<ImageHandle> {
        self.surface()?;
        Ok(OUTPUT)
    }

    fn acquire_shared_image(&mut self) -> Result<()> {
        self.surface
            .as_mut()
            .ok_or(Error::NotInitialized("create_window"))?
            .state
            .acquire_for_compute()
    }

    fn dispatch(&mut self, args: &KernelArgs, grid: &DispatchGrid) -> Result<()> {
        let surface = self.surface()?;
        surface.state.ensure_compute()?;
        let kernel = self.kernel.as_ref().ok_or(Error::NotInitialized("build_kernel"))?;
        args.validate()?;
        if grid.is_empty() {
            return Ok(());
        }

        if let Some(params) = args.params() {
            self.queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
        }
        if args.image(KernelArg::Output)? != OUTPUT {
            return Err(Error::resource("output image", "unknown handle"));
        }

        let mut entries = Vec::with_capacity(KernelArg::ALL.len());
        for arg in KernelArg::ALL {
            let resource = match args.get(arg) {
                Some(ArgValue::Storage(h)) | Some(ArgValue::Uniform(h)) => self.buffer(*h)?.as_entire_binding(),
                Some(ArgValue::Params(_)) => self.params_buffer.as_entire_binding(),
                Some(ArgValue::Image(_)) => wgpu::BindingResource::TextureView(&surface.image_view),
                None => return Err(Error::UnboundKernelArg(arg.name())),
            };
            entries.push(wgpu::BindGroupEntry { binding: arg.binding(), resource });
        }

        let [wg_x, wg_y] = grid.workgroups();
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trace_bind_group"),
            layout: &kernel.layout,
            entries: &entries,
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("trace_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("trace_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        self.queue.submit(Some(encoder.finish()));
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(Error::resource("trace dispatch", err));
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.wait()
    }

    fn release_shared_image(&mut self) -> Result<()> {
        self.surface
            .as_mut()
            .ok_or(Error::NotInitialized("create_window"))?
            .state
            .release_to_display()
    }
}

impl DisplayBackend for WgpuBackend {
    fn create_window(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface = Some(self.create_surface(width, height)?);
        log::debug!("Offscreen target {width}x{height}");
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let (width, height) = (width.max(1), height.max(1));
        let surface = self.surface()?;
        surface.state.ensure_display()?;
        if surface.state.size() == (width, height) {
            return Ok(());
        }
        let (image, image_view, target, target_view) = self.create_textures(width, height)?;
        let surface = self.surface.as_mut().ok_or(Error::NotInitialized("create_window"))?;
        surface.state.resize(width, height)?;
        surface.image = image;
        surface.image_view = image_view;
        surface.target = target;
        surface.target_view = target_view;
        log::debug!("Offscreen target resized to {width}x{height}");
        Ok(())
    }

    fn draw_fullscreen_quad(&mut self, program: ProgramHandle) -> Result<()> {
        let surface = self.surface()?;
        surface.state.ensure_display()?;
        if self.active_program != Some(program) {
            log::debug!("Drawing with program {} (active: {:?})", program.0, self.active_program);
        }
        let program = self.program(program)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad_bind_group"),
            layout: &program.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&surface.image_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: program.uniforms.as_entire_binding(),
                },
            ],
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("quad_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.3, g: 0.3, b: 0.8, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(Error::resource("quad draw", err));
        }
        Ok(())
    }

    fn present_frame(&mut self) -> Result<()> {
        self.surface()?;
        self.presented += 1;
        log::trace!("Presented frame {}", self.presented);
        Ok(())
    }
}

impl ProgramService for WgpuBackend {
    fn load_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramHandle> {
        let values = DisplayUniform { exposure: 1.0, _pad: [0.0; 3] };
        let program = self
            .scoped(|b| {
                let vs = b.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("quad_vs"),
                    source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
                });
                let fs = if fragment_source == vertex_source {
                    None
                } else {
                    Some(b.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("quad_fs"),
                        source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
                    }))
                };

                let layout = b.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("quad_bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                multisampled: false,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });
                let pipeline_layout = b.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("quad_pipeline_layout"),
                    bind_group_layouts: &[&layout],
                    push_constant_ranges: &[],
                });
                let pipeline = b.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("quad_pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &vs,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: fs.as_ref().unwrap_or(&vs),
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: IMAGE_FORMAT,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });
                let uniforms = b.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("quad_uniforms"),
                    contents: bytemuck::bytes_of(&values),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                Program { pipeline, layout, uniforms, values }
            })
            .map_err(|e| Error::ProgramBuild { log: e.to_string() })?;

        self.programs.push(program);
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<()> {
        self.program(program)?;
        self.active_program = Some(program);
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> Result<()> {
        let idx = program.0 as usize;
        let prog = self.programs.get_mut(idx).ok_or(Error::UnknownProgram(program.0))?;
        match (name, value) {
            ("exposure", UniformValue::Float(v)) => prog.values.exposure = v,
            ("exposure", UniformValue::Int(v)) => prog.values.exposure = v as f32,
            _ => return Err(Error::other(format!("unknown display uniform '{name}'"))),
        }
        self.queue.write_buffer(&prog.uniforms, 0, bytemuck::bytes_of(&prog.values));
        Ok(())
    }
}
