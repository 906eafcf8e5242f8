//! Frame loop driving a [`Backend`] through the compute/display handshake.

use crate::accel::{build_bvh, BuildOptions, Bvh};
use crate::config::RenderConfig;
use crate::gpu::{
    ArgValue, Backend, ComputeLease, DispatchGrid, FrameParams, GpuScene, KernelArg, KernelArgs, ProgramHandle,
    SceneBuffers, UniformValue, KERNEL_ENTRY,
};
use crate::scene::{InputSource, Scene};
use crate::util::Result;

use super::shading::ShadingMode;

/// Owns the backend, the scene and its BVH, and renders frames.
///
/// Frame order: camera tick, camera write, acquire shared image, dispatch,
/// finish, release, quad draw, present. The image is back with display
/// before any draw, including when a step in between fails.
pub struct Renderer<B: Backend> {
    backend: B,
    scene: Scene,
    bvh: Bvh,
    gpu_scene: GpuScene,
    args: KernelArgs,
    program: ProgramHandle,
    shading: ShadingMode,
    frames: u64,
    skipped: u64,
}

impl<B: Backend> Renderer<B> {
    /// Create the window, build kernel and display program, build and upload the scene.
    ///
    /// Any failure aborts construction; a kernel build error carries its log.
    pub fn new(mut backend: B, mut scene: Scene, config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        scene.camera.resize(config.width, config.height);
        backend.create_window(config.width, config.height)?;

        let kernel = config.kernel_source()?;
        backend.build_kernel(&kernel, KERNEL_ENTRY)?;

        let display = config.display_source()?;
        let program = backend.load_program(&display, &display)?;
        backend.use_program(program)?;
        backend.set_uniform(program, "exposure", UniformValue::Float(config.exposure))?;

        let (bvh, gpu_scene) = prepare_scene(&scene, config.bvh)?;
        let buffers = backend.upload_scene(&gpu_scene)?;

        let mut renderer = Self {
            backend,
            scene,
            bvh,
            gpu_scene,
            args: KernelArgs::new(),
            program,
            shading: config.shading,
            frames: 0,
            skipped: 0,
        };
        renderer.bind_args(buffers)?;
        log::info!(
            "Renderer ready: scene '{}', {}x{}",
            renderer.scene.name,
            config.width,
            config.height
        );
        Ok(renderer)
    }

    /// Render one frame.
    pub fn render_frame(&mut self, input: &impl InputSource) -> Result<()> {
        if self.scene.camera.tick(input) {
            log::debug!(
                "Camera at {} yaw {:.1} pitch {:.1}",
                self.scene.camera.position,
                self.scene.camera.yaw,
                self.scene.camera.pitch
            );
        }
        let uniform = self.scene.camera.to_uniform(self.shading.flags());
        self.backend.write_camera(&uniform)?;

        let (width, height) = self.scene.camera.size();
        let grid = DispatchGrid::new(width, height);
        {
            let mut lease = ComputeLease::acquire(&mut self.backend)?;
            lease.dispatch(&self.args, &grid)?;
            lease.finish()?;
            lease.release()?;
        }

        self.backend.draw_fullscreen_quad(self.program)?;
        self.backend.present_frame()?;
        self.frames += 1;
        Ok(())
    }

    /// Render one frame; a failure is logged and the frame skipped.
    ///
    /// Returns whether the frame was presented.
    pub fn tick(&mut self, input: &impl InputSource) -> bool {
        match self.render_frame(input) {
            Ok(()) => true,
            Err(e) => {
                self.skipped += 1;
                log::warn!("Frame {} skipped: {e}", self.frames + self.skipped);
                false
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.backend.resize(width, height)?;
        self.scene.camera.resize(width, height);
        let image = self.backend.shared_image()?;
        self.args.set(KernelArg::Output, ArgValue::Image(image))?;
        self.args.set(KernelArg::Params, ArgValue::Params(self.frame_params()))?;
        Ok(())
    }

    pub fn set_shading(&mut self, shading: ShadingMode) -> Result<()> {
        self.shading = shading;
        self.args.set(KernelArg::Params, ArgValue::Params(self.frame_params()))
    }

    /// Replace the scene: rebuild the BVH and re-upload. The viewport size is kept.
    ///
    /// Options the kernel cannot traverse are rejected and the current scene stays.
    pub fn rebuild_scene(&mut self, mut scene: Scene, options: BuildOptions) -> Result<()> {
        let (width, height) = self.scene.camera.size();
        scene.camera.resize(width, height);
        let (bvh, gpu_scene) = prepare_scene(&scene, options)?;
        let buffers = self.backend.upload_scene(&gpu_scene)?;
        self.scene = scene;
        self.bvh = bvh;
        self.gpu_scene = gpu_scene;
        self.bind_args(buffers)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn gpu_scene(&self) -> &GpuScene {
        &self.gpu_scene
    }

    pub fn kernel_args(&self) -> &KernelArgs {
        &self.args
    }

    /// Frames presented.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }

    fn frame_params(&self) -> FrameParams {
        let (width, height) = self.scene.camera.size();
        FrameParams {
            width,
            height,
            primitive_count: self.gpu_scene.primitive_count(),
            flags: self.shading.flags(),
        }
    }

    fn bind_args(&mut self, buffers: SceneBuffers) -> Result<()> {
        let mut args = KernelArgs::new();
        args.set(KernelArg::Primitives, ArgValue::Storage(buffers.primitives))?;
        args.set(KernelArg::Params, ArgValue::Params(self.frame_params()))?;
        args.set(KernelArg::Output, ArgValue::Image(self.backend.shared_image()?))?;
        args.set(KernelArg::Camera, ArgValue::Uniform(self.backend.camera_buffer()?))?;
        args.set(KernelArg::Nodes, ArgValue::Storage(buffers.nodes))?;
        args.validate()?;
        self.args = args;
        Ok(())
    }
}

fn prepare_scene(scene: &Scene, options: BuildOptions) -> Result<(Bvh, GpuScene)> {
    options.validate()?;
    let bvh = build_bvh(&scene.geometry, options);
    let stats = bvh.stats();
    log::info!(
        "BVH: {} nodes, {} leaves, depth {}, max leaf {}",
        stats.node_count,
        stats.leaf_count,
        stats.max_depth,
        stats.max_leaf_size
    );
    let gpu_scene = GpuScene::new(&scene.geometry, &bvh)?;
    Ok((bvh, gpu_scene))
}
