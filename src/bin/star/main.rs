//! star CLI - render built-in scenes on the GPU or CPU and inspect their BVHs.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::prelude::*;

use star::accel::{build_bvh, SplitMethod};
use star::config::RenderConfig;
use star::render::{cpu, CpuOptions, ShadingMode};
use star::scene::{self, PRESETS};

/// Command-line overrides applied on top of the loaded config.
#[derive(Default)]
struct Options {
    config: Option<PathBuf>,
    scene: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    frames: Option<u32>,
    output: Option<PathBuf>,
    split: Option<SplitMethod>,
    leaf_size: Option<usize>,
    normals: bool,
}

impl Options {
    fn apply(&self, config: &mut RenderConfig) {
        if let Some(s) = &self.scene {
            config.scene = s.clone();
        }
        if let Some(w) = self.width {
            config.width = w;
        }
        if let Some(h) = self.height {
            config.height = h;
        }
        if let Some(n) = self.frames {
            config.frames = n;
        }
        if let Some(p) = &self.output {
            config.output = p.clone();
        }
        if let Some(split) = self.split {
            config.bvh.split = split;
        }
        if let Some(n) = self.leaf_size {
            config.bvh.max_leaf_size = n;
        }
        if self.normals {
            config.shading = ShadingMode::Normals;
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = log::LevelFilter::Info;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = log::LevelFilter::Debug,
            "-vv" | "--trace" => level = log::LevelFilter::Trace,
            "-q" | "--quiet" => level = log::LevelFilter::Warn,
            "-V" | "--version" => {
                println!("{}", version_line());
                return;
            }
            _ => filtered_args.push(arg),
        }
    }

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    let _trace_guard = init_tracing();

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "render" | "r" => parse_options(&filtered_args[1..]).and_then(cmd_render),
        "cpu" | "c" => parse_options(&filtered_args[1..]).and_then(cmd_cpu),
        "bvh" | "b" => parse_options(&filtered_args[1..]).and_then(cmd_bvh),
        "scenes" | "s" => {
            cmd_scenes();
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn version_line() -> String {
    format!(
        "star {} ({}, built {})\nfeatures: {}",
        env!("CARGO_PKG_VERSION"),
        env!("STAR_GIT_COMMIT"),
        env!("STAR_BUILD_STAMP"),
        env!("STAR_FEATURES")
    )
}

fn print_help() {
    println!("star - BVH ray tracer");
    println!();
    println!("USAGE:");
    println!("    star [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    r, render   Trace frames on the GPU and save the last one");
    println!("    c, cpu      Trace one frame on the CPU and save it");
    println!("    b, bvh      Build the BVH for a scene and print statistics");
    println!("    s, scenes   List built-in scenes");
    println!("    h, help     Show this help");
    println!();
    println!("ARGS:");
    println!("    --config <file>      Config JSON (default: per-user config if present)");
    println!("    --scene <name>       Built-in scene");
    println!("    --width <px>         Image width");
    println!("    --height <px>        Image height");
    println!("    --frames <n>         Frames to render (render only)");
    println!("    --out <file.png>     Output image");
    println!("    --split <method>     BVH split: middle, equal-counts, sah");
    println!("    --leaf-size <n>      Max primitives per BVH leaf");
    println!("    --normals            Shade by surface normal");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose   Debug output");
    println!("    -vv, --trace    Trace output (very verbose)");
    println!("    -q, --quiet     Warnings and errors only");
    println!("    -V, --version   Print version, commit and enabled features");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG        Log filter (overrides -v/-q per module)");
    println!("    STAR_TRACE=1    Write a Chrome trace to trace.json");
}

fn parse_options(args: &[&str]) -> Result<RenderConfig> {
    let mut opts = Options::default();
    let mut it = args.iter().copied();
    while let Some(arg) = it.next() {
        let mut value = || it.next().ok_or_else(|| anyhow!("missing value for {}", arg));
        match arg {
            "--config" => opts.config = Some(PathBuf::from(value()?)),
            "--scene" => opts.scene = Some(value()?.to_string()),
            "--width" => opts.width = Some(value()?.parse().context("--width")?),
            "--height" => opts.height = Some(value()?.parse().context("--height")?),
            "--frames" => opts.frames = Some(value()?.parse().context("--frames")?),
            "--out" | "-o" => opts.output = Some(PathBuf::from(value()?)),
            "--split" => {
                let v = value()?;
                opts.split = Some(SplitMethod::parse(v).ok_or_else(|| anyhow!("unknown split method: {}", v))?);
            }
            "--leaf-size" => opts.leaf_size = Some(value()?.parse().context("--leaf-size")?),
            "--normals" => opts.normals = true,
            other => bail!("unknown argument: {}", other),
        }
    }

    let mut config = RenderConfig::load_or_default(opts.config.as_deref())?;
    opts.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "gpu")]
fn cmd_render(config: RenderConfig) -> Result<()> {
    use star::gpu::WgpuBackend;
    use star::render::{save_rgba8_png, Renderer};
    use star::scene::InputState;

    let scene = scene::preset(&config.scene, config.width, config.height)?;
    let backend = WgpuBackend::new()?;
    let mut renderer = Renderer::new(backend, scene, &config)?;

    let mut input = InputState::new();
    let start = std::time::Instant::now();
    for _ in 0..config.frames {
        input.begin_frame();
        renderer.tick(&input);
    }
    let elapsed = start.elapsed();
    log::info!(
        "{} frames presented, {} skipped, {:.2} ms/frame",
        renderer.frame_count(),
        renderer.skipped_frames(),
        elapsed.as_secs_f64() * 1000.0 / config.frames as f64
    );
    if renderer.frame_count() == 0 {
        bail!("no frame was presented");
    }

    let (width, height, rgba) = renderer.backend().read_frame()?;
    save_rgba8_png(&config.output, width, height, rgba)?;
    println!("Saved {}", config.output.display());
    Ok(())
}

#[cfg(not(feature = "gpu"))]
fn cmd_render(_config: RenderConfig) -> Result<()> {
    bail!("GPU rendering not available. Rebuild with: cargo build --features gpu")
}

fn cmd_cpu(config: RenderConfig) -> Result<()> {
    let scene = scene::preset(&config.scene, config.width, config.height)?;
    let bvh = build_bvh(&scene.geometry, config.bvh);
    let image = cpu::render(&scene.geometry, &bvh, &scene.camera, &CpuOptions { shading: config.shading });
    image.save_png(&config.output, config.exposure)?;
    println!("Saved {}", config.output.display());
    Ok(())
}

fn cmd_bvh(config: RenderConfig) -> Result<()> {
    let scene = scene::preset(&config.scene, config.width, config.height)?;
    let start = std::time::Instant::now();
    let bvh = build_bvh(&scene.geometry, config.bvh);
    let elapsed = start.elapsed();
    let stats = bvh.stats();

    println!("Scene:       {}", scene.name);
    println!("Split:       {:?}", config.bvh.split);
    println!("Primitives:  {}", stats.primitive_count);
    println!("Nodes:       {} ({} leaves)", stats.node_count, stats.leaf_count);
    println!("Max depth:   {}", stats.max_depth);
    println!("Max leaf:    {}", stats.max_leaf_size);
    println!("Build time:  {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    if !bvh.is_empty() {
        let b = bvh.bound();
        println!("Bounds:      {} .. {}", b.min, b.max);
    }
    Ok(())
}

fn cmd_scenes() {
    println!("Built-in scenes:");
    for (name, description) in PRESETS {
        println!("    {:<14} {}", name, description);
    }
}

fn init_tracing() -> Option<tracing_chrome::FlushGuard> {
    if std::env::var("STAR_TRACE").ok().as_deref() != Some("1") {
        return None;
    }

    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new().file("trace.json").build();

    let subscriber = tracing_subscriber::registry().with(chrome_layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }

    Some(guard)
}
