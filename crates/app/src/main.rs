//! Entry point: load the car model with a skin and report what was built.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asset::{DEFAULT_SKINS_DIR, ObjOptions, TextureFilter, UnknownTagPolicy};
use renderer::{Loader, LoaderConfig, RecordingBackend, RenderBackend, WgpuBackend};

const DEFAULT_MODEL: &str = "assets/models/car.obj";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BackendChoice {
    Record,
    Wgpu,
}

/// Last value of `--name=value`, if given.
fn arg_value(name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    std::env::args()
        .filter_map(|arg| arg.strip_prefix(&prefix).map(str::to_owned))
        .last()
}

fn parse_backend_arg() -> BackendChoice {
    // Accept: --backend=record|wgpu
    match arg_value("backend").map(|v| v.to_ascii_lowercase()) {
        None => BackendChoice::Record,
        Some(val) => match val.as_str() {
            "record" | "recording" | "headless" => BackendChoice::Record,
            "wgpu" | "gpu" => BackendChoice::Wgpu,
            other => {
                log::warn!("Unknown backend '{}', falling back to record.", other);
                BackendChoice::Record
            }
        },
    }
}

fn parse_gpu_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let Some(val) = arg_value("gpu-backend") else {
        return wgpu::Backends::all();
    };
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown GPU backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

fn parse_tag_policy_arg() -> UnknownTagPolicy {
    // Accept: --strict-tags=ignore|warn|reject
    match arg_value("strict-tags").as_deref() {
        None | Some("ignore") | Some("off") => UnknownTagPolicy::Ignore,
        Some("warn") => UnknownTagPolicy::Warn,
        Some("reject") | Some("on") => UnknownTagPolicy::Reject,
        Some(other) => {
            log::warn!("Unknown tag policy '{}', ignoring unknown tags.", other);
            UnknownTagPolicy::Ignore
        }
    }
}

fn load_and_report<B: RenderBackend>(backend: &mut B, model: &Path, color: i64, config: &LoaderConfig) -> Result<()> {
    let loader = Loader::with_config(backend, model, color, config)
        .with_context(|| format!("Failed to load {} with skin {}", model.display(), color))?;

    log::info!(
        "Ready: {} vertices, {} normals, {} texcoords, {} faces ({} corners); texture={}, display list={}",
        loader.model().vertices.len(),
        loader.model().normals.len(),
        loader.model().texcoords.len(),
        loader.model().faces.len(),
        loader.model().corner_count(),
        loader.texture().get(),
        loader.mesh().get()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let model = PathBuf::from(arg_value("model").unwrap_or_else(|| DEFAULT_MODEL.to_owned()));
    let color = match arg_value("color") {
        Some(v) => v
            .parse::<i64>()
            .with_context(|| format!("--color expects an integer, got '{v}'"))?,
        None => 0,
    };
    let config = LoaderConfig {
        skins_dir: PathBuf::from(arg_value("skins-dir").unwrap_or_else(|| DEFAULT_SKINS_DIR.to_owned())),
        obj: ObjOptions {
            unknown_tags: parse_tag_policy_arg(),
        },
        filter: TextureFilter::Linear,
    };
    let backend = parse_backend_arg();

    log::info!(
        "Starting livery. Backend: {:?}, model={}, color={}, skins_dir={}",
        backend,
        model.display(),
        color,
        config.skins_dir.display()
    );

    match backend {
        BackendChoice::Record => {
            let mut backend = RecordingBackend::new();
            load_and_report(&mut backend, &model, color, &config)?;
        }
        BackendChoice::Wgpu => {
            let mut backend = WgpuBackend::headless(parse_gpu_backend_arg())
                .context("Failed to initialise wgpu backend")?;
            load_and_report(&mut backend, &model, color, &config)?;
        }
    }

    log::info!("Done.");
    Ok(())
}
