//! Render configuration loaded from JSON, overridden from the command line.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::accel::BuildOptions;
use crate::gpu::{QUAD_WGSL, TRACE_WGSL};
use crate::render::ShadingMode;
use crate::util::{Error, Result};

/// Largest image edge accepted.
const MAX_DIMENSION: u32 = 16384;

pub use crate::accel::MAX_KERNEL_DEPTH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    // Image
    pub width: u32,
    pub height: u32,
    pub exposure: f32,
    pub shading: ShadingMode,

    // Scene
    pub scene: String,
    pub bvh: BuildOptions,

    // Run
    pub frames: u32,
    pub output: PathBuf,

    // Shader overrides (WGSL files)
    pub kernel_path: Option<PathBuf>,
    pub display_shader_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            exposure: 1.0,
            shading: ShadingMode::Lambert,
            scene: "cornell".to_string(),
            bvh: BuildOptions::default(),
            frames: 1,
            output: PathBuf::from("star.png"),
            kernel_path: None,
            display_shader_path: None,
        }
    }
}

impl RenderConfig {
    /// Per-user config file (`<config dir>/star/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("star");
            p.push("config.json");
            p
        })
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::SourceFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `path` if given (must exist), else the per-user file if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(p) if p.is_file() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(Error::InvalidConfig(format!(
                "image size {}x{} outside 1..={MAX_DIMENSION}",
                self.width, self.height
            )));
        }
        self.bvh.validate()?;
        if !(self.exposure.is_finite() && self.exposure > 0.0) {
            return Err(Error::InvalidConfig(format!("exposure {} must be positive", self.exposure)));
        }
        if self.frames == 0 {
            return Err(Error::InvalidConfig("frames must be at least 1".into()));
        }
        Ok(())
    }

    /// Kernel WGSL: the override file or the built-in kernel.
    pub fn kernel_source(&self) -> Result<Cow<'static, str>> {
        read_source(self.kernel_path.as_deref(), TRACE_WGSL)
    }

    /// Display program WGSL: the override file or the built-in quad.
    pub fn display_source(&self) -> Result<Cow<'static, str>> {
        read_source(self.display_shader_path.as_deref(), QUAD_WGSL)
    }
}

fn read_source(path: Option<&Path>, builtin: &'static str) -> Result<Cow<'static, str>> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .map(Cow::Owned)
            .map_err(|source| Error::SourceFile { path: p.to_path_buf(), source }),
        None => Ok(Cow::Borrowed(builtin)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::SplitMethod;

    #[test]
    fn test_default_valid() {
        RenderConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: RenderConfig =
            serde_json::from_str(r#"{ "width": 320, "bvh": { "split": "sah" } }"#).unwrap();
        assert_eq!(cfg.width, 320);
        assert_eq!(cfg.height, 600);
        assert_eq!(cfg.bvh.split, SplitMethod::Sah);
        assert_eq!(cfg.bvh.max_leaf_size, 4);
        assert_eq!(cfg.shading, ShadingMode::Lambert);
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            RenderConfig { width: 0, ..Default::default() },
            RenderConfig { exposure: -1.0, ..Default::default() },
            RenderConfig { frames: 0, ..Default::default() },
            RenderConfig {
                bvh: BuildOptions { max_depth: 200, ..Default::default() },
                ..Default::default()
            },
            RenderConfig {
                bvh: BuildOptions { max_leaf_size: 0, ..Default::default() },
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))), "{cfg:?}");
        }
    }

    #[test]
    fn test_builtin_sources() {
        let cfg = RenderConfig::default();
        assert!(cfg.kernel_source().unwrap().contains("fn main"));
        assert!(cfg.display_source().unwrap().contains("fn fs_main"));

        let missing = RenderConfig { kernel_path: Some("/nonexistent/k.wgsl".into()), ..Default::default() };
        assert!(matches!(missing.kernel_source(), Err(Error::SourceFile { .. })));
    }
}
