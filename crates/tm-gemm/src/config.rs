use std::fmt;
use std::str::FromStr;

use tm_tile::{EmulatedTileUnit, TileUnit};

use crate::engine::BlockedGemm;
use crate::error::{GemmError, Result};

/// Environment variable consulted by [`EngineConfig::from_env`].
pub const BACKEND_ENV: &str = "TILEMM_BACKEND";

/// Which tile unit an engine should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Hardware when the capability gate grants it, emulation otherwise.
    #[default]
    Auto,
    /// Hardware only; fails if the gate refuses.
    Hardware,
    /// Software emulation; never touches the gate.
    Emulated,
}

impl FromStr for BackendKind {
    type Err = GemmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(BackendKind::Auto),
            "amx" | "hardware" | "hw" => Ok(BackendKind::Hardware),
            "emulated" | "software" | "sw" => Ok(BackendKind::Emulated),
            other => Err(GemmError::InvalidConfig(format!(
                "unknown backend '{}' (expected auto, amx or emulated)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Auto => write!(f, "auto"),
            BackendKind::Hardware => write!(f, "amx"),
            BackendKind::Emulated => write!(f, "emulated"),
        }
    }
}

/// Runtime engine configuration. Tile and block extents are compile-time
/// constants; only the backend is chosen at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub backend: BackendKind,
}

impl EngineConfig {
    pub fn new(backend: BackendKind) -> Self {
        EngineConfig { backend }
    }

    /// Read the backend from `TILEMM_BACKEND` (default `auto`).
    pub fn from_env() -> Result<EngineConfig> {
        let backend = match std::env::var(BACKEND_ENV) {
            Ok(v) => v.parse()?,
            Err(std::env::VarError::NotPresent) => BackendKind::Auto,
            Err(e) => {
                return Err(GemmError::InvalidConfig(format!("{}: {}", BACKEND_ENV, e)));
            }
        };
        Ok(EngineConfig { backend })
    }
}

/// Engine over a boxed tile unit, as produced by [`build_engine`].
pub type DynGemm = BlockedGemm<Box<dyn TileUnit>>;

/// Build an engine according to `config`.
pub fn build_engine(config: &EngineConfig) -> Result<DynGemm> {
    let unit: Box<dyn TileUnit> = match config.backend {
        BackendKind::Emulated => Box::new(EmulatedTileUnit::new()),
        BackendKind::Hardware => hardware_unit()?,
        BackendKind::Auto => match hardware_unit() {
            Ok(unit) => unit,
            Err(e) => {
                log::info!("falling back to emulated tile unit: {}", e);
                Box::new(EmulatedTileUnit::new())
            }
        },
    };
    log::info!("blocked gemm engine using {} tile unit", unit.name());
    Ok(BlockedGemm::new(unit))
}

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
fn hardware_unit() -> Result<Box<dyn TileUnit>> {
    let grant = tm_tile::request_tile_permission()?;
    Ok(Box::new(tm_tile::AmxTileUnit::new(grant)))
}

#[cfg(not(all(target_arch = "x86_64", target_os = "linux")))]
fn hardware_unit() -> Result<Box<dyn TileUnit>> {
    // Still consult the gate so the failure reason is uniform.
    tm_tile::request_tile_permission()?;
    Err(GemmError::Other(
        "no hardware tile unit for this target".to_string(),
    ))
}
