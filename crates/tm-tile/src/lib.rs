//! `tm-tile` - Matrix tile unit abstraction for tile-matmul.
//!
//! This crate provides:
//! - The 64-byte `TileConfig` record and tile shape constants
//! - A `TileUnit` trait for hardware and software tile backends
//! - A bit-exact `EmulatedTileUnit` available on every target
//! - An `AmxTileUnit` for x86_64 Linux with Intel AMX
//! - The capability gate that requests tile data permission from the kernel
//! - `TileSession`, a configured unit that is released exactly once

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
pub mod amx;
pub mod config;
pub mod emulated;
pub mod error;
pub mod gate;
pub mod session;
pub mod unit;

// Re-export primary types at the crate root for convenience.
#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
pub use amx::AmxTileUnit;
pub use config::{TileConfig, TileId, TileShape};
pub use emulated::EmulatedTileUnit;
pub use error::{Result, TileError};
pub use gate::{request_tile_permission, TileGrant};
pub use session::TileSession;
pub use unit::TileUnit;
