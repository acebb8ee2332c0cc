//! `tm-gemm` - Blocked int8 matrix multiplication over matrix tile units.
//!
//! Arbitrary [m, k] @ [k, n] problems are cut into 16 x 16 x 64 blocks that
//! match the native tile shape. Each block is staged into zero-padded,
//! tile-shaped buffers, multiplied on the tile unit, and added into the
//! caller's 32-bit output matrix.

pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod reference;
pub mod scratch;

// Re-export primary types at the crate root for convenience.
pub use block::{Block, BlockGrid, BLOCK_K, BLOCK_M, BLOCK_N};
pub use config::{build_engine, BackendKind, DynGemm, EngineConfig};
pub use engine::BlockedGemm;
pub use error::{GemmError, Result};
pub use reference::matmul_naive;
pub use scratch::Scratch;
