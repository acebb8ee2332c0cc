use std::fmt::Debug;

use crate::config::{TileConfig, TileId};

/// Trait for matrix tile units (hardware AMX, software emulation, etc.).
///
/// A tile unit holds process-wide (in practice thread-local) register state,
/// so implementations are driven by a single caller in a strict order:
/// `configure` -> `load` / `multiply_accumulate` / `store` -> `release`.
/// The trait does not check that ordering; [`crate::TileSession`] enforces it
/// by construction.
pub trait TileUnit: Debug {
    /// Returns the name of this unit (e.g., "amx", "emulated").
    fn name(&self) -> &str;

    /// Applies the shapes of the tile slots. Re-applying an identical
    /// configuration has no observable effect on later operations.
    fn configure(&mut self, config: &TileConfig);

    /// Loads `tile` from `buf`, reading `rows` rows of `colsb` bytes each,
    /// consecutive rows `stride` bytes apart.
    ///
    /// # Panics
    /// Panics if `buf` is too short to back the configured shape at `stride`.
    fn load(&mut self, tile: TileId, buf: &[u8], stride: usize);

    /// Signed 8-bit dot-product accumulate: `dst += lhs * rhs`.
    ///
    /// - `lhs`: M rows x K bytes
    /// - `rhs`: K/4 rows x 4N bytes, four consecutive K values per 32-bit lane
    /// - `dst`: M rows x N 32-bit lanes, accumulated with wrapping arithmetic
    fn multiply_accumulate(&mut self, dst: TileId, lhs: TileId, rhs: TileId);

    /// Stores `tile` to `buf` with the same layout contract as `load`.
    ///
    /// # Panics
    /// Panics if `buf` is too short to back the configured shape at `stride`.
    fn store(&mut self, tile: TileId, buf: &mut [u8], stride: usize);

    /// Returns the unit to its initial state and relinquishes the tile
    /// registers. No tile operation may follow until `configure` is called
    /// again.
    fn release(&mut self);
}

impl<U: TileUnit + ?Sized> TileUnit for Box<U> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn configure(&mut self, config: &TileConfig) {
        (**self).configure(config)
    }

    fn load(&mut self, tile: TileId, buf: &[u8], stride: usize) {
        (**self).load(tile, buf, stride)
    }

    fn multiply_accumulate(&mut self, dst: TileId, lhs: TileId, rhs: TileId) {
        (**self).multiply_accumulate(dst, lhs, rhs)
    }

    fn store(&mut self, tile: TileId, buf: &mut [u8], stride: usize) {
        (**self).store(tile, buf, stride)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Asserts that `len` bytes can back `shape` at `stride`.
pub(crate) fn check_buffer(
    op: &str,
    tile: TileId,
    shape: crate::config::TileShape,
    len: usize,
    stride: usize,
) {
    let needed = shape.bytes_at_stride(stride);
    assert!(
        stride >= shape.colsb || shape.rows <= 1,
        "{op} {tile}: stride {stride} is narrower than the {} byte row",
        shape.colsb
    );
    assert!(
        len >= needed,
        "{op} {tile}: buffer of {len} bytes cannot back a {shape} tile at stride {stride} (need {needed})"
    );
}
