use crate::error::{Result, TileError};
use std::fmt;

/// Maximum number of rows a tile register can hold.
pub const MAX_ROWS: usize = 16;

/// Maximum width of a tile row in bytes.
pub const MAX_COLSB: usize = 64;

/// Row width in bytes of the special tile in slot 0.
pub const SPECIAL_COLSB: usize = 16;

/// Number of tile slots described by a configuration.
pub const TILE_SLOTS: usize = 8;

/// Number of slots this engine actually uses.
pub const ACTIVE_TILES: usize = 4;

/// Palette 0 is the initial (unconfigured) state.
pub const PALETTE_INIT: u8 = 0;

/// Palette 1 selects the matrix-multiply operation family.
pub const PALETTE_MATMUL: u8 = 1;

/// Row stride, in bytes, used for every load and store issued by the engine.
pub const ROW_STRIDE: usize = 64;

/// Size of one tile register in bytes.
pub const TILE_BYTES: usize = MAX_ROWS * MAX_COLSB;

/// One of the four active tile slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileId {
    T0,
    T1,
    T2,
    T3,
}

impl TileId {
    /// Slot index in the configuration record.
    pub fn index(self) -> usize {
        match self {
            TileId::T0 => 0,
            TileId::T1 => 1,
            TileId::T2 => 2,
            TileId::T3 => 3,
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmm{}", self.index())
    }
}

/// Row count and row width (in bytes) of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileShape {
    pub rows: usize,
    pub colsb: usize,
}

impl TileShape {
    /// Create a validated tile shape.
    ///
    /// Rows must not exceed [`MAX_ROWS`]; the width must not exceed
    /// [`MAX_COLSB`] and must be a whole number of 32-bit lanes.
    pub fn new(rows: usize, colsb: usize) -> Result<TileShape> {
        if rows > MAX_ROWS || colsb > MAX_COLSB || colsb % 4 != 0 {
            return Err(TileError::InvalidShape { rows, colsb });
        }
        Ok(TileShape { rows, colsb })
    }

    /// The full 16 x 64 byte shape.
    pub const fn full() -> TileShape {
        TileShape {
            rows: MAX_ROWS,
            colsb: MAX_COLSB,
        }
    }

    /// Number of bytes a buffer needs to back this tile at `stride`.
    pub fn bytes_at_stride(&self, stride: usize) -> usize {
        if self.rows == 0 {
            return 0;
        }
        (self.rows - 1) * stride + self.colsb
    }
}

impl fmt::Display for TileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}B", self.rows, self.colsb)
    }
}

/// The 64-byte tile configuration record consumed by `ldtilecfg`.
///
/// The layout is fixed by the hardware: the record is loaded verbatim, so
/// field order, reserved bytes and alignment must not change.
#[repr(C, align(64))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    palette_id: u8,
    start_row: u8,
    reserved_0: [u8; 14],
    colsb: [u16; TILE_SLOTS],
    reserved_colsb: [u16; TILE_SLOTS],
    rows: [u8; TILE_SLOTS],
    reserved_rows: [u8; TILE_SLOTS],
}

impl TileConfig {
    /// An empty configuration for `palette_id` with every slot disabled.
    pub const fn new(palette_id: u8) -> TileConfig {
        TileConfig {
            palette_id,
            start_row: 0,
            reserved_0: [0; 14],
            colsb: [0; TILE_SLOTS],
            reserved_colsb: [0; TILE_SLOTS],
            rows: [0; TILE_SLOTS],
            reserved_rows: [0; TILE_SLOTS],
        }
    }

    /// The configuration used by the blocked engine.
    ///
    /// - slot 0: 16 rows x 16 bytes (the special accumulator-shaped tile)
    /// - slots 1..3: 16 rows x 64 bytes (dst, lhs, rhs)
    pub fn matmul() -> TileConfig {
        let mut cfg = TileConfig::new(PALETTE_MATMUL);
        cfg.set(TileId::T0, TileShape { rows: MAX_ROWS, colsb: SPECIAL_COLSB });
        for id in [TileId::T1, TileId::T2, TileId::T3] {
            cfg.set(id, TileShape::full());
        }
        cfg
    }

    /// Builder-style slot assignment.
    pub fn with_tile(mut self, id: TileId, shape: TileShape) -> Result<TileConfig> {
        let shape = TileShape::new(shape.rows, shape.colsb)?;
        self.set(id, shape);
        Ok(self)
    }

    fn set(&mut self, id: TileId, shape: TileShape) {
        self.rows[id.index()] = shape.rows as u8;
        self.colsb[id.index()] = shape.colsb as u16;
    }

    pub fn palette_id(&self) -> u8 {
        self.palette_id
    }

    pub fn start_row(&self) -> u8 {
        self.start_row
    }

    /// Shape of slot `id`.
    pub fn shape(&self, id: TileId) -> TileShape {
        TileShape {
            rows: self.rows[id.index()] as usize,
            colsb: self.colsb[id.index()] as usize,
        }
    }

    /// Raw record as handed to the hardware.
    pub fn as_bytes(&self) -> &[u8; 64] {
        // SAFETY: TileConfig is repr(C), exactly 64 bytes, with no padding
        // (all fields are integer arrays laid out back to back).
        unsafe { &*(self as *const TileConfig as *const [u8; 64]) }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        TileConfig::new(PALETTE_INIT)
    }
}

impl fmt::Debug for TileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<TileShape> = (0..ACTIVE_TILES)
            .map(|i| TileShape {
                rows: self.rows[i] as usize,
                colsb: self.colsb[i] as usize,
            })
            .collect();
        f.debug_struct("TileConfig")
            .field("palette_id", &self.palette_id)
            .field("start_row", &self.start_row)
            .field("active", &active)
            .finish()
    }
}
