use crate::config::{TileConfig, TileId, TileShape, TILE_BYTES, TILE_SLOTS};
use crate::unit::{check_buffer, TileUnit};

/// Pure-Rust model of the palette-1 tile unit.
///
/// Holds eight 1 KiB tile registers and the active configuration, and
/// reproduces the hardware's results bit for bit. Intended as the reference
/// implementation and as the fallback on machines without tile hardware.
#[derive(Clone)]
pub struct EmulatedTileUnit {
    config: TileConfig,
    tiles: Box<[[u8; TILE_BYTES]; TILE_SLOTS]>,
}

impl EmulatedTileUnit {
    pub fn new() -> Self {
        EmulatedTileUnit {
            config: TileConfig::default(),
            tiles: Box::new([[0u8; TILE_BYTES]; TILE_SLOTS]),
        }
    }

    /// Currently applied configuration.
    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    fn shape(&self, tile: TileId) -> TileShape {
        self.config.shape(tile)
    }

    fn read_i8(&self, tile: TileId, row: usize, byte: usize) -> i32 {
        self.tiles[tile.index()][row * TileShape::full().colsb + byte] as i8 as i32
    }

    fn read_i32(&self, tile: TileId, row: usize, lane: usize) -> i32 {
        let off = row * TileShape::full().colsb + lane * 4;
        let t = &self.tiles[tile.index()];
        i32::from_le_bytes([t[off], t[off + 1], t[off + 2], t[off + 3]])
    }

    fn write_i32(&mut self, tile: TileId, row: usize, lane: usize, value: i32) {
        let off = row * TileShape::full().colsb + lane * 4;
        self.tiles[tile.index()][off..off + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Default for EmulatedTileUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmulatedTileUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulatedTileUnit")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TileUnit for EmulatedTileUnit {
    fn name(&self) -> &str {
        "emulated"
    }

    fn configure(&mut self, config: &TileConfig) {
        // ldtilecfg zeroes every tile register.
        self.config = *config;
        for t in self.tiles.iter_mut() {
            t.fill(0);
        }
    }

    fn load(&mut self, tile: TileId, buf: &[u8], stride: usize) {
        let shape = self.shape(tile);
        check_buffer("load", tile, shape, buf.len(), stride);

        let reg = &mut self.tiles[tile.index()];
        reg.fill(0);
        let width = TileShape::full().colsb;
        for r in 0..shape.rows {
            let src = &buf[r * stride..r * stride + shape.colsb];
            reg[r * width..r * width + shape.colsb].copy_from_slice(src);
        }
    }

    fn multiply_accumulate(&mut self, dst: TileId, lhs: TileId, rhs: TileId) {
        assert!(
            dst != lhs && dst != rhs && lhs != rhs,
            "tdpbssd needs three distinct tiles, got {}, {}, {}",
            dst,
            lhs,
            rhs
        );
        let d = self.shape(dst);
        let a = self.shape(lhs);
        let b = self.shape(rhs);
        debug_assert_eq!(d.rows, a.rows, "dst and lhs row counts differ");
        debug_assert_eq!(d.colsb, b.colsb, "dst and rhs widths differ");
        debug_assert_eq!(a.colsb / 4, b.rows, "lhs width and rhs rows disagree");

        let lanes = d.colsb / 4;
        let quads = a.colsb / 4;
        for m in 0..d.rows {
            for n in 0..lanes {
                let mut acc = self.read_i32(dst, m, n);
                for q in 0..quads {
                    for i in 0..4 {
                        let x = self.read_i8(lhs, m, 4 * q + i);
                        let y = self.read_i8(rhs, q, 4 * n + i);
                        acc = acc.wrapping_add(x.wrapping_mul(y));
                    }
                }
                self.write_i32(dst, m, n, acc);
            }
        }
    }

    fn store(&mut self, tile: TileId, buf: &mut [u8], stride: usize) {
        let shape = self.shape(tile);
        check_buffer("store", tile, shape, buf.len(), stride);

        let reg = &self.tiles[tile.index()];
        let width = TileShape::full().colsb;
        for r in 0..shape.rows {
            buf[r * stride..r * stride + shape.colsb]
                .copy_from_slice(&reg[r * width..r * width + shape.colsb]);
        }
    }

    fn release(&mut self) {
        self.config = TileConfig::default();
        for t in self.tiles.iter_mut() {
            t.fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROW_STRIDE;

    fn unit() -> EmulatedTileUnit {
        let mut u = EmulatedTileUnit::new();
        u.configure(&TileConfig::matmul());
        u
    }

    fn i32_bytes(v: &[i32]) -> Vec<u8> {
        v.iter().flat_map(|x| x.to_le_bytes()).collect()
    }

    fn bytes_i32(b: &[u8]) -> Vec<i32> {
        b.chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_all_twos_single_tile() {
        let mut u = unit();
        let ones = vec![2u8; 1024];
        let zeros = vec![0u8; 1024];
        u.load(TileId::T2, &ones, ROW_STRIDE);
        u.load(TileId::T3, &ones, ROW_STRIDE);
        u.load(TileId::T1, &zeros, ROW_STRIDE);
        u.multiply_accumulate(TileId::T1, TileId::T2, TileId::T3);
        let mut out = vec![0u8; 1024];
        u.store(TileId::T1, &mut out, ROW_STRIDE);
        assert!(bytes_i32(&out).iter().all(|&v| v == 2 * 2 * 64));
    }

    #[test]
    fn test_accumulates_into_destination() {
        let mut u = unit();
        let ones = vec![1u8; 1024];
        u.load(TileId::T2, &ones, ROW_STRIDE);
        u.load(TileId::T3, &ones, ROW_STRIDE);
        u.load(TileId::T1, &i32_bytes(&[10; 256]), ROW_STRIDE);
        u.multiply_accumulate(TileId::T1, TileId::T2, TileId::T3);
        u.multiply_accumulate(TileId::T1, TileId::T2, TileId::T3);
        let mut out = vec![0u8; 1024];
        u.store(TileId::T1, &mut out, ROW_STRIDE);
        assert!(bytes_i32(&out).iter().all(|&v| v == 10 + 64 + 64));
    }

    #[test]
    fn test_interleaved_rhs_layout() {
        // lhs row 0 = [1, 2, 3, 4, 0...]; rhs quad row 0 holds column n at
        // bytes 4n..4n+4, so column 1 = [5, 6, 7, 8].
        let mut u = unit();
        let mut a = vec![0u8; 1024];
        a[..4].copy_from_slice(&[1, 2, 3, 4]);
        let mut b = vec![0u8; 1024];
        b[4..8].copy_from_slice(&[5, 6, 7, 8]);
        u.load(TileId::T2, &a, ROW_STRIDE);
        u.load(TileId::T3, &b, ROW_STRIDE);
        u.load(TileId::T1, &[0u8; 1024], ROW_STRIDE);
        u.multiply_accumulate(TileId::T1, TileId::T2, TileId::T3);
        let mut out = vec![0u8; 1024];
        u.store(TileId::T1, &mut out, ROW_STRIDE);
        let c = bytes_i32(&out);
        assert_eq!(c[1], 5 + 12 + 21 + 32);
        assert_eq!(c.iter().filter(|&&v| v != 0).count(), 1);
    }

    #[test]
    fn test_signed_operands_and_wrapping() {
        let mut u = unit();
        let neg = vec![(-128i8) as u8; 1024];
        u.load(TileId::T2, &neg, ROW_STRIDE);
        u.load(TileId::T3, &neg, ROW_STRIDE);
        u.load(TileId::T1, &i32_bytes(&[i32::MAX; 256]), ROW_STRIDE);
        u.multiply_accumulate(TileId::T1, TileId::T2, TileId::T3);
        let mut out = vec![0u8; 1024];
        u.store(TileId::T1, &mut out, ROW_STRIDE);
        let expected = i32::MAX.wrapping_add(128 * 128 * 64);
        assert!(bytes_i32(&out).iter().all(|&v| v == expected));
    }

    #[test]
    fn test_load_respects_stride_and_shape() {
        let mut u = EmulatedTileUnit::new();
        let cfg = TileConfig::new(crate::config::PALETTE_MATMUL)
            .with_tile(TileId::T0, TileShape { rows: 2, colsb: 4 })
            .unwrap();
        u.configure(&cfg);
        let buf: Vec<u8> = (0..16).collect();
        u.load(TileId::T0, &buf, 8);
        let mut out = vec![0xffu8; 12];
        u.store(TileId::T0, &mut out, 8);
        assert_eq!(&out[0..4], &[0, 1, 2, 3]);
        assert_eq!(&out[4..8], &[0xff; 4]);
        assert_eq!(&out[8..12], &[8, 9, 10, 11]);
    }

    #[test]
    #[should_panic(expected = "cannot back")]
    fn test_short_buffer_panics() {
        let mut u = unit();
        u.load(TileId::T2, &[0u8; 100], ROW_STRIDE);
    }

    #[test]
    #[should_panic(expected = "three distinct tiles")]
    fn test_aliased_tiles_panic() {
        let mut u = unit();
        u.multiply_accumulate(TileId::T1, TileId::T2, TileId::T2);
    }

    #[test]
    fn test_reconfigure_is_idempotent() {
        let mut u = unit();
        u.configure(&TileConfig::matmul());
        assert_eq!(*u.config(), TileConfig::matmul());
    }

    #[test]
    fn test_release_resets_state() {
        let mut u = unit();
        u.release();
        assert_eq!(u.config().palette_id(), 0);
        assert_eq!(u.config().shape(TileId::T1), TileShape::default());
    }
}
