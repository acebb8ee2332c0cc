use tm_tile::{EmulatedTileUnit, TileConfig, TileId, TileSession, TileUnit};

use crate::block::BlockGrid;
use crate::error::{GemmError, Result};
use crate::scratch::{Scratch, A_STRIDE, B_STRIDE, C_STRIDE};

/// Accumulator tile.
const DST: TileId = TileId::T1;
/// Lhs (A block) tile.
const LHS: TileId = TileId::T2;
/// Rhs (interleaved B block) tile.
const RHS: TileId = TileId::T3;

/// Blocked int8 matrix multiplication driven through a tile unit.
///
/// The engine owns a configured [`TileSession`] and one set of staging
/// buffers. Every block is padded to the native tile shape, so the
/// configuration is applied once and never changes.
#[derive(Debug)]
pub struct BlockedGemm<U: TileUnit> {
    session: TileSession<U>,
    scratch: Scratch,
}

impl BlockedGemm<EmulatedTileUnit> {
    /// Engine backed by the software tile unit.
    pub fn emulated() -> Self {
        BlockedGemm::new(EmulatedTileUnit::new())
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
impl BlockedGemm<tm_tile::AmxTileUnit> {
    /// Engine backed by AMX hardware. The grant comes from
    /// [`tm_tile::request_tile_permission`].
    pub fn hardware(grant: tm_tile::TileGrant) -> Self {
        BlockedGemm::new(tm_tile::AmxTileUnit::new(grant))
    }
}

impl<U: TileUnit> BlockedGemm<U> {
    /// Configure `unit` for int8 matmul and wrap it.
    pub fn new(unit: U) -> Self {
        BlockedGemm {
            session: TileSession::open(unit, TileConfig::matmul()),
            scratch: Scratch::new(),
        }
    }

    /// Returns the name of the underlying tile unit (e.g., "amx").
    pub fn backend_name(&self) -> &str {
        self.session.unit_name()
    }

    /// Re-apply the engine's tile configuration.
    pub fn reconfigure(&mut self) {
        self.session.reconfigure(TileConfig::matmul());
    }

    /// Accumulating matrix multiplication: C += A @ B.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - `c`: row-major data of shape [m, n], added to (never overwritten)
    ///
    /// Sums wrap on 32-bit overflow. A zero dimension is a no-op.
    pub fn matmul_accumulate(
        &mut self,
        a: &[i8],
        b: &[i8],
        c: &mut [i32],
        m: usize,
        n: usize,
        k: usize,
    ) -> Result<()> {
        check_operands(a, b, c, m, n, k)?;

        for block in BlockGrid::new(m, n, k) {
            log::trace!(
                "{} block at ({}, {}, {}): {}x{}x{}",
                self.session.unit_name(),
                block.row,
                block.col,
                block.depth,
                block.rows,
                block.cols,
                block.depth_len
            );
            self.scratch.stage_a(a, k, &block);
            self.scratch.stage_b(b, n, &block);
            self.scratch.clear_output();

            self.session.load(LHS, self.scratch.a_bytes(), A_STRIDE);
            self.session.load(RHS, self.scratch.b_bytes(), B_STRIDE);
            self.session.load(DST, self.scratch.c_bytes(), C_STRIDE);
            self.session.multiply_accumulate(DST, LHS, RHS);
            self.session.store(DST, self.scratch.c_bytes_mut(), C_STRIDE);

            self.scratch.accumulate_into(c, n, &block);
        }
        Ok(())
    }

    /// Matrix multiplication into a fresh zeroed [m, n] buffer.
    pub fn matmul(&mut self, a: &[i8], b: &[i8], m: usize, n: usize, k: usize) -> Result<Vec<i32>> {
        let len = element_count("c", m, n)?;
        let mut c = vec![0i32; len];
        self.matmul_accumulate(a, b, &mut c, m, n, k)?;
        Ok(c)
    }

    /// Release the tile unit. Dropping the engine does the same.
    pub fn finish(self) {
        self.session.finish();
    }
}

/// Validate operand lengths against [m, k] @ [k, n] -> [m, n].
pub(crate) fn check_operands(
    a: &[i8],
    b: &[i8],
    c: &[i32],
    m: usize,
    n: usize,
    k: usize,
) -> Result<()> {
    for (operand, rows, cols, got) in [
        ("a", m, k, a.len()),
        ("b", k, n, b.len()),
        ("c", m, n, c.len()),
    ] {
        let expected = element_count(operand, rows, cols)?;
        if got != expected {
            return Err(GemmError::DimensionMismatch {
                operand,
                rows,
                cols,
                expected,
                got,
            });
        }
    }
    Ok(())
}

fn element_count(operand: &'static str, rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or(GemmError::SizeOverflow { operand, rows, cols })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::matmul_naive;

    #[test]
    fn test_exact_single_block_ones() {
        let mut g = BlockedGemm::emulated();
        let c = g.matmul(&[1; 16 * 64], &[1; 64 * 16], 16, 16, 64).unwrap();
        assert!(c.iter().all(|&v| v == 64));
    }

    #[test]
    fn test_one_past_each_boundary() {
        let (m, n, k) = (17, 17, 65);
        let a = vec![2i8; m * k];
        let b = vec![2i8; k * n];
        let mut g = BlockedGemm::emulated();
        let c = g.matmul(&a, &b, m, n, k).unwrap();
        assert!(c.iter().all(|&v| v == 260));

        let mut expected = vec![0i32; m * n];
        matmul_naive(&a, &b, &mut expected, m, n, k).unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_small_non_square() {
        // [1,2,3;4,5,6] @ [7,8;9,10;11,12] = [58,64;139,154]
        let a = [1i8, 2, 3, 4, 5, 6];
        let b = [7i8, 8, 9, 10, 11, 12];
        let mut g = BlockedGemm::emulated();
        assert_eq!(g.matmul(&a, &b, 2, 2, 3).unwrap(), vec![58, 64, 139, 154]);
    }

    #[test]
    fn test_accumulates_across_calls() {
        let a: Vec<i8> = (0..20 * 70).map(|i| (i % 17) as i8 - 8).collect();
        let b: Vec<i8> = (0..70 * 9).map(|i| (i % 13) as i8 - 6).collect();
        let mut g = BlockedGemm::emulated();
        let once = g.matmul(&a, &b, 20, 9, 70).unwrap();
        let mut c = vec![0i32; 20 * 9];
        g.matmul_accumulate(&a, &b, &mut c, 20, 9, 70).unwrap();
        g.matmul_accumulate(&a, &b, &mut c, 20, 9, 70).unwrap();
        let doubled: Vec<i32> = once.iter().map(|v| v * 2).collect();
        assert_eq!(c, doubled);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut g = BlockedGemm::emulated();
        let mut c = vec![0i32; 4];
        let err = g
            .matmul_accumulate(&[0; 4], &[0; 3], &mut c, 2, 2, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            GemmError::DimensionMismatch { operand: "b", expected: 4, got: 3, .. }
        ));
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        let mut g = BlockedGemm::emulated();
        let mut c = vec![0i32; 4];
        let err = g
            .matmul_accumulate(&[], &[0; 4], &mut c, usize::MAX / 2 + 1, 2, 2)
            .unwrap_err();
        assert!(matches!(err, GemmError::SizeOverflow { operand: "a", .. }));

        let err = g.matmul(&[], &[], usize::MAX / 2 + 1, 4, 0).unwrap_err();
        assert!(matches!(err, GemmError::SizeOverflow { operand: "c", .. }));
    }

    #[test]
    fn test_zero_dimension_is_noop() {
        let mut g = BlockedGemm::emulated();
        let mut c: Vec<i32> = vec![];
        g.matmul_accumulate(&[], &[], &mut c, 0, 0, 5).unwrap();
        let mut c = vec![3i32; 4];
        g.matmul_accumulate(&[], &[], &mut c, 2, 2, 0).unwrap();
        assert_eq!(c, vec![3; 4]);
    }

    #[test]
    fn test_reconfigure_keeps_results() {
        let a = vec![3i8; 16 * 64];
        let b = vec![-1i8; 64 * 16];
        let mut g = BlockedGemm::emulated();
        let before = g.matmul(&a, &b, 16, 16, 64).unwrap();
        g.reconfigure();
        g.reconfigure();
        assert_eq!(g.matmul(&a, &b, 16, 16, 64).unwrap(), before);
        assert_eq!(g.backend_name(), "emulated");
        g.finish();
    }
}
