use crate::block::{Block, BLOCK_K, BLOCK_M, BLOCK_N};

/// Bytes per K-group in the interleaved rhs layout.
const QUAD: usize = 4;

/// Row stride of the lhs staging tile in bytes.
pub const A_STRIDE: usize = BLOCK_K;
/// Row stride of the interleaved rhs staging tile in bytes.
pub const B_STRIDE: usize = BLOCK_N * QUAD;
/// Row stride of the output staging tile in bytes.
pub const C_STRIDE: usize = BLOCK_N * std::mem::size_of::<i32>();

const A_LEN: usize = BLOCK_M * BLOCK_K;
const B_LEN: usize = (BLOCK_K / QUAD) * B_STRIDE;
const C_LEN: usize = BLOCK_M * BLOCK_N;

#[repr(C, align(64))]
struct Aligned<T>(T);

/// Tile-shaped staging buffers, allocated once and reused for every block.
///
/// A partial block zeroes the whole buffer before its actual extent is
/// copied, so padding always contributes zero. A full block overwrites every
/// byte and skips the clear.
pub struct Scratch {
    a: Box<Aligned<[i8; A_LEN]>>,
    b: Box<Aligned<[i8; B_LEN]>>,
    c: Box<Aligned<[i32; C_LEN]>>,
}

impl Scratch {
    pub fn new() -> Self {
        Scratch {
            a: Box::new(Aligned([0; A_LEN])),
            b: Box::new(Aligned([0; B_LEN])),
            c: Box::new(Aligned([0; C_LEN])),
        }
    }

    /// Copy the A sub-block (`rows x depth_len`) of an M x K row-major matrix.
    pub fn stage_a(&mut self, a: &[i8], k: usize, block: &Block) {
        let tile = &mut self.a.0;
        if block.is_partial() {
            tile.fill(0);
        }
        for r in 0..block.rows {
            let src = (block.row + r) * k + block.depth;
            tile[r * A_STRIDE..r * A_STRIDE + block.depth_len]
                .copy_from_slice(&a[src..src + block.depth_len]);
        }
    }

    /// Copy the B sub-block (`depth_len x cols`) of a K x N row-major matrix
    /// into the interleaved layout: reduction index `kk` of column `c` lands
    /// in row `kk / 4`, byte `4 * c + kk % 4`.
    pub fn stage_b(&mut self, b: &[i8], n: usize, block: &Block) {
        let tile = &mut self.b.0;
        if block.is_partial() {
            tile.fill(0);
        }
        for kk in 0..block.depth_len {
            let src = (block.depth + kk) * n + block.col;
            let row = &b[src..src + block.cols];
            let base = (kk / QUAD) * B_STRIDE + kk % QUAD;
            for (c, &v) in row.iter().enumerate() {
                tile[base + c * QUAD] = v;
            }
        }
    }

    /// Zero the output staging tile.
    pub fn clear_output(&mut self) {
        self.c.0.fill(0);
    }

    /// Add the block's actual extent of the output tile into the M x N
    /// matrix `c` (wrapping).
    pub fn accumulate_into(&self, c: &mut [i32], n: usize, block: &Block) {
        let tile = &self.c.0;
        for r in 0..block.rows {
            let dst = (block.row + r) * n + block.col;
            let partial = &tile[r * BLOCK_N..r * BLOCK_N + block.cols];
            for (out, &p) in c[dst..dst + block.cols].iter_mut().zip(partial) {
                *out = out.wrapping_add(p);
            }
        }
    }

    pub fn a_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.a.0[..])
    }

    pub fn b_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.b.0[..])
    }

    pub fn c_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.c.0[..])
    }

    pub fn c_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.c.0[..])
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scratch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scratch")
            .field("a_stride", &A_STRIDE)
            .field("b_stride", &B_STRIDE)
            .field("c_stride", &C_STRIDE)
            .finish()
    }
}
