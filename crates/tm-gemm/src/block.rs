/// Output rows per block (lhs tile rows).
pub const BLOCK_M: usize = 16;

/// Output columns per block. Each column takes one 32-bit lane of the
/// destination tile, so 16 columns fill a 64-byte row.
pub const BLOCK_N: usize = 16;

/// Reduction depth per block (lhs tile width in bytes).
pub const BLOCK_K: usize = 64;

/// One cell of the block grid: nominal origin plus actual extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// First row of A / C covered by this block.
    pub row: usize,
    /// First column of B / C covered by this block.
    pub col: usize,
    /// First reduction index covered by this block.
    pub depth: usize,
    /// Actual rows, `min(BLOCK_M, m - row)`.
    pub rows: usize,
    /// Actual columns, `min(BLOCK_N, n - col)`.
    pub cols: usize,
    /// Actual reduction length, `min(BLOCK_K, k - depth)`.
    pub depth_len: usize,
}

impl Block {
    /// True when the block falls short of the nominal extent on any axis.
    pub fn is_partial(&self) -> bool {
        self.rows < BLOCK_M || self.cols < BLOCK_N || self.depth_len < BLOCK_K
    }
}

/// Iterates an M x N x K problem block by block: row blocks outermost,
/// column blocks in the middle, reduction blocks innermost.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    m: usize,
    n: usize,
    k: usize,
    row: usize,
    col: usize,
    depth: usize,
}

impl BlockGrid {
    pub fn new(m: usize, n: usize, k: usize) -> Self {
        BlockGrid {
            m,
            n,
            k,
            row: 0,
            col: 0,
            depth: 0,
        }
    }

    /// Number of blocks along (M, N, K).
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            self.m.div_ceil(BLOCK_M),
            self.n.div_ceil(BLOCK_N),
            self.k.div_ceil(BLOCK_K),
        )
    }

    /// Total number of grid cells.
    pub fn block_count(&self) -> usize {
        let (bm, bn, bk) = self.dims();
        bm * bn * bk
    }
}

impl Iterator for BlockGrid {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.m == 0 || self.n == 0 || self.k == 0 || self.row >= self.m {
            return None;
        }

        let block = Block {
            row: self.row,
            col: self.col,
            depth: self.depth,
            rows: BLOCK_M.min(self.m - self.row),
            cols: BLOCK_N.min(self.n - self.col),
            depth_len: BLOCK_K.min(self.k - self.depth),
        };

        self.depth += BLOCK_K;
        if self.depth >= self.k {
            self.depth = 0;
            self.col += BLOCK_N;
            if self.col >= self.n {
                self.col = 0;
                self.row += BLOCK_M;
            }
        }

        Some(block)
    }
}
