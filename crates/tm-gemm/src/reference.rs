use crate::error::Result;
use crate::engine::check_operands;

/// Straightforward triple-loop product accumulated into `c`:
/// `c[i][j] += sum_p a[i][p] * b[p][j]`, with wrapping 32-bit arithmetic.
///
/// - `a`: row-major [m, k]
/// - `b`: row-major [k, n]
/// - `c`: row-major [m, n]
pub fn matmul_naive(
    a: &[i8],
    b: &[i8],
    c: &mut [i32],
    m: usize,
    n: usize,
    k: usize,
) -> Result<()> {
    check_operands(a, b, c, m, n, k)?;

    for i in 0..m {
        for j in 0..n {
            let mut sum = 0i32;
            for p in 0..k {
                sum = sum.wrapping_add(a[i * k + p] as i32 * b[p * n + j] as i32);
            }
            c[i * n + j] = c[i * n + j].wrapping_add(sum);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_basic() {
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let a = [1i8, 2, 3, 4];
        let b = [5i8, 6, 7, 8];
        let mut c = [0i32; 4];
        matmul_naive(&a, &b, &mut c, 2, 2, 2).unwrap();
        assert_eq!(c, [19, 22, 43, 50]);
    }

    #[test]
    fn test_naive_accumulates() {
        let a = [1i8, 0, 0, 1];
        let b = [1i8, 2, 3, 4];
        let mut c = [100i32; 4];
        matmul_naive(&a, &b, &mut c, 2, 2, 2).unwrap();
        assert_eq!(c, [101, 102, 103, 104]);
    }

    #[test]
    fn test_naive_rejects_short_operand() {
        let mut c = [0i32; 4];
        assert!(matmul_naive(&[1, 2, 3], &[1, 2, 3, 4], &mut c, 2, 2, 2).is_err());
    }
}
