use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tm_gemm::{matmul_naive, BlockedGemm, BLOCK_K, BLOCK_M, BLOCK_N};
use tm_tile::{EmulatedTileUnit, TileUnit};

fn random_i8(rng: &mut StdRng, len: usize) -> Vec<i8> {
    (0..len).map(|_| rng.gen::<i8>()).collect()
}

fn naive(a: &[i8], b: &[i8], m: usize, n: usize, k: usize) -> Vec<i32> {
    let mut c = vec![0i32; m * n];
    matmul_naive(a, b, &mut c, m, n, k).unwrap();
    c
}

fn check_against_naive<U: TileUnit>(engine: &mut BlockedGemm<U>, rng: &mut StdRng, m: usize, n: usize, k: usize) {
    let a = random_i8(rng, m * k);
    let b = random_i8(rng, k * n);
    let got = engine.matmul(&a, &b, m, n, k).unwrap();
    assert_eq!(got, naive(&a, &b, m, n, k), "mismatch for m={m} n={n} k={k}");
}

#[test]
fn test_random_matches_naive_across_boundaries() {
    let mut rng = StdRng::seed_from_u64(0x7113);
    let mut engine = BlockedGemm::emulated();
    let sizes = [1, 3, BLOCK_M - 1, BLOCK_M, BLOCK_M + 1, 2 * BLOCK_N + 5];
    let depths = [1, 4, 5, BLOCK_K - 1, BLOCK_K, BLOCK_K + 1, 3 * BLOCK_K + 7];
    for &m in &sizes {
        for &n in &sizes {
            for &k in &depths {
                check_against_naive(&mut engine, &mut rng, m, n, k);
            }
        }
    }
}

#[test]
fn test_random_shapes() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut engine = BlockedGemm::emulated();
    for _ in 0..20 {
        let m = rng.gen_range(1..70);
        let n = rng.gen_range(1..70);
        let k = rng.gen_range(1..200);
        check_against_naive(&mut engine, &mut rng, m, n, k);
    }
}

#[test]
fn test_constant_twos_one_past_boundary() {
    let (m, n, k) = (17, 17, 65);
    let mut engine = BlockedGemm::emulated();
    let c = engine
        .matmul(&vec![2; m * k], &vec![2; k * n], m, n, k)
        .unwrap();
    assert_eq!(c.len(), 17 * 17);
    assert!(c.iter().all(|&v| v == 260));
}

#[test]
fn test_benchmark_shape_accumulates() {
    let (m, n, k) = (128, 64, 64);
    let mut engine = BlockedGemm::emulated();
    let mut c = vec![0i32; m * n];
    for _ in 0..3 {
        engine
            .matmul_accumulate(&vec![2; m * k], &vec![2; k * n], &mut c, m, n, k)
            .unwrap();
    }
    assert!(c.iter().all(|&v| v == 3 * 256));
}

#[test]
fn test_twice_is_double() {
    let mut rng = StdRng::seed_from_u64(7);
    let (m, n, k) = (33, 18, 130);
    let a = random_i8(&mut rng, m * k);
    let b = random_i8(&mut rng, k * n);
    let mut engine = BlockedGemm::emulated();
    let mut c = vec![0i32; m * n];
    engine.matmul_accumulate(&a, &b, &mut c, m, n, k).unwrap();
    engine.matmul_accumulate(&a, &b, &mut c, m, n, k).unwrap();
    let single = naive(&a, &b, m, n, k);
    let doubled: Vec<i32> = single.iter().map(|v| v.wrapping_mul(2)).collect();
    assert_eq!(c, doubled);
}

#[test]
fn test_accumulates_onto_existing_values() {
    let mut rng = StdRng::seed_from_u64(99);
    let (m, n, k) = (5, 21, 66);
    let a = random_i8(&mut rng, m * k);
    let b = random_i8(&mut rng, k * n);
    let start: Vec<i32> = (0..(m * n) as i32).collect();

    let mut blocked = start.clone();
    BlockedGemm::emulated()
        .matmul_accumulate(&a, &b, &mut blocked, m, n, k)
        .unwrap();
    let mut reference = start;
    matmul_naive(&a, &b, &mut reference, m, n, k).unwrap();
    assert_eq!(blocked, reference);
}

#[test]
fn test_zero_inputs_leave_zero_output() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut engine = BlockedGemm::emulated();
    for &(m, n, k) in &[(1, 1, 1), (16, 16, 64), (19, 40, 150)] {
        let noise = random_i8(&mut rng, (m + n) * k);
        let c = engine
            .matmul(&vec![0; m * k], &noise[..k * n], m, n, k)
            .unwrap();
        assert!(c.iter().all(|&v| v == 0));
        let c = engine
            .matmul(&noise[..m * k], &vec![0; k * n], m, n, k)
            .unwrap();
        assert!(c.iter().all(|&v| v == 0));
    }
}

#[test]
fn test_wraparound_matches_naive() {
    // Starting near i32::MAX, the sum has to wrap.
    let (m, n, k) = (2, 3, 4096);
    let a = vec![-128i8; m * k];
    let b = vec![-128i8; k * n];
    let mut start = vec![i32::MAX - 5; m * n];
    let mut reference = start.clone();
    BlockedGemm::emulated()
        .matmul_accumulate(&a, &b, &mut start, m, n, k)
        .unwrap();
    matmul_naive(&a, &b, &mut reference, m, n, k).unwrap();
    assert_eq!(start, reference);
}

#[test]
fn test_boxed_unit_engine() {
    let mut rng = StdRng::seed_from_u64(11);
    let unit: Box<dyn TileUnit> = Box::new(EmulatedTileUnit::new());
    let mut engine = BlockedGemm::new(unit);
    check_against_naive(&mut engine, &mut rng, 30, 31, 129);
}

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
#[test]
fn test_hardware_matches_naive() {
    let Ok(grant) = tm_tile::request_tile_permission() else {
        return;
    };
    let mut rng = StdRng::seed_from_u64(0xa3);
    let mut engine = BlockedGemm::hardware(grant);
    for &(m, n, k) in &[(16, 16, 64), (17, 17, 65), (1, 50, 3), (70, 9, 300)] {
        check_against_naive(&mut engine, &mut rng, m, n, k);
    }
    engine.finish();
}
