//! Throughput harness for the blocked engine.
//!
//! Usage: `tm-bench [M N K ITERS]` (defaults 128 64 64 100). The backend is
//! picked from `TILEMM_BACKEND` (auto, amx, emulated).

use std::process::ExitCode;
use std::time::Instant;

use tm_gemm::{build_engine, matmul_naive, DynGemm, EngineConfig, Result};

const WARMUP: usize = 10;
const FILL: i8 = 2;

struct Args {
    m: usize,
    n: usize,
    k: usize,
    iters: usize,
}

fn parse_args() -> std::result::Result<Args, String> {
    let vals: Vec<usize> = std::env::args()
        .skip(1)
        .map(|a| a.parse::<usize>().map_err(|e| format!("bad argument '{}': {}", a, e)))
        .collect::<std::result::Result<_, _>>()?;
    match vals.as_slice() {
        [] => Ok(Args { m: 128, n: 64, k: 64, iters: 100 }),
        [m, n, k] => Ok(Args { m: *m, n: *n, k: *k, iters: 100 }),
        [m, n, k, iters] => Ok(Args { m: *m, n: *n, k: *k, iters: *iters }),
        _ => Err("usage: tm-bench [M N K [ITERS]]".to_string()),
    }
}

/// One native 16x16x64 block of twos; every output must be 256.
fn smoke(engine: &mut DynGemm) -> Result<bool> {
    let c = engine.matmul(&[FILL; 16 * 64], &[FILL; 64 * 16], 16, 16, 64)?;
    Ok(c.iter().all(|&v| v == 256))
}

fn run(args: &Args, config: &EngineConfig) -> Result<bool> {
    let mut engine = build_engine(config)?;
    println!("backend: {}", engine.backend_name());

    if !smoke(&mut engine)? {
        eprintln!("single-tile smoke test produced wrong values");
        return Ok(false);
    }

    let Args { m, n, k, iters } = *args;
    let a = vec![FILL; m * k];
    let b = vec![FILL; k * n];
    let mut c = vec![0i32; m * n];

    for _ in 0..WARMUP {
        engine.matmul_accumulate(&a, &b, &mut c, m, n, k)?;
    }
    c.fill(0);

    let start = Instant::now();
    for _ in 0..iters {
        engine.matmul_accumulate(&a, &b, &mut c, m, n, k)?;
    }
    let elapsed = start.elapsed();
    engine.finish();

    let avg_us = elapsed.as_secs_f64() * 1e6 / iters.max(1) as f64;
    println!("[{}x{}] @ [{}x{}] x {} iters: avg_infer_time = {:.4} us", m, k, k, n, iters, avg_us);

    let mut expected = vec![0i32; m * n];
    matmul_naive(&a, &b, &mut expected, m, n, k)?;
    let scale = iters as i32;
    let ok = c
        .iter()
        .zip(&expected)
        .all(|(&got, &want)| got == want.wrapping_mul(scale));
    if !ok {
        eprintln!("blocked result disagrees with the naive product");
    }
    Ok(ok)
}

/// Process exit status for a run: 0 on a verified result, 1 otherwise.
fn exit_status(args: &Args, config: &EngineConfig) -> u8 {
    match run(args, config) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("tm-bench: {}", e);
            1
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    let config = match EngineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("tm-bench: {}", e);
            return ExitCode::FAILURE;
        }
    };
    ExitCode::from(exit_status(&args, &config))
}
