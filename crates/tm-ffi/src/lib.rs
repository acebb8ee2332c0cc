mod types;
mod error;
mod context;

pub use types::*;
pub use context::*;

use std::ffi::CString;
use std::os::raw::c_char;

use tm_gemm::{build_engine, EngineConfig};

use crate::error::{fail, fail_with};

/// Execute a closure that returns a `TMStatus`, catching any panics
/// and converting them into `TMStatus::ErrorInternal`.
///
/// The engine behind a handle holds a boxed tile unit, which is not
/// `RefUnwindSafe`; after a panic the handle should only be destroyed.
fn catch_panic<F: FnOnce() -> TMStatus>(f: F) -> TMStatus {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => fail(TMStatus::ErrorInternal, "internal panic"),
    }
}

/// Create a blocked matmul engine.
///
/// Selecting `Hardware` requests tile data permission from the kernel and
/// fails with `ErrorUnsupported` or `ErrorPermission` when it is refused;
/// `Auto` falls back to emulation. On success, writes a heap-allocated
/// `TMEngine` pointer into `*engine_out`. The caller must later call
/// `tm_engine_destroy` on the same thread.
#[no_mangle]
pub extern "C" fn tm_engine_create(
    backend: TMBackendType,
    engine_out: *mut *mut TMEngine,
) -> TMStatus {
    catch_panic(|| {
        if engine_out.is_null() {
            return fail(TMStatus::ErrorInvalidArgument, "engine_out is null");
        }
        let config = EngineConfig::new(backend.into());
        let gemm = match build_engine(&config) {
            Ok(g) => g,
            Err(e) => return fail_with("failed to create engine", &e),
        };
        let engine = Box::new(TMEngine::new(gemm));
        unsafe {
            *engine_out = Box::into_raw(engine);
        }
        TMStatus::Ok
    })
}

/// Destroy an engine, releasing its tile unit.
///
/// Passing a null pointer is a no-op and returns `TMStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn tm_engine_destroy(engine: *mut TMEngine) -> TMStatus {
    if engine.is_null() {
        return TMStatus::Ok;
    }
    let engine = Box::from_raw(engine);
    engine.gemm.finish();
    TMStatus::Ok
}

/// Name of the tile unit driving `engine` ("amx" or "emulated").
///
/// The returned string is owned by the engine and valid until it is destroyed.
#[no_mangle]
pub unsafe extern "C" fn tm_backend_name(engine: *const TMEngine) -> *const c_char {
    if engine.is_null() {
        return std::ptr::null();
    }
    (*engine).name.as_ptr()
}

/// Accumulating int8 matrix multiplication: C += A @ B.
///
/// - `a`: row-major int8 [m, k]
/// - `b`: row-major int8 [k, n]
/// - `c`: row-major int32 [m, n], accumulated into
///
/// Pointers may be null only when the matching element count is zero.
#[no_mangle]
pub unsafe extern "C" fn tm_matmul_blocked(
    engine: *mut TMEngine,
    a: *const i8,
    b: *const i8,
    c: *mut i32,
    m: usize,
    n: usize,
    k: usize,
) -> TMStatus {
    catch_panic(|| {
        if engine.is_null() {
            return fail(TMStatus::ErrorInvalidArgument, "engine is null");
        }
        let (a_len, b_len, c_len) = match (m.checked_mul(k), k.checked_mul(n), m.checked_mul(n)) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => {
                return fail(
                    TMStatus::ErrorInvalidArgument,
                    format!("dimensions overflow: m={} n={} k={}", m, n, k),
                )
            }
        };
        if (a.is_null() && a_len > 0) || (b.is_null() && b_len > 0) || (c.is_null() && c_len > 0) {
            return fail(TMStatus::ErrorInvalidArgument, "null matrix argument");
        }

        let engine = unsafe { &mut *engine };
        let a = unsafe { slice_or_empty(a, a_len) };
        let b = unsafe { slice_or_empty(b, b_len) };
        let c: &mut [i32] = if c_len == 0 {
            &mut []
        } else {
            unsafe { std::slice::from_raw_parts_mut(c, c_len) }
        };

        match engine.gemm.matmul_accumulate(a, b, c, m, n, k) {
            Ok(()) => TMStatus::Ok,
            Err(e) => fail_with("matmul failed", &e),
        }
    })
}

unsafe fn slice_or_empty<'a>(ptr: *const i8, len: usize) -> &'a [i8] {
    if len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len)
    }
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `tm_free_string`.
#[no_mangle]
pub extern "C" fn tm_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `tm_last_error`.
#[no_mangle]
pub unsafe extern "C" fn tm_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
