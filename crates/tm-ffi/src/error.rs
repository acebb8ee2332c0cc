use std::cell::RefCell;
use std::ffi::CString;

use tm_gemm::GemmError;

use crate::types::TMStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `msg` for `tm_last_error` and hand back `status`.
///
/// Interior NUL bytes would truncate the message on the C side, so they are
/// replaced rather than dropping the whole message.
pub(crate) fn fail(status: TMStatus, msg: impl Into<String>) -> TMStatus {
    let mut msg = msg.into();
    if msg.contains('\0') {
        msg = msg.replace('\0', "\\0");
    }
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
    status
}

/// Record a gemm error under `context` and map it to its status code.
pub(crate) fn fail_with(context: &str, err: &GemmError) -> TMStatus {
    fail(TMStatus::from(err), format!("{}: {}", context, err))
}

/// Take the last error message, leaving `None` in its place.
pub(crate) fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}
