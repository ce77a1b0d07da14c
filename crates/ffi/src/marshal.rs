//! Ownership transfer of strings and rectangle buffers to C callers.
//!
//! Everything allocated here is released by the paired `free_*` function
//! in this module, never by the C allocator.

use std::ffi::{c_char, c_long, CString};
use std::ptr;

use objrec_core::shared::constants::RECT_LEN;
use objrec_core::{RecognitionError, Rectangle};

/// Copies `message` into a heap C string, dropping interior NULs.
pub(crate) fn message_to_c(message: &str) -> *mut c_char {
    let cleaned: String = message.chars().filter(|&c| c != '\0').collect();
    CString::new(cleaned)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// # Safety
/// `raw` must be null or come from [`message_to_c`] and not be freed yet.
pub(crate) unsafe fn free_message(raw: *mut c_char) {
    if !raw.is_null() {
        drop(CString::from_raw(raw));
    }
}

/// Flattens rectangles into `[left, top, right, bottom, ...]`.
///
/// Fails when a coordinate does not fit in a C `long` (32-bit on LLP64
/// targets).
pub(crate) fn rect_values(rects: &[Rectangle]) -> Result<Vec<c_long>, RecognitionError> {
    rects
        .iter()
        .flat_map(|r| r.to_array())
        .map(|v| {
            c_long::try_from(v).map_err(|_| {
                RecognitionError::Unknown(format!("coordinate {v} does not fit in a C long"))
            })
        })
        .collect()
}

/// Hands `values` to the caller. Returns null for an empty buffer.
pub(crate) fn rect_buffer(values: Vec<c_long>) -> *mut c_long {
    if values.is_empty() {
        return ptr::null_mut();
    }
    Box::into_raw(values.into_boxed_slice()) as *mut c_long
}

/// # Safety
/// `raw` must be null or come from [`rect_buffer`] called with exactly
/// `rect_count` rectangles, and not be freed yet.
pub(crate) unsafe fn free_rect_buffer(raw: *mut c_long, rect_count: usize) {
    if raw.is_null() {
        return;
    }
    let slice = ptr::slice_from_raw_parts_mut(raw, rect_count * RECT_LEN);
    drop(Box::from_raw(slice));
}
