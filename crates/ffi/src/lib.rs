//! C ABI for the objrec detector bank.
//!
//! Every entry point returns a heap struct that the caller owns and
//! releases with the paired free function. Failures never unwind into the
//! caller: they are reported through `err_code` and `err_str`.

use std::ffi::{c_char, c_int, c_long, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;
use std::sync::Once;

use objrec_core::shared::error::ImageLoadError;
use objrec_core::{ErrorCode, ObjectRecognizer, RecognitionError, RecognizerConfig};

mod marshal;

pub const OBJREC_NO_ERROR: c_int = ErrorCode::None as c_int;
pub const OBJREC_SERIALIZATION_ERROR: c_int = ErrorCode::Serialization as c_int;
pub const OBJREC_IMAGE_LOAD_ERROR: c_int = ErrorCode::ImageLoad as c_int;
pub const OBJREC_UNKNOWN_ERROR: c_int = ErrorCode::Unknown as c_int;

/// Recognizer handle returned by [`objrec_init`].
///
/// `cls` is null whenever `err_code` is non-zero.
#[repr(C)]
#[derive(Debug)]
pub struct ObjRec {
    pub cls: *mut c_void,
    pub err_str: *mut c_char,
    pub err_code: c_int,
}

/// Result of one [`objrec_recognize`] call.
///
/// `rectangles` holds `4 * rect_count` values (left, top, right, bottom per
/// box) and is null when `rect_count` is zero.
#[repr(C)]
#[derive(Debug)]
pub struct ObjRet {
    pub rectangles: *mut c_long,
    pub rect_count: c_int,
    pub err_str: *mut c_char,
    pub err_code: c_int,
}

impl ObjRec {
    fn empty() -> Self {
        Self {
            cls: ptr::null_mut(),
            err_str: ptr::null_mut(),
            err_code: OBJREC_NO_ERROR,
        }
    }

    fn set_error(&mut self, err: &RecognitionError) {
        self.err_code = err.code().as_i32();
        self.err_str = marshal::message_to_c(err.message());
    }
}

impl ObjRet {
    fn empty() -> Self {
        Self {
            rectangles: ptr::null_mut(),
            rect_count: 0,
            err_str: ptr::null_mut(),
            err_code: OBJREC_NO_ERROR,
        }
    }

    fn set_error(&mut self, err: &RecognitionError) {
        self.err_code = err.code().as_i32();
        self.err_str = marshal::message_to_c(err.message());
    }
}

static LOGGER: Once = Once::new();

/// Installs `env_logger` unless the host process already set a logger.
fn init_logging() {
    LOGGER.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("warn");
        let _ = env_logger::Builder::from_env(env).try_init();
    });
}

/// Runs `f`, turning a panic into an unknown error.
fn guarded<T>(f: impl FnOnce() -> Result<T, RecognitionError>) -> Result<T, RecognitionError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown error".to_string());
        Err(RecognitionError::Unknown(message))
    })
}

unsafe fn open_recognizer(
    model_dir: *const c_char,
    len: c_int,
) -> Result<ObjectRecognizer, RecognitionError> {
    if model_dir.is_null() {
        return Err(RecognitionError::Unknown("model directory is null".into()));
    }
    let dir = CStr::from_ptr(model_dir).to_str().map_err(|e| {
        RecognitionError::Unknown(format!("model directory is not valid UTF-8: {e}"))
    })?;
    let count = usize::try_from(len).map_err(|_| {
        RecognitionError::Serialization(format!("invalid detector count {len}"))
    })?;
    ObjectRecognizer::open(&RecognizerConfig::new(dir, count))
}

unsafe fn recognizer_ref<'a>(rec: *const ObjRec) -> Result<&'a ObjectRecognizer, RecognitionError> {
    if rec.is_null() || (*rec).cls.is_null() {
        return Err(RecognitionError::Unknown(
            "recognizer handle is not initialized".into(),
        ));
    }
    Ok(&*((*rec).cls as *const ObjectRecognizer))
}

unsafe fn image_bytes<'a>(img_data: *const u8, len: c_int) -> Result<&'a [u8], RecognitionError> {
    if img_data.is_null() || len <= 0 {
        return Err(ImageLoadError::Empty.into());
    }
    Ok(slice::from_raw_parts(img_data, len as usize))
}

/// Loads `len` detectors (`detector.svm`, `detector1.svm`, ...) from
/// `model_dir`.
///
/// Never returns null. On failure `cls` is null and the error fields are
/// set; the handle must still be released with [`objrec_free`].
///
/// # Safety
/// `model_dir` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn objrec_init(model_dir: *const c_char, len: c_int) -> *mut ObjRec {
    init_logging();
    let mut rec = Box::new(ObjRec::empty());
    match guarded(|| open_recognizer(model_dir, len)) {
        Ok(recognizer) => rec.cls = Box::into_raw(Box::new(recognizer)) as *mut c_void,
        Err(err) => {
            log::error!("objrec_init failed: {err}");
            rec.set_error(&err);
        }
    }
    Box::into_raw(rec)
}

/// Decodes a JPEG buffer and runs every detector of `rec` on it.
///
/// Calls on the same handle are serialized. Never returns null; release
/// the result with [`objret_free`].
///
/// # Safety
/// `rec` must be null or a live handle from [`objrec_init`]; `img_data`
/// must be null or readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn objrec_recognize(
    rec: *mut ObjRec,
    img_data: *const u8,
    len: c_int,
) -> *mut ObjRet {
    let mut ret = Box::new(ObjRet::empty());
    let outcome = guarded(|| {
        let recognizer = recognizer_ref(rec)?;
        let data = image_bytes(img_data, len)?;
        let rects = recognizer.recognize_bytes(data)?;
        let count = c_int::try_from(rects.len())
            .map_err(|_| RecognitionError::Unknown(format!("too many rectangles: {}", rects.len())))?;
        Ok((marshal::rect_values(&rects)?, count))
    });

    match outcome {
        Ok((values, count)) => {
            ret.rectangles = marshal::rect_buffer(values);
            ret.rect_count = count;
        }
        Err(err) => {
            log::debug!("objrec_recognize failed: {err}");
            ret.set_error(&err);
        }
    }
    Box::into_raw(ret)
}

/// Destroys a handle and everything it owns. Null is ignored.
///
/// # Safety
/// `rec` must be null or come from [`objrec_init`], not be freed yet, and
/// have no recognition in flight.
#[no_mangle]
pub unsafe extern "C" fn objrec_free(rec: *mut ObjRec) {
    if rec.is_null() {
        return;
    }
    let rec = Box::from_raw(rec);
    if !rec.cls.is_null() {
        drop(Box::from_raw(rec.cls as *mut ObjectRecognizer));
    }
    marshal::free_message(rec.err_str);
}

/// Releases a recognition result, its rectangles and its message.
///
/// # Safety
/// `ret` must be null or come from [`objrec_recognize`] and not be freed
/// yet. Its fields must not have been modified.
#[no_mangle]
pub unsafe extern "C" fn objret_free(ret: *mut ObjRet) {
    if ret.is_null() {
        return;
    }
    let ret = Box::from_raw(ret);
    marshal::free_rect_buffer(ret.rectangles, ret.rect_count.max(0) as usize);
    marshal::free_message(ret.err_str);
}

/// Library version as a static NUL-terminated string; do not free.
#[no_mangle]
pub extern "C" fn objrec_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
