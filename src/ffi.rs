//! C Foreign Function Interface for jpegxr-rs.
//!
//! Opaque handles and primitive values only, so a host runtime (for example an
//! emscripten module loader) can drive decoding without sharing any struct
//! layout beyond the 16-byte format GUID. Failures come back as sentinels:
//! null handles, `-1` for dimensions and copies.
//!
//! Export names match the jxrlib WebAssembly glue that JavaScript loaders
//! already call (`pixel_info_*` and `image_decode_*`). Each export is a thin
//! instantiation of a generic helper over [`Engine`].

use std::os::raw::{c_int, c_uchar, c_uint};
use std::ptr;

use tracing::debug;

use crate::decode::DecodeSession;
use crate::engine::Engine;
use crate::guid::FormatId;
use crate::pixel_format::PixelFormatDescriptor;

/// Opaque pixel-format descriptor handle.
#[repr(C)]
pub struct JpegXrPixelInfo {
    _private: [u8; 0],
}

/// Opaque decode session handle.
#[repr(C)]
pub struct JpegXrDecoder {
    _private: [u8; 0],
}

/// `format` must be null or point to a readable `FormatId`.
unsafe fn pixel_info_new<E: Engine>(
    engine: &E,
    format: *const FormatId,
) -> *mut JpegXrPixelInfo {
    if format.is_null() {
        return ptr::null_mut();
    }
    let format = unsafe { *format };
    match PixelFormatDescriptor::resolve(engine, &format) {
        Ok(desc) => Box::into_raw(Box::new(desc)) as *mut JpegXrPixelInfo,
        Err(_) => ptr::null_mut(),
    }
}

/// `info` must be null or a live handle.
unsafe fn pixel_info<'a>(info: *const JpegXrPixelInfo) -> Option<&'a PixelFormatDescriptor> {
    unsafe { (info as *const PixelFormatDescriptor).as_ref() }
}

/// The returned handle borrows both `engine` and the `len` bytes at `data`.
unsafe fn decoder_new<E: Engine>(
    engine: &E,
    data: *const c_uchar,
    len: usize,
) -> *mut JpegXrDecoder {
    if data.is_null() {
        return ptr::null_mut();
    }
    let buffer = unsafe { std::slice::from_raw_parts(data, len) };
    match DecodeSession::open(engine, buffer) {
        Ok(session) => Box::into_raw(Box::new(session)) as *mut JpegXrDecoder,
        Err(e) => {
            debug!(error = %e, "image_decode_with_memory failed");
            ptr::null_mut()
        }
    }
}

/// `decoder` must be null or a live handle created by `decoder_new::<E>`.
unsafe fn session<'a, E: Engine>(
    decoder: *mut JpegXrDecoder,
) -> Option<&'a mut DecodeSession<'a, E>> {
    unsafe { (decoder as *mut DecodeSession<'a, E>).as_mut() }
}

unsafe fn decoder_pixel_info<E: Engine>(decoder: *mut JpegXrDecoder) -> *mut JpegXrPixelInfo {
    let Some(session) = (unsafe { session::<E>(decoder) }) else {
        return ptr::null_mut();
    };
    match session.pixel_format() {
        Ok(desc) => Box::into_raw(Box::new(desc)) as *mut JpegXrPixelInfo,
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn decoder_width<E: Engine>(decoder: *mut JpegXrDecoder) -> c_int {
    match unsafe { session::<E>(decoder) } {
        Some(session) => session.width().unwrap_or(-1),
        None => -1,
    }
}

unsafe fn decoder_height<E: Engine>(decoder: *mut JpegXrDecoder) -> c_int {
    match unsafe { session::<E>(decoder) } {
        Some(session) => session.height().unwrap_or(-1),
        None => -1,
    }
}

unsafe fn decoder_copy_all<E: Engine>(
    decoder: *mut JpegXrDecoder,
    dest: *mut c_uchar,
    stride: usize,
) -> c_int {
    let Some(session) = (unsafe { session::<E>(decoder) }) else {
        return -1;
    };
    match unsafe { session.copy_all_unchecked(dest, stride) } {
        Ok(()) => 0,
        Err(e) => {
            debug!(error = %e, stride, "image_decode_copy_all failed");
            -1
        }
    }
}

unsafe fn decoder_free<E: Engine>(decoder: *mut JpegXrDecoder) {
    if !decoder.is_null() {
        let _ = unsafe { Box::from_raw(decoder as *mut DecodeSession<'_, E>) };
    }
}

/// Free a pixel-format handle. Null is ignored.
///
/// # Safety
/// `info` must be null or a handle that has not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_free(info: *mut JpegXrPixelInfo) {
    if !info.is_null() {
        let _ = unsafe { Box::from_raw(info as *mut PixelFormatDescriptor) };
    }
}

/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_channels(info: *const JpegXrPixelInfo) -> usize {
    unsafe { pixel_info(info) }.map_or(0, |d| d.channels())
}

/// Raw engine color-format code.
///
/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_color_format(info: *const JpegXrPixelInfo) -> c_int {
    unsafe { pixel_info(info) }.map_or(-1, |d| d.color_format_code())
}

/// Raw engine bit-depth code.
///
/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_bit_depth(info: *const JpegXrPixelInfo) -> c_int {
    unsafe { pixel_info(info) }.map_or(-1, |d| d.bit_depth_code())
}

/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_bits_per_pixel(info: *const JpegXrPixelInfo) -> usize {
    unsafe { pixel_info(info) }.map_or(0, |d| d.bits_per_pixel() as usize)
}

/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_has_alpha(info: *const JpegXrPixelInfo) -> bool {
    unsafe { pixel_info(info) }.is_some_and(|d| d.has_alpha())
}

/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_premultiplied_alpha(
    info: *const JpegXrPixelInfo,
) -> bool {
    unsafe { pixel_info(info) }.is_some_and(|d| d.premultiplied_alpha())
}

/// True when channels are stored in reversed (BGR) order.
///
/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_bgr(info: *const JpegXrPixelInfo) -> bool {
    unsafe { pixel_info(info) }.is_some_and(|d| d.is_bgr())
}

/// Raw engine photometric-interpretation code.
///
/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_photometric_interpretation(
    info: *const JpegXrPixelInfo,
) -> c_uint {
    unsafe { pixel_info(info) }.map_or(0, |d| d.photometric_interpretation_code())
}

/// # Safety
/// `info` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixel_info_samples_per_pixel(
    info: *const JpegXrPixelInfo,
) -> usize {
    unsafe { pixel_info(info) }.map_or(0, |d| d.samples_per_pixel() as usize)
}

#[cfg(feature = "ffi")]
mod exports {
    use super::*;
    use crate::jxrlib::Jxrlib;

    static JXRLIB: Jxrlib = Jxrlib;

    /// Resolve a format GUID. Returns null when jxrlib does not know it.
    ///
    /// # Safety
    /// `format` must be null or point to a 16-byte GUID.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn pixel_info_from_guid(
        format: *const FormatId,
    ) -> *mut JpegXrPixelInfo {
        unsafe { pixel_info_new(&JXRLIB, format) }
    }

    /// Open a decoder over `len` bytes at `data`. The bytes are not copied and
    /// must stay valid until `image_decode_free`.
    ///
    /// # Safety
    /// `data` must be a valid pointer to `len` bytes.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn image_decode_with_memory(
        data: *const c_uchar,
        len: usize,
    ) -> *mut JpegXrDecoder {
        unsafe { decoder_new(&JXRLIB, data, len) }
    }

    /// Pixel format of the image, as a new handle the caller must free.
    ///
    /// # Safety
    /// `decoder` must be null or a live handle.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn image_decode_pixel_info(
        decoder: *mut JpegXrDecoder,
    ) -> *mut JpegXrPixelInfo {
        unsafe { decoder_pixel_info::<Jxrlib>(decoder) }
    }

    /// Width in pixels, or -1.
    ///
    /// # Safety
    /// `decoder` must be null or a live handle.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn image_decode_width(decoder: *mut JpegXrDecoder) -> c_int {
        unsafe { decoder_width::<Jxrlib>(decoder) }
    }

    /// Height in pixels, or -1.
    ///
    /// # Safety
    /// `decoder` must be null or a live handle.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn image_decode_height(decoder: *mut JpegXrDecoder) -> c_int {
        unsafe { decoder_height::<Jxrlib>(decoder) }
    }

    /// Decode the whole image into `dest`. Returns 0 on success, -1 on failure.
    ///
    /// # Safety
    /// `dest` must have room for `stride * height` bytes and `stride` must hold
    /// a full row. Neither is checked.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn image_decode_copy_all(
        decoder: *mut JpegXrDecoder,
        dest: *mut c_uchar,
        stride: usize,
    ) -> c_int {
        unsafe { decoder_copy_all::<Jxrlib>(decoder, dest, stride) }
    }

    /// Release the decoder and close its stream. Null is ignored.
    ///
    /// # Safety
    /// `decoder` must be null or a handle that has not been freed yet.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn image_decode_free(decoder: *mut JpegXrDecoder) {
        unsafe { decoder_free::<Jxrlib>(decoder) }
    }
}

#[cfg(feature = "ffi")]
pub use exports::*;
