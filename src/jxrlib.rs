//! Native engine backed by jxrlib.
//!
//! Every call goes through `csrc/jxr_shim.c`, so the only layouts shared with
//! C are `FormatId` (jxrlib's `GUID`) and `RawPixelInfo`.

use std::io::{self, Read, Seek, SeekFrom};
use std::os::raw::{c_int, c_void};
use std::{ptr, slice};

use tracing::{debug, warn};

use crate::decode::Rect;
use crate::engine::{Decoder, Engine};
use crate::error::{CodecError, JxrError, Result};
use crate::guid::FormatId;
use crate::pixel_format::RawPixelInfo;

mod sys {
    use std::os::raw::{c_int, c_void};

    use crate::guid::FormatId;
    use crate::pixel_format::RawPixelInfo;

    /// `struct WMPStream`.
    #[repr(C)]
    pub struct WmpStream {
        _private: [u8; 0],
    }

    /// `PKImageDecode`.
    #[repr(C)]
    pub struct PkImageDecode {
        _private: [u8; 0],
    }

    pub type ReadFn = unsafe extern "C" fn(*mut c_void, *mut c_void, usize) -> c_int;
    pub type WriteFn = unsafe extern "C" fn(*mut c_void, *const c_void, usize) -> c_int;
    pub type SetPosFn = unsafe extern "C" fn(*mut c_void, usize) -> c_int;
    pub type GetPosFn = unsafe extern "C" fn(*mut c_void, *mut usize) -> c_int;

    /// `jxr_shim_stream_callbacks`. A missing entry fails with `WMP_errFileIO`.
    #[repr(C)]
    pub struct StreamCallbacks {
        pub read: Option<ReadFn>,
        pub write: Option<WriteFn>,
        pub set_pos: Option<SetPosFn>,
        pub get_pos: Option<GetPosFn>,
    }

    unsafe extern "C" {
        pub fn jxr_shim_pixel_format_lookup(
            format: *const FormatId,
            out: *mut RawPixelInfo,
        ) -> c_int;
        pub fn jxr_shim_stream_open_memory(
            bytes: *const c_void,
            len: usize,
            out: *mut *mut WmpStream,
        ) -> c_int;
        pub fn jxr_shim_stream_open_callbacks(
            ctx: *mut c_void,
            callbacks: *const StreamCallbacks,
            out: *mut *mut WmpStream,
        ) -> c_int;
        pub fn jxr_shim_stream_close(stream: *mut *mut WmpStream) -> c_int;
        pub fn jxr_shim_decoder_create(out: *mut *mut PkImageDecode) -> c_int;
        pub fn jxr_shim_decoder_initialize(
            decoder: *mut PkImageDecode,
            stream: *mut WmpStream,
        ) -> c_int;
        pub fn jxr_shim_decoder_pixel_format(
            decoder: *mut PkImageDecode,
            out: *mut FormatId,
        ) -> c_int;
        pub fn jxr_shim_decoder_size(
            decoder: *mut PkImageDecode,
            width: *mut i32,
            height: *mut i32,
        ) -> c_int;
        pub fn jxr_shim_decoder_resolution(
            decoder: *mut PkImageDecode,
            horizontal: *mut f32,
            vertical: *mut f32,
        ) -> c_int;
        pub fn jxr_shim_decoder_copy(
            decoder: *mut PkImageDecode,
            x: i32,
            y: i32,
            width: i32,
            height: i32,
            dest: *mut u8,
            stride: u32,
        ) -> c_int;
        pub fn jxr_shim_decoder_release(decoder: *mut *mut PkImageDecode) -> c_int;
        #[cfg(test)]
        pub fn jxr_shim_encode_lossless(
            stream: *mut WmpStream,
            format: *const FormatId,
            width: i32,
            height: i32,
            pixels: *const u8,
            stride: u32,
        ) -> c_int;
    }
}

/// `WMP_errSuccess`.
const SUCCESS: c_int = 0;

fn io_status(result: io::Result<()>, op: &'static str) -> c_int {
    match result {
        Ok(()) => SUCCESS,
        Err(e) => {
            debug!(error = %e, op, "stream callback failed");
            CodecError::FileIo as c_int
        }
    }
}

unsafe extern "C" fn read_callback<R: Read>(
    ctx: *mut c_void,
    dest: *mut c_void,
    len: usize,
) -> c_int {
    if len == 0 {
        return SUCCESS;
    }
    let reader = unsafe { &mut *ctx.cast::<R>() };
    let dest = unsafe { slice::from_raw_parts_mut(dest.cast::<u8>(), len) };
    io_status(reader.read_exact(dest), "read")
}

#[cfg(test)]
unsafe extern "C" fn write_callback<W: io::Write>(
    ctx: *mut c_void,
    src: *const c_void,
    len: usize,
) -> c_int {
    if len == 0 {
        return SUCCESS;
    }
    let writer = unsafe { &mut *ctx.cast::<W>() };
    let src = unsafe { slice::from_raw_parts(src.cast::<u8>(), len) };
    io_status(writer.write_all(src), "write")
}

unsafe extern "C" fn set_pos_callback<S: Seek>(ctx: *mut c_void, pos: usize) -> c_int {
    let source = unsafe { &mut *ctx.cast::<S>() };
    io_status(source.seek(SeekFrom::Start(pos as u64)).map(drop), "seek")
}

unsafe extern "C" fn get_pos_callback<S: Seek>(ctx: *mut c_void, out: *mut usize) -> c_int {
    let source = unsafe { &mut *ctx.cast::<S>() };
    let pos = source.stream_position().and_then(|pos| {
        usize::try_from(pos).map_err(|_| io::Error::other("stream position overflows usize"))
    });
    let pos = pos.map(|pos| unsafe { *out = pos });
    io_status(pos, "tell")
}

/// # Safety
/// `ctx` must stay valid for every callback until the stream is closed.
unsafe fn open_callback_stream(
    ctx: *mut c_void,
    callbacks: &sys::StreamCallbacks,
) -> Result<*mut sys::WmpStream> {
    let mut raw = ptr::null_mut();
    CodecError::check(unsafe { sys::jxr_shim_stream_open_callbacks(ctx, callbacks, &mut raw) })?;
    if raw.is_null() {
        return Err(CodecError::OutOfMemory.into());
    }
    Ok(raw)
}

/// The jxrlib codec. Stateless; all state lives in streams and decoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jxrlib;

/// jxrlib stream over memory or a reader. Dropping it closes the stream.
pub struct JxrStream {
    raw: *mut sys::WmpStream,
}

impl Drop for JxrStream {
    fn drop(&mut self) {
        let status = unsafe { sys::jxr_shim_stream_close(&mut self.raw) };
        if let Err(e) = CodecError::check(status) {
            warn!(error = %e, "stream close failed");
        }
        self.raw = ptr::null_mut();
        debug!("jxrlib stream closed");
    }
}

/// jxrlib `PKImageDecode`. Dropping it releases the decoder; the stream it
/// reads from is closed separately by its own `JxrStream`.
pub struct JxrDecoder {
    raw: *mut sys::PkImageDecode,
}

impl Drop for JxrDecoder {
    fn drop(&mut self) {
        let status = unsafe { sys::jxr_shim_decoder_release(&mut self.raw) };
        if let Err(e) = CodecError::check(status) {
            warn!(error = %e, "decoder release failed");
        }
        self.raw = ptr::null_mut();
        debug!("jxrlib decoder released");
    }
}

impl Engine for Jxrlib {
    type Stream = JxrStream;
    type Decoder = JxrDecoder;

    fn lookup_pixel_format(&self, format: &FormatId) -> Result<RawPixelInfo> {
        let mut info = RawPixelInfo::default();
        CodecError::check(unsafe { sys::jxr_shim_pixel_format_lookup(format, &mut info) })?;
        Ok(info)
    }

    unsafe fn create_memory_stream(&self, bytes: &[u8]) -> Result<JxrStream> {
        let mut raw = ptr::null_mut();
        CodecError::check(unsafe {
            sys::jxr_shim_stream_open_memory(bytes.as_ptr().cast(), bytes.len(), &mut raw)
        })?;
        if raw.is_null() {
            return Err(CodecError::OutOfMemory.into());
        }
        debug!(len = bytes.len(), "jxrlib stream opened");
        Ok(JxrStream { raw })
    }

    unsafe fn create_reader_stream<R: Read + Seek>(&self, source: *mut R) -> Result<JxrStream> {
        let callbacks = sys::StreamCallbacks {
            read: Some(read_callback::<R>),
            write: None,
            set_pos: Some(set_pos_callback::<R>),
            get_pos: Some(get_pos_callback::<R>),
        };
        let raw = unsafe { open_callback_stream(source.cast(), &callbacks) }?;
        debug!("jxrlib reader stream opened");
        Ok(JxrStream { raw })
    }

    fn create_decoder(&self) -> Result<JxrDecoder> {
        let mut raw = ptr::null_mut();
        CodecError::check(unsafe { sys::jxr_shim_decoder_create(&mut raw) })?;
        if raw.is_null() {
            return Err(CodecError::OutOfMemory.into());
        }
        debug!("jxrlib decoder created");
        Ok(JxrDecoder { raw })
    }
}

impl Decoder for JxrDecoder {
    type Stream = JxrStream;

    fn initialize(&mut self, stream: &mut JxrStream) -> Result<()> {
        CodecError::check(unsafe { sys::jxr_shim_decoder_initialize(self.raw, stream.raw) })
    }

    fn pixel_format(&self) -> Result<FormatId> {
        let mut format = FormatId::default();
        CodecError::check(unsafe {
            sys::jxr_shim_decoder_pixel_format(self.raw, &mut format)
        })?;
        Ok(format)
    }

    fn size(&self) -> Result<(i32, i32)> {
        let (mut width, mut height) = (0, 0);
        CodecError::check(unsafe {
            sys::jxr_shim_decoder_size(self.raw, &mut width, &mut height)
        })?;
        Ok((width, height))
    }

    fn resolution(&self) -> Result<(f32, f32)> {
        let (mut horizontal, mut vertical) = (0.0, 0.0);
        CodecError::check(unsafe {
            sys::jxr_shim_decoder_resolution(self.raw, &mut horizontal, &mut vertical)
        })?;
        Ok((horizontal, vertical))
    }

    fn copy(&mut self, rect: &Rect, dest: &mut [u8], stride: usize) -> Result<()> {
        let stride = u32::try_from(stride).map_err(|_| JxrError::SizeOverflow)?;
        CodecError::check(unsafe {
            sys::jxr_shim_decoder_copy(
                self.raw,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                dest.as_mut_ptr(),
                stride,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodeSession, ReaderSession};
    use crate::known_formats::PixelFormat;
    use std::io::Cursor;

    const WIDTH: i32 = 16;
    const HEIGHT: i32 = 16;

    fn ramp() -> Vec<u8> {
        (0..WIDTH * HEIGHT * 3).map(|i| (i * 7 % 251) as u8).collect()
    }

    /// Encode 24bpp RGB pixels losslessly with jxrlib.
    fn encode_rgb24(pixels: &[u8], width: i32, height: i32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let callbacks = sys::StreamCallbacks {
            read: Some(read_callback::<Cursor<Vec<u8>>>),
            write: Some(write_callback::<Cursor<Vec<u8>>>),
            set_pos: Some(set_pos_callback::<Cursor<Vec<u8>>>),
            get_pos: Some(get_pos_callback::<Cursor<Vec<u8>>>),
        };
        let ctx: *mut Cursor<Vec<u8>> = &mut out;
        unsafe {
            let stream = open_callback_stream(ctx.cast(), &callbacks).unwrap();
            // The encoder closes the stream.
            let status = sys::jxr_shim_encode_lossless(
                stream,
                &FormatId::RGB_24BPP,
                width,
                height,
                pixels.as_ptr(),
                (width * 3) as u32,
            );
            CodecError::check(status).unwrap();
        }
        out.into_inner()
    }

    #[test]
    fn test_decode_encoded_image() {
        let pixels = ramp();
        let data = encode_rgb24(&pixels, WIDTH, HEIGHT);
        assert!(data.starts_with(b"II"));

        let mut session = DecodeSession::open(&Jxrlib, &data).unwrap();
        assert_eq!(session.size(), Ok((WIDTH, HEIGHT)));

        let format = session.pixel_format().unwrap();
        assert_eq!(format.known_format(), Some(PixelFormat::Rgb24));
        assert_eq!(format.bits_per_pixel(), 24);

        let stride = WIDTH as usize * 3;
        let mut decoded = vec![0u8; stride * HEIGHT as usize];
        session.copy_all(&mut decoded, stride).unwrap();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_decode_padded_stride() {
        let pixels = ramp();
        let data = encode_rgb24(&pixels, WIDTH, HEIGHT);
        let mut session = DecodeSession::open(&Jxrlib, &data).unwrap();

        let stride = WIDTH as usize * 3 + 5;
        let mut decoded = vec![0xeeu8; stride * HEIGHT as usize];
        session.copy_all(&mut decoded, stride).unwrap();
        for (row, chunk) in decoded.chunks(stride).enumerate() {
            let start = row * WIDTH as usize * 3;
            assert_eq!(&chunk[..WIDTH as usize * 3], &pixels[start..start + WIDTH as usize * 3]);
        }

        let image = session.decode_all().unwrap();
        assert_eq!(image.stride, WIDTH as usize * 3);
        assert_eq!(image.pixels, pixels);
    }

    #[test]
    fn test_reader_session_decodes_encoded_image() {
        let pixels = ramp();
        let mut data = vec![0u8; 8];
        data.extend(encode_rgb24(&pixels, WIDTH, HEIGHT));
        let mut reader = Cursor::new(data);
        reader.set_position(8);

        let mut session = ReaderSession::open(&Jxrlib, reader).unwrap();
        assert_eq!(session.size(), Ok((WIDTH, HEIGHT)));
        let image = session.decode_all().unwrap();
        assert_eq!(image.pixels, pixels);

        let reader = session.into_reader();
        assert!(reader.position() > 8);
    }

    #[test]
    fn test_reader_session_truncated_input() {
        let mut data = encode_rgb24(&ramp(), WIDTH, HEIGHT);
        data.truncate(24);
        assert!(ReaderSession::open(&Jxrlib, Cursor::new(data)).is_err());
    }

    #[test]
    fn test_repeated_sessions() {
        let data = encode_rgb24(&ramp(), WIDTH, HEIGHT);
        for _ in 0..64 {
            let session = DecodeSession::open(&Jxrlib, &data).unwrap();
            assert_eq!(session.width(), Ok(WIDTH));
            assert_eq!(session.height(), Ok(HEIGHT));
        }
    }

    #[cfg(feature = "ffi")]
    #[test]
    fn test_c_exports_decode_encoded_image() {
        use crate::ffi::*;

        let pixels = ramp();
        let data = encode_rgb24(&pixels, WIDTH, HEIGHT);
        unsafe {
            let decoder = image_decode_with_memory(data.as_ptr(), data.len());
            assert!(!decoder.is_null());
            assert_eq!(image_decode_width(decoder), WIDTH);
            assert_eq!(image_decode_height(decoder), HEIGHT);

            let info = image_decode_pixel_info(decoder);
            assert_eq!(pixel_info_bits_per_pixel(info), 24);
            pixel_info_free(info);

            let stride = WIDTH as usize * 3;
            let mut decoded = vec![0u8; stride * HEIGHT as usize];
            assert_eq!(image_decode_copy_all(decoder, decoded.as_mut_ptr(), stride), 0);
            assert_eq!(decoded, pixels);
            image_decode_free(decoder);
        }
    }
}
