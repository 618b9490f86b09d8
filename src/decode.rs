//! Decode sessions: one input buffer bound to one engine decoder.

use std::io::{Read, Seek};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::engine::{Decoder, Engine};
use crate::error::{JxrError, Result};
use crate::guid::FormatId;
use crate::pixel_format::PixelFormatDescriptor;

/// Pixel rectangle. Coordinates are i32 like the engine's.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole image of the given size, anchored at the origin.
    pub const fn full(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    fn fits_within(&self, width: i32, height: i32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x as i64 + self.width as i64 <= width as i64
            && self.y as i64 + self.height as i64 <= height as i64
    }
}

/// Fully decoded image with tightly packed rows.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Bytes between row starts; equal to the format's minimum row size.
    pub stride: usize,
    pub format: PixelFormatDescriptor,
    pub pixels: Vec<u8>,
}

/// An open decoder reading from caller memory.
///
/// The buffer is read in place and borrowed for the session's lifetime.
/// Nothing is cached: every query goes back to the engine.
pub struct DecodeSession<'a, E: Engine> {
    engine: &'a E,
    // Declaration order is drop order. The decoder points into the stream,
    // so it is released first, then the stream is closed.
    decoder: E::Decoder,
    _stream: Box<E::Stream>,
    _buffer: PhantomData<&'a [u8]>,
}

impl<'a, E: Engine> DecodeSession<'a, E> {
    /// Create a stream over `buffer`, create a decoder and bind it.
    ///
    /// On failure every resource created so far is released before the error
    /// is returned.
    pub fn open(engine: &'a E, buffer: &'a [u8]) -> Result<Self> {
        // SAFETY: the stream lives inside the session, which borrows `buffer`
        // for 'a, so the bytes outlive it.
        let stream = unsafe { engine.create_memory_stream(buffer) }
            .inspect_err(|e| debug!(error = %e, "memory stream creation failed"))?;
        let session = Self::bind(engine, stream)?;
        debug!(len = buffer.len(), "decode session opened");
        Ok(session)
    }

    /// Open a session that reads from `reader` instead of a buffer.
    ///
    /// Decoding starts at the reader's current position. The reader is owned
    /// by the returned session and handed back by
    /// [`ReaderSession::into_reader`].
    pub fn with_reader<R: Read + Seek>(
        engine: &'a E,
        reader: R,
    ) -> Result<ReaderSession<'a, E, R>> {
        ReaderSession::open(engine, reader)
    }

    /// Create a decoder and bind it to `stream`.
    fn bind(engine: &'a E, stream: E::Stream) -> Result<Self> {
        let mut stream = Box::new(stream);

        let mut decoder = engine
            .create_decoder()
            .inspect_err(|e| debug!(error = %e, "decoder creation failed"))?;

        decoder
            .initialize(&mut *stream)
            .inspect_err(|e| debug!(error = %e, "decoder initialization failed"))?;

        Ok(Self {
            engine,
            decoder,
            _stream: stream,
            _buffer: PhantomData,
        })
    }

    pub fn format_id(&self) -> Result<FormatId> {
        self.decoder.pixel_format()
    }

    /// Query the format identifier and resolve it, fresh on every call.
    pub fn pixel_format(&self) -> Result<PixelFormatDescriptor> {
        let format = self.format_id()?;
        PixelFormatDescriptor::resolve(self.engine, &format)
    }

    pub fn size(&self) -> Result<(i32, i32)> {
        let size = self.decoder.size()?;
        trace!(width = size.0, height = size.1, "size queried");
        Ok(size)
    }

    pub fn width(&self) -> Result<i32> {
        self.size().map(|(width, _)| width)
    }

    pub fn height(&self) -> Result<i32> {
        self.size().map(|(_, height)| height)
    }

    /// Horizontal and vertical resolution in DPI.
    pub fn resolution(&self) -> Result<(f32, f32)> {
        self.decoder.resolution()
    }

    /// Decode `rect` into `dest` with rows `stride` bytes apart.
    ///
    /// `stride` must hold one row of `rect` and `dest` must hold
    /// `stride * rect.height` bytes.
    pub fn copy(&mut self, rect: &Rect, dest: &mut [u8], stride: usize) -> Result<()> {
        let (width, height) = self.size()?;
        self.copy_within(rect, width, height, dest, stride)
    }

    /// Decode the whole image into `dest`.
    pub fn copy_all(&mut self, dest: &mut [u8], stride: usize) -> Result<()> {
        let (width, height) = self.size()?;
        self.copy_within(&Rect::full(width, height), width, height, dest, stride)
    }

    /// Decode the whole image without checking the stride or the buffer.
    ///
    /// # Safety
    /// `dest` must be valid for writes of `stride * height` bytes, and `stride`
    /// must be at least one row of pixels in the session's format.
    pub unsafe fn copy_all_unchecked(&mut self, dest: *mut u8, stride: usize) -> Result<()> {
        if dest.is_null() {
            return Err(JxrError::NullPointer);
        }
        let (width, height) = self.size()?;
        let rows =
            usize::try_from(height).map_err(|_| JxrError::InvalidDimensions { width, height })?;
        let len = stride.checked_mul(rows).ok_or(JxrError::SizeOverflow)?;
        // SAFETY: guaranteed by the caller.
        let dest = unsafe { std::slice::from_raw_parts_mut(dest, len) };
        self.decoder.copy(&Rect::full(width, height), dest, stride)
    }

    /// Decode the whole image into a freshly allocated, packed buffer.
    pub fn decode_all(&mut self) -> Result<DecodedImage> {
        let (width, height) = self.size()?;
        if width <= 0 || height <= 0 {
            return Err(JxrError::InvalidDimensions { width, height });
        }
        let format = self.pixel_format()?;
        let stride = format.row_bytes(width as usize).ok_or(JxrError::SizeOverflow)?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(JxrError::SizeOverflow)?;

        let mut pixels = vec![0u8; len];
        self.decoder
            .copy(&Rect::full(width, height), &mut pixels, stride)?;

        Ok(DecodedImage {
            width: width as u32,
            height: height as u32,
            stride,
            format,
            pixels,
        })
    }

    fn copy_within(
        &mut self,
        rect: &Rect,
        width: i32,
        height: i32,
        dest: &mut [u8],
        stride: usize,
    ) -> Result<()> {
        if !rect.fits_within(width, height) {
            return Err(JxrError::InvalidRect);
        }
        let format = self.pixel_format()?;
        let row = format
            .row_bytes(rect.width as usize)
            .ok_or(JxrError::SizeOverflow)?;
        if stride < row {
            return Err(JxrError::StrideTooSmall {
                needed: row,
                actual: stride,
            });
        }
        let needed = stride
            .checked_mul(rect.height as usize)
            .ok_or(JxrError::SizeOverflow)?;
        if dest.len() < needed {
            return Err(JxrError::DestinationTooSmall {
                needed,
                actual: dest.len(),
            });
        }
        self.decoder.copy(rect, &mut dest[..needed], stride)
    }
}

impl<E: Engine> Drop for DecodeSession<'_, E> {
    fn drop(&mut self) {
        debug!("decode session released");
    }
}

/// A [`DecodeSession`] that reads from an owned `Read + Seek` source, such
/// as a `File`, without buffering it first.
///
/// Derefs to the inner session for every query and copy.
pub struct ReaderSession<'a, E: Engine, R> {
    session: ManuallyDrop<DecodeSession<'a, E>>,
    // Heap-pinned: the engine's stream holds this address.
    reader: NonNull<R>,
    _reader: PhantomData<R>,
}

impl<'a, E: Engine, R: Read + Seek> ReaderSession<'a, E, R> {
    pub fn open(engine: &'a E, reader: R) -> Result<Self> {
        let reader = NonNull::from(Box::leak(Box::new(reader)));

        // SAFETY: the reader is only reached through the stream until the
        // session is dropped, and its box is freed after that.
        let stream = unsafe { engine.create_reader_stream(reader.as_ptr()) }
            .inspect_err(|e| debug!(error = %e, "reader stream creation failed"));
        let session = stream.and_then(|stream| DecodeSession::bind(engine, stream));

        match session {
            Ok(session) => {
                debug!("reader session opened");
                Ok(Self {
                    session: ManuallyDrop::new(session),
                    reader,
                    _reader: PhantomData,
                })
            }
            Err(e) => {
                // SAFETY: the stream, if any, is already gone.
                drop(unsafe { Box::from_raw(reader.as_ptr()) });
                Err(e)
            }
        }
    }

    /// Release the decoder and stream, then return the reader.
    pub fn into_reader(self) -> R {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the session and the box are each
        // released exactly once, the session first.
        unsafe {
            ManuallyDrop::drop(&mut this.session);
            *Box::from_raw(this.reader.as_ptr())
        }
    }
}

impl<'a, E: Engine, R> Deref for ReaderSession<'a, E, R> {
    type Target = DecodeSession<'a, E>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<E: Engine, R> DerefMut for ReaderSession<'_, E, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl<E: Engine, R> Drop for ReaderSession<'_, E, R> {
    fn drop(&mut self) {
        // SAFETY: the stream pointing at the reader goes with the session.
        unsafe {
            ManuallyDrop::drop(&mut self.session);
            drop(Box::from_raw(self.reader.as_ptr()));
        }
    }
}
