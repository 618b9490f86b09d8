//! Seam between the adapter and the codec that does the real decoding.
//!
//! The codec's decoder and stream objects are tables of function pointers in C.
//! Here they become two traits; an engine hands out owned resources whose
//! `Drop` releases the underlying object.

use std::io::{Read, Seek};

use crate::decode::Rect;
use crate::error::Result;
use crate::guid::FormatId;
use crate::pixel_format::RawPixelInfo;

#[cfg(test)]
pub(crate) mod testing;

pub trait Engine {
    /// Readable stream over caller memory. Dropping it closes the stream.
    type Stream;
    /// Decoder instance. Dropping it releases the decoder but never its stream.
    type Decoder: Decoder<Stream = Self::Stream>;

    /// Forward lookup in the engine's pixel-format table.
    fn lookup_pixel_format(&self, format: &FormatId) -> Result<RawPixelInfo>;

    /// Build a stream that reads `bytes` in place.
    ///
    /// # Safety
    /// The engine may keep a pointer to `bytes`; the returned stream must be
    /// dropped before `bytes` is freed or mutated.
    unsafe fn create_memory_stream(&self, bytes: &[u8]) -> Result<Self::Stream>;

    /// Build a stream that pulls bytes through `source`'s `Read` and `Seek`
    /// impls, starting at its current position.
    ///
    /// # Safety
    /// `source` must be valid and unaliased, and must stay at the same address
    /// until the returned stream is dropped.
    unsafe fn create_reader_stream<R: Read + Seek>(&self, source: *mut R) -> Result<Self::Stream>;

    fn create_decoder(&self) -> Result<Self::Decoder>;
}

pub trait Decoder {
    type Stream;

    /// Bind the decoder to `stream` and parse the container header.
    ///
    /// The decoder may keep a pointer to `stream`, which must therefore stay
    /// at a fixed address and outlive the decoder.
    fn initialize(&mut self, stream: &mut Self::Stream) -> Result<()>;

    fn pixel_format(&self) -> Result<FormatId>;

    /// Width and height in pixels.
    fn size(&self) -> Result<(i32, i32)>;

    /// Horizontal and vertical resolution in DPI.
    fn resolution(&self) -> Result<(f32, f32)>;

    /// Decode `rect` into `dest`, rows `stride` bytes apart.
    fn copy(&mut self, rect: &Rect, dest: &mut [u8], stride: usize) -> Result<()>;
}
