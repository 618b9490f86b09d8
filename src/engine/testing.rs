//! Scripted engine for unit tests.
//!
//! Decodes a trivial uncompressed container (`TJXR`, width, height, format id,
//! packed rows), records every resource event, and can be told to fail at any
//! step.

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::io::{self, Read, Seek};
use std::rc::Rc;

use super::{Decoder, Engine};
use crate::decode::Rect;
use crate::error::{CodecError, JxrError, Result};
use crate::guid::FormatId;
use crate::pixel_format::RawPixelInfo;

const MAGIC: &[u8; 4] = b"TJXR";
const HEADER_LEN: usize = 4 + 4 + 4 + 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    StreamOpened,
    DecoderCreated,
    Initialized,
    DecoderReleased,
    StreamClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Stream,
    Decoder,
    Initialize,
    PixelFormat,
    Size,
    Copy,
}

#[derive(Default)]
struct State {
    events: RefCell<Vec<Event>>,
    live_streams: Cell<i32>,
    live_decoders: Cell<i32>,
    lookups: Cell<u32>,
    size_calls: Cell<u32>,
    format_calls: Cell<u32>,
    fail_at: Cell<Option<Step>>,
}

impl State {
    fn fails(&self, step: Step) -> bool {
        self.fail_at.get() == Some(step)
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

pub(crate) fn rgb24_info() -> RawPixelInfo {
    RawPixelInfo {
        channels: 3,
        color_format: 7,
        bit_depth: 1,
        bits_per_pixel: 24,
        flags: 0,
        photometric_interpretation: 2,
        samples_per_pixel: 3,
    }
}

fn pbgra32_info() -> RawPixelInfo {
    RawPixelInfo {
        channels: 4,
        color_format: 7,
        bit_depth: 1,
        bits_per_pixel: 32,
        flags: 0x10 | 0x20 | 0x40,
        photometric_interpretation: 2,
        samples_per_pixel: 4,
    }
}

fn gray8_info() -> RawPixelInfo {
    RawPixelInfo {
        channels: 1,
        color_format: 0,
        bit_depth: 1,
        bits_per_pixel: 8,
        flags: 0,
        photometric_interpretation: 1,
        samples_per_pixel: 1,
    }
}

fn table() -> [(FormatId, RawPixelInfo); 3] {
    [
        (FormatId::RGB_24BPP, rgb24_info()),
        (FormatId::PBGRA_32BPP, pbgra32_info()),
        (FormatId::GRAY_8BPP, gray8_info()),
    ]
}

fn lookup(format: &FormatId) -> Option<RawPixelInfo> {
    table()
        .into_iter()
        .find(|(id, _)| id == format)
        .map(|(_, info)| info)
}

/// Build a container the test engine can decode. `pixels` are packed rows.
pub(crate) fn encode_image(format: FormatId, width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + pixels.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&format.to_bytes());
    out.extend_from_slice(pixels);
    out
}

/// `width * height` RGB pixels where pixel `i` is `[i, i + 1, i + 2]` (wrapping).
pub(crate) fn rgb_ramp(width: u32, height: u32) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| {
            let b = i as u8;
            [b, b.wrapping_add(1), b.wrapping_add(2)]
        })
        .collect()
}

#[derive(Clone, Default)]
pub(crate) struct TestEngine {
    state: Rc<State>,
}

impl TestEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_at(&self, step: Step) {
        self.state.fail_at.set(Some(step));
    }

    pub(crate) fn clear_failure(&self) {
        self.state.fail_at.set(None);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.state.events.borrow().clone()
    }

    pub(crate) fn live_streams(&self) -> i32 {
        self.state.live_streams.get()
    }

    pub(crate) fn live_decoders(&self) -> i32 {
        self.state.live_decoders.get()
    }

    pub(crate) fn lookups(&self) -> u32 {
        self.state.lookups.get()
    }

    pub(crate) fn size_calls(&self) -> u32 {
        self.state.size_calls.get()
    }

    pub(crate) fn format_calls(&self) -> u32 {
        self.state.format_calls.get()
    }

    fn open_stream(&self, source: Source) -> Result<TestStream> {
        if self.state.fails(Step::Stream) {
            return Err(CodecError::OutOfMemory.into());
        }
        self.state.live_streams.set(self.state.live_streams.get() + 1);
        self.state.push(Event::StreamOpened);
        Ok(TestStream {
            state: Rc::clone(&self.state),
            source,
        })
    }
}

enum Source {
    Memory(Vec<u8>),
    Reader {
        ctx: *mut c_void,
        read_rest: unsafe fn(*mut c_void, &mut Vec<u8>) -> io::Result<usize>,
    },
}

/// # Safety
/// `ctx` must be the `*mut R` handed to `create_reader_stream`.
unsafe fn read_rest<R: Read>(ctx: *mut c_void, out: &mut Vec<u8>) -> io::Result<usize> {
    let reader = unsafe { &mut *ctx.cast::<R>() };
    reader.read_to_end(out)
}

pub(crate) struct TestStream {
    state: Rc<State>,
    source: Source,
}

impl TestStream {
    fn contents(&mut self) -> Result<Vec<u8>> {
        match &self.source {
            Source::Memory(bytes) => Ok(bytes.clone()),
            Source::Reader { ctx, read_rest } => {
                let mut bytes = Vec::new();
                // SAFETY: the session keeps the reader alive and in place for
                // the stream's lifetime.
                unsafe { read_rest(*ctx, &mut bytes) }
                    .map_err(|_| JxrError::Codec(CodecError::FileIo))?;
                Ok(bytes)
            }
        }
    }
}

impl Drop for TestStream {
    fn drop(&mut self) {
        self.state.live_streams.set(self.state.live_streams.get() - 1);
        self.state.push(Event::StreamClosed);
    }
}

struct Parsed {
    width: u32,
    height: u32,
    format: FormatId,
    bytes_per_pixel: usize,
    pixels: Vec<u8>,
}

pub(crate) struct TestDecoder {
    state: Rc<State>,
    image: Option<Parsed>,
}

impl Drop for TestDecoder {
    fn drop(&mut self) {
        self.state.live_decoders.set(self.state.live_decoders.get() - 1);
        self.state.push(Event::DecoderReleased);
    }
}

impl TestDecoder {
    fn image(&self) -> Result<&Parsed> {
        self.image
            .as_ref()
            .ok_or(JxrError::Codec(CodecError::NotInitialized))
    }
}

impl Engine for TestEngine {
    type Stream = TestStream;
    type Decoder = TestDecoder;

    fn lookup_pixel_format(&self, format: &FormatId) -> Result<RawPixelInfo> {
        self.state.lookups.set(self.state.lookups.get() + 1);
        lookup(format).ok_or(JxrError::Codec(CodecError::UnsupportedFormat))
    }

    unsafe fn create_memory_stream(&self, bytes: &[u8]) -> Result<TestStream> {
        self.open_stream(Source::Memory(bytes.to_vec()))
    }

    unsafe fn create_reader_stream<R: Read + Seek>(&self, source: *mut R) -> Result<TestStream> {
        self.open_stream(Source::Reader {
            ctx: source.cast(),
            read_rest: read_rest::<R>,
        })
    }

    fn create_decoder(&self) -> Result<TestDecoder> {
        if self.state.fails(Step::Decoder) {
            return Err(CodecError::OutOfMemory.into());
        }
        self.state.live_decoders.set(self.state.live_decoders.get() + 1);
        self.state.push(Event::DecoderCreated);
        Ok(TestDecoder {
            state: Rc::clone(&self.state),
            image: None,
        })
    }
}

impl Decoder for TestDecoder {
    type Stream = TestStream;

    fn initialize(&mut self, stream: &mut TestStream) -> Result<()> {
        if self.state.fails(Step::Initialize) {
            return Err(CodecError::Fail.into());
        }
        let contents = stream.contents()?;
        let bytes = contents.as_slice();
        if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
            return Err(CodecError::UnsupportedFormat.into());
        }
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let width = word(4);
        let height = word(8);
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[12..28]);
        let format = FormatId::from_bytes(id);
        let info = lookup(&format).ok_or(JxrError::Codec(CodecError::UnsupportedFormat))?;

        let bytes_per_pixel = info.bits_per_pixel as usize / 8;
        let needed = width as usize * height as usize * bytes_per_pixel;
        let pixels = &bytes[HEADER_LEN..];
        if pixels.len() < needed {
            return Err(CodecError::FileIo.into());
        }

        self.image = Some(Parsed {
            width,
            height,
            format,
            bytes_per_pixel,
            pixels: pixels[..needed].to_vec(),
        });
        self.state.push(Event::Initialized);
        Ok(())
    }

    fn pixel_format(&self) -> Result<FormatId> {
        self.state.format_calls.set(self.state.format_calls.get() + 1);
        if self.state.fails(Step::PixelFormat) {
            return Err(CodecError::Fail.into());
        }
        Ok(self.image()?.format)
    }

    fn size(&self) -> Result<(i32, i32)> {
        self.state.size_calls.set(self.state.size_calls.get() + 1);
        if self.state.fails(Step::Size) {
            return Err(CodecError::Fail.into());
        }
        let image = self.image()?;
        Ok((image.width as i32, image.height as i32))
    }

    fn resolution(&self) -> Result<(f32, f32)> {
        self.image()?;
        Ok((96.0, 72.0))
    }

    fn copy(&mut self, rect: &Rect, dest: &mut [u8], stride: usize) -> Result<()> {
        if self.state.fails(Step::Copy) {
            return Err(CodecError::Fail.into());
        }
        let image = self.image()?;
        let bpp = image.bytes_per_pixel;
        let src_stride = image.width as usize * bpp;
        let run = rect.width as usize * bpp;
        for row in 0..rect.height as usize {
            let src = (rect.y as usize + row) * src_stride + rect.x as usize * bpp;
            let dst = row * stride;
            let out = dest
                .get_mut(dst..dst + run)
                .ok_or(JxrError::Codec(CodecError::BufferOverflow))?;
            out.copy_from_slice(&image.pixels[src..src + run]);
        }
        Ok(())
    }
}
