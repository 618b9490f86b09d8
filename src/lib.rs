//! JPEG-XR decoding through jxrlib.
//!
//! The codec does all the real work. This crate binds an in-memory buffer
//! ([`DecodeSession`]) or a `Read + Seek` source ([`ReaderSession`]) to a
//! decoder, resolves pixel-format metadata ([`PixelFormatDescriptor`],
//! [`PixelFormat`]), and re-exports both as a C ABI with the `ffi` feature.
//!
//! ```no_run
//! # #[cfg(feature = "jxrlib")]
//! # fn main() -> Result<(), jpegxr_rs::JxrError> {
//! use jpegxr_rs::{DecodeSession, jxrlib::Jxrlib};
//!
//! let data = std::fs::read("image.jxr").unwrap();
//! let mut session = DecodeSession::open(&Jxrlib, &data)?;
//! let format = session.pixel_format()?;
//! let (width, height) = session.size()?;
//! let stride = format.row_bytes(width as usize).unwrap();
//! let mut pixels = vec![0u8; stride * height as usize];
//! session.copy_all(&mut pixels, stride)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "jxrlib"))]
//! # fn main() {}
//! ```

pub mod decode;
pub mod engine;
pub mod error;
pub mod guid;
pub mod known_formats;
pub mod pixel_format;

#[cfg(feature = "jxrlib")]
pub mod jxrlib;

#[cfg(any(test, feature = "ffi"))]
pub mod ffi;

pub use decode::{DecodeSession, DecodedImage, ReaderSession, Rect};
pub use engine::{Decoder, Engine};
pub use error::{CodecError, JxrError, Result};
pub use guid::FormatId;
pub use known_formats::PixelFormat;
pub use pixel_format::{
    BitDepth, ColorFormat, PhotometricInterpretation, PixelFlags, PixelFormatDescriptor,
    RawPixelInfo,
};
