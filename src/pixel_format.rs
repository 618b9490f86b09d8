//! Pixel-format metadata resolved from the engine's lookup table.

use std::fmt;

use num_enum::TryFromPrimitive;
use tracing::{debug, trace};

use crate::engine::Engine;
use crate::error::{JxrError, Result};
use crate::guid::FormatId;
use crate::known_formats::PixelFormat;

/// Field block an engine fills in when it resolves a format identifier.
///
/// `#[repr(C)]` so the native shim can write it directly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawPixelInfo {
    pub channels: u64,
    pub color_format: i32,
    pub bit_depth: i32,
    pub bits_per_pixel: u32,
    pub flags: u32,
    pub photometric_interpretation: u32,
    pub samples_per_pixel: u32,
}

/// Engine flag word attached to a pixel format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelFlags(u32);

impl PixelFlags {
    pub const HAS_ALPHA: PixelFlags = PixelFlags(0x0000_0010);
    pub const PREMULTIPLIED: PixelFlags = PixelFlags(0x0000_0020);
    /// Channels stored in reversed (BGR) order.
    pub const BGR: PixelFlags = PixelFlags(0x0000_0040);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: PixelFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for PixelFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in [
            (Self::HAS_ALPHA, "HAS_ALPHA"),
            (Self::PREMULTIPLIED, "PREMULTIPLIED"),
            (Self::BGR, "BGR"),
        ] {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// Internal color format of the coded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(i32)]
pub enum ColorFormat {
    YOnly = 0,
    Yuv420 = 1,
    Yuv422 = 2,
    Yuv444 = 3,
    Cmyk = 4,
    /// CMYK stored without color conversion.
    CmykDirect = 5,
    NComponent = 6,
    Rgb = 7,
    /// Shared-exponent RGB.
    Rgbe = 8,
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::YOnly => "Y only",
            Self::Yuv420 => "YUV 4:2:0",
            Self::Yuv422 => "YUV 4:2:2",
            Self::Yuv444 => "YUV 4:4:4",
            Self::Cmyk => "CMYK",
            Self::CmykDirect => "CMYK direct",
            Self::NComponent => "N-component",
            Self::Rgb => "RGB",
            Self::Rgbe => "RGBE",
        })
    }
}

/// Per-sample storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(i32)]
pub enum BitDepth {
    /// White is foreground.
    Bd1 = 0,
    Bd8 = 1,
    Bd16 = 2,
    Bd16S = 3,
    Bd16F = 4,
    Bd32 = 5,
    Bd32S = 6,
    Bd32F = 7,
    Bd5 = 8,
    Bd10 = 9,
    Bd565 = 10,
    /// Black is foreground.
    Bd1Alt = 0xf,
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bd1 => "1-bit",
            Self::Bd8 => "8-bit unsigned",
            Self::Bd16 => "16-bit unsigned",
            Self::Bd16S => "16-bit signed fixed point",
            Self::Bd16F => "16-bit half float",
            Self::Bd32 => "32-bit unsigned",
            Self::Bd32S => "32-bit signed fixed point",
            Self::Bd32F => "32-bit float",
            Self::Bd5 => "5-bit packed",
            Self::Bd10 => "10-bit packed",
            Self::Bd565 => "5-6-5 packed",
            Self::Bd1Alt => "1-bit (black foreground)",
        })
    }
}

/// TIFF-style photometric interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum PhotometricInterpretation {
    WhiteIsZero = 0,
    BlackIsZero = 1,
    Rgb = 2,
    RgbPalette = 3,
    TransparencyMask = 4,
    Cmyk = 5,
    YCbCr = 6,
    CieLab = 8,
    Nch = 9,
    /// Shared-exponent RGB.
    Rgbe = 10,
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WhiteIsZero => "WhiteIsZero",
            Self::BlackIsZero => "BlackIsZero",
            Self::Rgb => "RGB",
            Self::RgbPalette => "RGB palette",
            Self::TransparencyMask => "transparency mask",
            Self::Cmyk => "CMYK",
            Self::YCbCr => "YCbCr",
            Self::CieLab => "CIE L*a*b*",
            Self::Nch => "N-channel",
            Self::Rgbe => "RGBE",
        })
    }
}

/// Read-only metadata for one pixel format.
///
/// Values are exactly what the engine's table holds; the `*_code` accessors
/// return the engine's numeric codes untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    format: FormatId,
    raw: RawPixelInfo,
}

impl PixelFormatDescriptor {
    /// Forward lookup of `format` in the engine's pixel-format table.
    pub fn resolve<E: Engine>(engine: &E, format: &FormatId) -> Result<Self> {
        match engine.lookup_pixel_format(format) {
            Ok(raw) => {
                trace!(%format, ?raw, "pixel format resolved");
                Ok(Self::new(*format, raw))
            }
            Err(e) => {
                debug!(%format, error = %e, "pixel format lookup failed");
                Err(match e {
                    JxrError::Codec(_) | JxrError::UnknownCodecStatus(_) => {
                        JxrError::UnrecognizedPixelFormat
                    }
                    other => other,
                })
            }
        }
    }

    pub fn new(format: FormatId, raw: RawPixelInfo) -> Self {
        Self { format, raw }
    }

    pub fn format(&self) -> &FormatId {
        &self.format
    }

    /// The named entry for this format, if it has one.
    pub fn known_format(&self) -> Option<PixelFormat> {
        PixelFormat::from_format_id(&self.format)
    }

    pub fn raw(&self) -> &RawPixelInfo {
        &self.raw
    }

    pub fn channels(&self) -> usize {
        self.raw.channels as usize
    }

    pub fn color_format_code(&self) -> i32 {
        self.raw.color_format
    }

    pub fn color_format(&self) -> Result<ColorFormat> {
        ColorFormat::try_from(self.raw.color_format)
            .map_err(|_| JxrError::UnrecognizedColorFormat(self.raw.color_format))
    }

    pub fn bit_depth_code(&self) -> i32 {
        self.raw.bit_depth
    }

    pub fn bit_depth(&self) -> Result<BitDepth> {
        BitDepth::try_from(self.raw.bit_depth)
            .map_err(|_| JxrError::UnrecognizedBitDepth(self.raw.bit_depth))
    }

    /// Bits in one pixel, all channels included.
    pub fn bits_per_pixel(&self) -> u32 {
        self.raw.bits_per_pixel
    }

    pub fn flags(&self) -> PixelFlags {
        PixelFlags::from_bits(self.raw.flags)
    }

    pub fn has_alpha(&self) -> bool {
        self.flags().contains(PixelFlags::HAS_ALPHA)
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.flags().contains(PixelFlags::PREMULTIPLIED)
    }

    pub fn is_bgr(&self) -> bool {
        self.flags().contains(PixelFlags::BGR)
    }

    pub fn photometric_interpretation_code(&self) -> u32 {
        self.raw.photometric_interpretation
    }

    pub fn photometric_interpretation(&self) -> Result<PhotometricInterpretation> {
        PhotometricInterpretation::try_from(self.raw.photometric_interpretation).map_err(|_| {
            JxrError::UnrecognizedInterpretation(self.raw.photometric_interpretation)
        })
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.raw.samples_per_pixel
    }

    /// Minimum bytes needed to hold `width` pixels of this format.
    pub fn row_bytes(&self, width: usize) -> Option<usize> {
        width
            .checked_mul(self.raw.bits_per_pixel as usize)?
            .checked_add(7)
            .map(|bits| bits / 8)
    }
}
