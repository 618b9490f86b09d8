//! Named pixel formats.
//!
//! Every identifier in jxrlib's pixel-format table, with its jxrlib name. The
//! engine's lookup stays the authority on layout; this table only puts a name
//! on a [`FormatId`].

use std::fmt;
use std::str::FromStr;

use crate::error::JxrError;
use crate::guid::{FormatId, wic};

macro_rules! pixel_formats {
    ($($(#[$meta:meta])* $variant:ident => $name:literal, $id:expr;)*) => {
        /// Pixel format with a name in jxrlib's table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PixelFormat {
            $($(#[$meta])* $variant,)*
        }

        impl PixelFormat {
            /// Every named format, in table order.
            pub const ALL: &'static [PixelFormat] = &[$(PixelFormat::$variant,)*];

            pub const fn format_id(self) -> FormatId {
                match self {
                    $(PixelFormat::$variant => $id,)*
                }
            }

            /// jxrlib's name without the `GUID_PKPixelFormat` prefix, e.g. `24bppRGB`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(PixelFormat::$variant => $name,)*
                }
            }
        }
    };
}

// The formats added after the WIC block use their own identifiers.
const RGB_32BPP: FormatId = FormatId::new(
    0xd98c_6b95,
    0x3efe,
    0x47d6,
    [0xbb, 0x25, 0xeb, 0x17, 0x48, 0xab, 0x0c, 0xf1],
);
const RGBA_32BPP: FormatId = FormatId::new(
    0xf5c7_ad2d,
    0x6a8d,
    0x43dd,
    [0xa7, 0xa8, 0xa2, 0x99, 0x35, 0x26, 0x1a, 0xe9],
);
const PRGBA_32BPP: FormatId = FormatId::new(
    0x3cc4_a650,
    0xa527,
    0x4d37,
    [0xa9, 0x16, 0x31, 0x42, 0xc7, 0xeb, 0xed, 0xba],
);
const RGB_FLOAT_96BPP: FormatId = FormatId::new(
    0xe3fe_d78f,
    0xe8db,
    0x4acf,
    [0x84, 0xc1, 0xe9, 0x7f, 0x61, 0x36, 0xb3, 0x27],
);

pixel_formats! {
    DontCare => "DontCare", FormatId::DONT_CARE;

    // Indexed
    BlackWhite => "BlackWhite", FormatId::BLACK_WHITE;
    Gray8 => "8bppGray", FormatId::GRAY_8BPP;

    // sRGB
    Rgb555 => "16bppRGB555", wic(0x09);
    Rgb565 => "16bppRGB565", wic(0x0a);
    Gray16 => "16bppGray", FormatId::GRAY_16BPP;
    Bgr24 => "24bppBGR", FormatId::BGR_24BPP;
    Rgb24 => "24bppRGB", FormatId::RGB_24BPP;
    Bgr32 => "32bppBGR", FormatId::BGR_32BPP;
    Bgra32 => "32bppBGRA", FormatId::BGRA_32BPP;
    Pbgra32 => "32bppPBGRA", FormatId::PBGRA_32BPP;
    GrayFloat32 => "32bppGrayFloat", wic(0x11);
    Rgb32 => "32bppRGB", RGB_32BPP;
    Rgba32 => "32bppRGBA", RGBA_32BPP;
    Prgba32 => "32bppPRGBA", PRGBA_32BPP;
    RgbFixedPoint48 => "48bppRGBFixedPoint", wic(0x12);

    // scRGB
    GrayFixedPoint16 => "16bppGrayFixedPoint", wic(0x13);
    Rgb101010 => "32bppRGB101010", wic(0x14);
    Rgb48 => "48bppRGB", FormatId::RGB_48BPP;
    Rgba64 => "64bppRGBA", FormatId::RGBA_64BPP;
    Prgba64 => "64bppPRGBA", wic(0x17);
    RgbFixedPoint96 => "96bppRGBFixedPoint", wic(0x18);
    RgbFloat96 => "96bppRGBFloat", RGB_FLOAT_96BPP;
    /// Used by NVIDIA HDR screenshots.
    RgbaFloat128 => "128bppRGBAFloat", FormatId::RGBA_FLOAT_128BPP;
    PrgbaFloat128 => "128bppPRGBAFloat", wic(0x1a);
    RgbFloat128 => "128bppRGBFloat", wic(0x1b);

    // CMYK
    Cmyk32 => "32bppCMYK", wic(0x1c);

    // Photon
    RgbaFixedPoint64 => "64bppRGBAFixedPoint", wic(0x1d);
    RgbFixedPoint64 => "64bppRGBFixedPoint", wic(0x40);
    RgbaFixedPoint128 => "128bppRGBAFixedPoint", wic(0x1e);
    RgbFixedPoint128 => "128bppRGBFixedPoint", wic(0x41);
    RgbaHalf64 => "64bppRGBAHalf", wic(0x3a);
    RgbHalf64 => "64bppRGBHalf", wic(0x42);
    RgbHalf48 => "48bppRGBHalf", wic(0x3b);
    Rgbe32 => "32bppRGBE", wic(0x3d);
    GrayHalf16 => "16bppGrayHalf", wic(0x3e);
    GrayFixedPoint32 => "32bppGrayFixedPoint", wic(0x3f);

    Cmyk64 => "64bppCMYK", wic(0x1f);

    // N-channel
    Channels3Bpp24 => "24bpp3Channels", wic(0x20);
    Channels4Bpp32 => "32bpp4Channels", wic(0x21);
    Channels5Bpp40 => "40bpp5Channels", wic(0x22);
    Channels6Bpp48 => "48bpp6Channels", wic(0x23);
    Channels7Bpp56 => "56bpp7Channels", wic(0x24);
    Channels8Bpp64 => "64bpp8Channels", wic(0x25);

    Channels3Bpp48 => "48bpp3Channels", wic(0x26);
    Channels4Bpp64 => "64bpp4Channels", wic(0x27);
    Channels5Bpp80 => "80bpp5Channels", wic(0x28);
    Channels6Bpp96 => "96bpp6Channels", wic(0x29);
    Channels7Bpp112 => "112bpp7Channels", wic(0x2a);
    Channels8Bpp128 => "128bpp8Channels", wic(0x2b);

    CmykAlpha40 => "40bppCMYKAlpha", wic(0x2c);
    CmykAlpha80 => "80bppCMYKAlpha", wic(0x2d);

    Channels3AlphaBpp32 => "32bpp3ChannelsAlpha", wic(0x2e);
    Channels4AlphaBpp40 => "40bpp4ChannelsAlpha", wic(0x2f);
    Channels5AlphaBpp48 => "48bpp5ChannelsAlpha", wic(0x30);
    Channels6AlphaBpp56 => "56bpp6ChannelsAlpha", wic(0x31);
    Channels7AlphaBpp64 => "64bpp7ChannelsAlpha", wic(0x32);
    Channels8AlphaBpp72 => "72bpp8ChannelsAlpha", wic(0x33);

    Channels3AlphaBpp64 => "64bpp3ChannelsAlpha", wic(0x34);
    Channels4AlphaBpp80 => "80bpp4ChannelsAlpha", wic(0x35);
    Channels5AlphaBpp96 => "96bpp5ChannelsAlpha", wic(0x36);
    Channels6AlphaBpp112 => "112bpp6ChannelsAlpha", wic(0x37);
    Channels7AlphaBpp128 => "128bpp7ChannelsAlpha", wic(0x38);
    Channels8AlphaBpp144 => "144bpp8ChannelsAlpha", wic(0x39);

    // YCrCb, advanced profile
    Ycc420Bpp12 => "12bppYCC420", wic(0x44);
    Ycc422Bpp16 => "16bppYCC422", wic(0x45);
    Ycc422Bpp20 => "20bppYCC422", wic(0x46);
    Ycc422Bpp32 => "32bppYCC422", wic(0x47);
    Ycc444Bpp24 => "24bppYCC444", wic(0x48);
    Ycc444Bpp30 => "30bppYCC444", wic(0x49);
    Ycc444Bpp48 => "48bppYCC444", wic(0x4a);
    Ycc444FixedPoint48 => "16bpp48bppYCC444FixedPoint", wic(0x4b);
    Ycc420AlphaBpp20 => "20bppYCC420Alpha", wic(0x4c);
    Ycc422AlphaBpp24 => "24bppYCC422Alpha", wic(0x4d);
    Ycc422AlphaBpp30 => "30bppYCC422Alpha", wic(0x4e);
    Ycc422AlphaBpp48 => "48bppYCC422Alpha", wic(0x4f);
    Ycc444AlphaBpp32 => "32bppYCC444Alpha", wic(0x50);
    Ycc444AlphaBpp40 => "40bppYCC444Alpha", wic(0x51);
    Ycc444AlphaBpp64 => "64bppYCC444Alpha", wic(0x52);
    Ycc444AlphaFixedPoint64 => "64bppYCC444AlphaFixedPoint", wic(0x53);

    // CMYK direct, advanced profile
    CmykDirect32 => "32bppCMYKDIRECT", wic(0x54);
    CmykDirect64 => "64bppCMYKDIRECT", wic(0x55);
    CmykDirectAlpha40 => "40bppCMYKDIRECTAlpha", wic(0x56);
    CmykDirectAlpha80 => "80bppCMYKDIRECTAlpha", wic(0x57);
}

impl PixelFormat {
    /// Find the named format for `id`.
    pub fn from_format_id(id: &FormatId) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.format_id() == *id)
    }
}

impl TryFrom<FormatId> for PixelFormat {
    type Error = JxrError;

    fn try_from(id: FormatId) -> Result<Self, Self::Error> {
        Self::from_format_id(&id).ok_or(JxrError::UnrecognizedPixelFormat)
    }
}

impl From<PixelFormat> for FormatId {
    fn from(format: PixelFormat) -> Self {
        format.format_id()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = JxrError;

    /// Match a jxrlib name (`24bppRGB`), ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or(JxrError::UnrecognizedPixelFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(PixelFormat::try_from(FormatId::RGB_24BPP), Ok(PixelFormat::Rgb24));
        assert_eq!(PixelFormat::try_from(FormatId::PBGRA_32BPP), Ok(PixelFormat::Pbgra32));
        assert_eq!(
            PixelFormat::try_from(FormatId::RGBA_FLOAT_128BPP),
            Ok(PixelFormat::RgbaFloat128)
        );
        assert_eq!(
            PixelFormat::try_from(FormatId::new(1, 2, 3, [0; 8])),
            Err(JxrError::UnrecognizedPixelFormat)
        );
    }

    #[test]
    fn test_ids_and_names_are_unique() {
        let ids: HashSet<FormatId> = PixelFormat::ALL.iter().map(|f| f.format_id()).collect();
        let names: HashSet<&str> = PixelFormat::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(ids.len(), PixelFormat::ALL.len());
        assert_eq!(names.len(), PixelFormat::ALL.len());
    }

    #[test]
    fn test_every_entry_maps_back() {
        for &format in PixelFormat::ALL {
            assert_eq!(PixelFormat::try_from(format.format_id()), Ok(format), "{format}");
            assert_eq!(format.name().parse::<PixelFormat>(), Ok(format));
        }
    }

    #[test]
    fn test_non_wic_identifiers() {
        assert_eq!(
            PixelFormat::Rgba32.format_id().to_string(),
            "f5c7ad2d-6a8d-43dd-a7a8-a29935261ae9"
        );
        assert_eq!(
            PixelFormat::RgbFloat96.format_id().to_string(),
            "e3fed78f-e8db-4acf-84c1-e97f6136b327"
        );
        assert_eq!(
            PixelFormat::CmykDirectAlpha80.format_id().to_string(),
            "6fddc324-4e03-4bfe-b185-3d77768dc957"
        );
    }

    #[test]
    fn test_parse_name() {
        assert_eq!("24bppRGB".parse::<PixelFormat>(), Ok(PixelFormat::Rgb24));
        assert_eq!(
            " 128BPPRGBAFLOAT ".parse::<PixelFormat>(),
            Ok(PixelFormat::RgbaFloat128)
        );
        assert_eq!("RGB24".parse::<PixelFormat>(), Err(JxrError::UnrecognizedPixelFormat));
        assert_eq!(PixelFormat::Gray8.to_string(), "8bppGray");
    }

    #[test]
    fn test_into_format_id() {
        let id: FormatId = PixelFormat::Bgra32.into();
        assert_eq!(id, FormatId::BGRA_32BPP);
    }
}
