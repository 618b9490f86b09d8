//! 128-bit pixel-format identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::JxrError;

/// GUID naming a pixel layout.
///
/// Layout matches the engine's `GUID` struct, so `&FormatId` can be passed to
/// the codec as-is.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FormatId {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// Shared prefix of the WIC-compatible pixel formats; the last byte varies.
pub(crate) const fn wic(last: u8) -> FormatId {
    FormatId::new(
        0x6fdd_c324,
        0x4e03,
        0x4bfe,
        [0xb1, 0x85, 0x3d, 0x77, 0x76, 0x8d, 0xc9, last],
    )
}

impl FormatId {
    pub const DONT_CARE: FormatId = wic(0x00);
    pub const BLACK_WHITE: FormatId = wic(0x05);
    pub const GRAY_8BPP: FormatId = wic(0x08);
    pub const GRAY_16BPP: FormatId = wic(0x0b);
    pub const BGR_24BPP: FormatId = wic(0x0c);
    pub const RGB_24BPP: FormatId = wic(0x0d);
    pub const BGR_32BPP: FormatId = wic(0x0e);
    pub const BGRA_32BPP: FormatId = wic(0x0f);
    pub const PBGRA_32BPP: FormatId = wic(0x10);
    pub const RGB_48BPP: FormatId = wic(0x15);
    pub const RGBA_64BPP: FormatId = wic(0x16);
    /// Used by NVIDIA HDR screenshots.
    pub const RGBA_FLOAT_128BPP: FormatId = wic(0x19);

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Decode the on-disk byte order: the first three fields little-endian,
    /// `data4` as-is.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..].copy_from_slice(&self.data4);
        out
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl fmt::Debug for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatId({self})")
    }
}

impl FromStr for FormatId {
    type Err = JxrError;

    /// Parse `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, optionally in braces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = match s.strip_prefix('{') {
            Some(inner) => inner.strip_suffix('}').ok_or(JxrError::InvalidFormatId)?,
            None => s,
        };

        let groups: Vec<&str> = s.split('-').collect();
        let lengths = [8, 4, 4, 4, 12];
        if groups.len() != lengths.len()
            || groups
                .iter()
                .zip(lengths)
                .any(|(g, n)| g.len() != n || !g.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            return Err(JxrError::InvalidFormatId);
        }

        let hex = |g: &str| u64::from_str_radix(g, 16).map_err(|_| JxrError::InvalidFormatId);
        let tail = format!("{}{}", groups[3], groups[4]);
        let mut data4 = [0u8; 8];
        for (i, byte) in data4.iter_mut().enumerate() {
            *byte = hex(&tail[i * 2..i * 2 + 2])? as u8;
        }

        Ok(Self {
            data1: hex(groups[0])? as u32,
            data2: hex(groups[1])? as u16,
            data3: hex(groups[2])? as u16,
            data4,
        })
    }
}
