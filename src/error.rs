use num_enum::TryFromPrimitive;
use thiserror::Error;

/// Failure status reported by the codec engine.
///
/// Discriminants are jxrlib's `WMP_err*` codes, so a raw status converts with
/// `CodecError::try_from(code)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(i32)]
pub enum CodecError {
    #[error("Fail")]
    Fail = -1,
    #[error("Not yet implemented")]
    NotYetImplemented = -2,
    #[error("Abstract method")]
    AbstractMethod = -3,
    #[error("Out of memory")]
    OutOfMemory = -101,
    #[error("File I/O")]
    FileIo = -102,
    #[error("Buffer overflow")]
    BufferOverflow = -103,
    #[error("Invalid parameter")]
    InvalidParameter = -104,
    #[error("Invalid argument")]
    InvalidArgument = -105,
    #[error("Unsupported format")]
    UnsupportedFormat = -106,
    #[error("Incorrect codec version")]
    IncorrectCodecVersion = -107,
    #[error("Index not found")]
    IndexNotFound = -108,
    #[error("Out of sequence")]
    OutOfSequence = -109,
    #[error("Not initialized")]
    NotInitialized = -110,
    #[error("Must be multiple of 16 lines until last call")]
    MustBeMultipleOf16LinesUntilLastCall = -111,
    #[error("Planar alpha banded encoding requires temp file")]
    PlanarAlphaBandedEncRequiresTempFile = -112,
    #[error("Alpha mode cannot be transcoded")]
    AlphaModeCannotBeTranscoded = -113,
    #[error("Incorrect codec sub-version")]
    IncorrectCodecSubVersion = -114,
}

impl CodecError {
    /// Map an engine status to a result. Zero and positive codes are success.
    pub fn check(status: i32) -> Result<()> {
        if status >= 0 {
            return Ok(());
        }
        Err(match CodecError::try_from(status) {
            Ok(e) => JxrError::Codec(e),
            Err(_) => JxrError::UnknownCodecStatus(status),
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JxrError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Unknown codec status {0}")]
    UnknownCodecStatus(i32),

    #[error("Unrecognized pixel format")]
    UnrecognizedPixelFormat,
    #[error("Unrecognized color format {0}")]
    UnrecognizedColorFormat(i32),
    #[error("Unrecognized bit depth {0}")]
    UnrecognizedBitDepth(i32),
    #[error("Unrecognized photometric interpretation {0}")]
    UnrecognizedInterpretation(u32),
    #[error("Invalid format identifier")]
    InvalidFormatId,

    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("Rectangle outside the image")]
    InvalidRect,
    #[error("Stride too small: need {needed} bytes, got {actual}")]
    StrideTooSmall { needed: usize, actual: usize },
    #[error("Destination too small: need {needed} bytes, got {actual}")]
    DestinationTooSmall { needed: usize, actual: usize },
    #[error("Size overflow")]
    SizeOverflow,
    #[error("Null pointer")]
    NullPointer,
}

pub type Result<T> = std::result::Result<T, JxrError>;
