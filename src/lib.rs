//! # IW44 Codec Library
//!
//! Progressive wavelet image coding with an adaptive binary arithmetic coder.
//!
//! This library is organized into several modules:
//! - `utils`: error handling and integer geometry
//! - `zp`: the ZP adaptive arithmetic coder
//! - `iw44`: wavelet transform, coefficient storage, bit-plane coding and the
//!   chunked encoder/decoder

// Re-export commonly used types at the crate root
pub use utils::error::{Iw44Error, Result};

pub mod utils {
    pub mod error;
    pub mod geom;
}

pub mod iw44;
pub mod zp;

// Public API exports
pub use iw44::{ChunkLimits, CrcbMode, EncoderParams, IWDecoder, IWEncoder};
pub use utils::geom::Rect;

/// Codec version written into every stream, as `major.minor`.
pub const IW44_VERSION: (u8, u8) = (iw44::constants::IWCODEC_MAJOR, iw44::constants::IWCODEC_MINOR);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(IW44_VERSION, (1, 2));
    }
}
