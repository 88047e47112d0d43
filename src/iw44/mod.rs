// src/iw44/mod.rs

//! IW44 progressive wavelet image coding.

pub mod codec;
pub mod coeff_map;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod header;
pub mod masking;
pub mod transform;

#[cfg(test)]
mod tests;

pub use codec::{Codec, CoeffState};
pub use coeff_map::{BucketArena, BucketId, CoeffMap};
pub use decoder::{DEFAULT_MEMORY_LIMIT, IWDecoder};
pub use encoder::{ChunkLimits, CrcbMode, EncoderParams, IWEncoder};
pub use masking::Mask;
