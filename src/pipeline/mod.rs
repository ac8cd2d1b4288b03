//! Per-file media conditioning ahead of upload.

pub mod normalize;

pub use normalize::Normalizer;
