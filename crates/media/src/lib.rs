//! Media pipeline: blob download and preview synthesis (decode, bounded
//! downscale, JPEG re-encode under a byte budget).

pub mod error;
pub mod fetch;
pub mod preview;

pub use {
    error::{Error, Result},
    preview::{Preview, PreviewPolicy, synthesize_preview},
};
