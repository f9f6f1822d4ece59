//! WebP conversion engine.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Decoding with EXIF orientation correction
//! - Proportional downscaling to a maximum width
//! - Lossy WebP encoding at a configured quality
//! - A size-gated, rename-based replacement of the source file
//!
//! # Example
//!
//! ```rust,no_run
//! use webpopt_image::{AttachmentId, ConversionConfig, ConversionOutcome, Engine, ImageAsset};
//!
//! let engine = Engine::new();
//! let asset = ImageAsset::new("/srv/uploads/2024/06/beach.jpg", AttachmentId(42));
//!
//! match engine.convert(&asset, &ConversionConfig::default()) {
//!     ConversionOutcome::Converted { new_path, .. } => println!("now at {}", new_path.display()),
//!     other => println!("left untouched: {}", other.kind()),
//! }
//! ```

#![warn(missing_docs)]

mod asset;
mod codec;
mod config;
mod decode;
mod detect;
pub mod dimensions;
mod engine;
mod error;
mod orientation;
mod outcome;
mod resize;

pub use asset::{AttachmentId, ImageAsset};
pub use codec::{BuiltinCodec, WebpCodec};
pub use config::ConversionConfig;
pub use decode::DecodedImage;
pub use detect::{detect_format, webp_sibling, ImageFormat};
pub use dimensions::calculate_dimensions;
pub use engine::Engine;
pub use error::{ImageError, Result};
pub use orientation::OrientationTag;
pub use outcome::{ConversionOutcome, FailureReason};
pub use resize::fit_to_width;
