//! Media-library collaborators of the conversion engine.
//!
//! This crate provides:
//! - Attachment records and the stores that persist them
//! - The upload hook (automatic conversion of new files)
//! - The manual conversion action (authorized, on-demand conversion)
//! - Request tokens scoped to one attachment
//!
//! Both triggers call the same [`webpopt_image::Engine`] and then update the
//! record through [`apply_outcome`]. The record is only touched after the
//! file swap finished.

#![warn(missing_docs)]

mod error;
mod manual;
mod nonce;
mod record;
mod store;
mod upload;

pub use error::{MediaError, Result};
pub use manual::{
    show_convert_action, Capability, ManualAction, ManualRequest, Redirect, RedirectStatus,
};
pub use nonce::{convert_action, HmacNonce, NonceVerifier};
pub use record::{apply_outcome, AttachmentRecord};
pub use store::{AttachmentStore, JsonFileStore, MemoryStore};
pub use upload::{Upload, UploadHook, UploadReport};
