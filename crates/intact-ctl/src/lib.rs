//! intact-ctl — Client Transfer Driver.
//!
//! [`Uploader`] walks a source directory and uploads each file to an
//! intactd endpoint, one [`TransferOutcome`] per file.

pub mod body;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod prepare;

pub use driver::{list_files, Uploader};
pub use error::ClientError;
pub use outcome::{FailureKind, TransferOutcome};
