//! CLI command modules.

pub mod checksum;
pub mod http;
pub mod status;
pub mod upload;
