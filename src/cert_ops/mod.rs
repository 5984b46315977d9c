//! Local certificate operations
//!
//! Decodes the configured PEM pair into a [`LocalCertificate`](crate::models::LocalCertificate)
//! and derives the name it is uploaded under.

pub mod reader;

pub use reader::{derive_display_name, load_local_certificate};
