//! Bundled map definitions.

pub mod classic;
