//! Cross-crate test support for the Kudos workspace.

pub mod helpers;
