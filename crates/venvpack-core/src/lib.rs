//! Core operations for relocatable virtual environments.
//!
//! A virtual environment embeds the absolute path it was created at in
//! its launcher scripts (shebang lines) and in its interpreter symlink,
//! so copying it to another machine or directory breaks every entry
//! point. This crate packs an environment into a single gzip-compressed
//! tar archive ([`bundle`]), restores it ([`unpack`]), and rewrites the
//! embedded paths so the environment works at its new location
//! ([`repair`]).

pub mod archive;
pub mod env;
pub mod error;
pub mod repair;

pub use archive::{bundle, unpack};
pub use env::{INTERPRETER_LINK, default_archive_path};
pub use error::{Error, Result};
pub use repair::repair;
