//! Skills library browsing and installation
//!
//! A library is a directory of `<group>/<skill>/SKILL.md` packages. Skills
//! are installed by copying them into an agent runtime's skills directory,
//! tracked by a JSON manifest that lives alongside the copies.

pub mod catalog;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod target;

pub use catalog::{Library, LibrarySkill};
pub use error::{LibraryError, Result};
pub use installer::{InstallOutcome, Installer, UpdateOutcome};
pub use manifest::{InstalledSkill, Manifest, MANIFEST_FILE};
pub use target::InstallTarget;
