//! Derive build version strings from Git or Subversion working copies.
//!
//! A [`vcs::ProviderSelector`] collects a [`domain::RevisionSnapshot`] from
//! the working copy, and a [`format::TemplateResolver`] expands a version
//! template such as `{semvertag+chash:7}` against it.

pub mod boundary;
pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod scheme;
pub mod ui;
pub mod vcs;

pub use error::{Result, RevisionError};
