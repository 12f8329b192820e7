//! Domain logic - pure rules over revision data, independent of any VCS

pub mod branch;
pub mod prerelease;
pub mod snapshot;
pub mod version;

pub use branch::{sanitize_identifier, BranchContext};
pub use prerelease::{PreRelease, ReleaseVersion};
pub use snapshot::RevisionSnapshot;
pub use version::{strip_tag_v, TagVersion, Version};
