//! Git access: git2 for reading repository state, the system binary for committing.

pub mod commit;
pub mod repo;

pub use commit::commit;
pub use repo::{GitRepo, StagedChange};
