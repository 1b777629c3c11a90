//! # rgw-qe-types
//!
//! Value types shared by the rgw-qe crates.
//!
//! Everything a task file says is validated here, once, at the boundary:
//! - [`RoleId`], [`TestId`], [`RunId`] - Identity types
//! - [`TestVersion`], [`ScriptLayout`], [`ScriptLayouts`] - Script/config directory table
//! - [`TaskSpec`] - A parsed task invocation
//! - [`ConfigurationError`] - Everything that can be wrong with a task

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod layout;
mod task;

pub use error::ConfigurationError;
pub use ids::{RoleId, RunId, TestId, ROLE_PREFIX};
pub use layout::{ScriptLayout, ScriptLayouts, TestVersion};
pub use task::TaskSpec;
