//! # gh-publish
//!
//! Publish a local code directory as a versioned GitHub release.
//!
//! ## Overview
//!
//! `gh-publish` takes a directory and turns it into a tagged GitHub release in one
//! run. It initializes a repository if needed, commits pending changes, makes sure
//! the GitHub repository exists, pushes the branch and an annotated tag, and creates
//! the release, optionally with a zip of the directory attached.
//!
//! Every stage skips work that is already done, so re-running with the same tag
//! is safe.
//!
//! ## Backends
//!
//! Repository and release operations go through the `gh` CLI when it is logged in,
//! and through the REST API with `GITHUB_TOKEN` otherwise.
//!
//! ## Usage
//!
//! ```bash
//! # Publish ./site to a private repository with a timestamp tag
//! gh-publish --dir ./site --repo me/site
//!
//! # Public repository, explicit tag, zip attached
//! gh-publish -d ./tool -o me -n tool --public -v v1.0.0 --zip
//! ```
//!
//! ## Configuration
//!
//! Defaults can be set in `.config/ghpublish.toml`; command-line flags win.

/// Command-line interface and argument resolution
pub mod cli;

/// Configuration file handling
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// External command execution
pub mod process;

/// Version-control operations
pub mod git;

/// Repository initialization
pub mod init;

/// Staging and committing pending changes
pub mod commit;

/// Remote URL selection and registration
pub mod remote;

/// GitHub backends for repository and release operations
pub mod github;

/// Branch and tag pushing
pub mod push;

/// Zip packaging of the code directory
pub mod packager;

/// Stage orchestration
pub mod pipeline;
