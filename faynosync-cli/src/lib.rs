//! # faynosync-cli
//!
//! Command-line client for publishing application builds to a faynoSync
//! server.
//!
//! ## Overview
//!
//! `faynosync upload` packages one or more local files together with release
//! metadata (application, version, channel, platform, architecture, flags and
//! a changelog) into a single authenticated `multipart/form-data` request.
//! Files are streamed from disk while the request is in flight, so artifacts
//! of any size can be uploaded without being loaded into memory.
//!
//! ## Usage
//!
//! ```bash
//! # Create ~/.faynosync/config.yaml
//! faynosync init
//!
//! # Upload two artifacts with a changelog read from stdin
//! export FAYNOSYNC_TOKEN=...
//! git log --oneline v1.0.0..HEAD | faynosync upload \
//!     --app myapp --version 1.1.0 --channel stable \
//!     --platform linux --arch amd64 \
//!     --file dist/myapp.tar.gz --file dist/myapp.deb \
//!     --publish --changelog-stdin
//! ```
//!
//! ## Configuration
//!
//! `FAYNOSYNC_TOKEN` is always required. `FAYNOSYNC_URL` and
//! `FAYNOSYNC_ACCOUNT` override the `server` and `owner` entries of the
//! settings file.

/// Command dispatch, prompting and usage output
pub mod app;

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Settings file handling and runtime settings resolution
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// Tracing subscriber setup
pub mod logging;

/// The upload pipeline: flags, changelog, streaming body, submission
pub mod upload;
