//! `gcode_migrate` - text transformation core of a Google Code to GitHub
//! issue migration.
//!
//! This crate provides the library behind the `gcmigrate` CLI. Given scraped
//! issue and comment text it rewrites cross-references for the destination
//! tracker and renders the final body in the markup dialect the destination
//! used at the message's creation time.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`refs`] - Issue, commit and source-link reference rewriting
//! - [`segment`] - Splitting parsed text into titled segments
//! - [`format`] - Rendering (Markdown and legacy Textile dialects)
//! - [`updates`] - Comment update boxes and relation changes
//! - [`commits`] - Revision to commit lookup tables
//! - [`authors`] - Source author to destination user lookup
//! - [`labels`] - Label, status and milestone mapping
//! - [`links`] - Source and destination issue URLs
//! - [`dates`] - Source timestamp parsing and display
//! - [`model`] - Record types passed between stages
//! - [`config`] - Layered run configuration
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error and diagnostic types

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod authors;
pub mod cli;
pub mod commits;
pub mod config;
pub mod dates;
pub mod error;
pub mod format;
pub mod labels;
pub mod links;
pub mod logging;
pub mod model;
pub mod refs;
pub mod segment;
pub mod updates;

pub use commits::CommitMap;
pub use error::{Diagnostic, MigrateError, Result};
pub use format::{Formatter, FormatterConfig, RewrittenMessage};
pub use model::{Message, MessageKind, Node, RenderedMessage, TextSegment};
pub use refs::{ReferenceRewriter, RewriteContext};
