//! Appy Link Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Appy Link components:
//! - `storefront` - Public supplier directory, submission and contact forms
//! - `admin` - Moderation portal and catalog management
//! - `cli` - Command-line tools for migrations, seeding and role management
//!
//! # Architecture
//!
//! The core crate contains types and pure logic. It has no database access
//! and no HTTP clients; the only I/O is [`env`] reading process variables.
//! Everything here can be exercised from unit tests without a running
//! database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, category slugs and statuses
//! - [`catalog`] - Categories, providers, submissions and contact messages
//! - [`directory`] - Filtering, sorting and paging of the provider list
//! - [`validation`] - Field-level form validation
//! - [`selection`] - Favorites and the capped compare set
//! - [`throttle`] - Honeypot and cooldown guards for public forms
//! - [`access`] - Session authorization capability
//! - [`moderation`] - Submission review transitions and category deletion guard
//! - [`env`] - Environment variable reading and secret checks for the binaries
//! - [`seed`] - Built-in directory used when no database is configured

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod catalog;
pub mod directory;
pub mod env;
pub mod moderation;
pub mod seed;
pub mod selection;
pub mod throttle;
pub mod types;
pub mod validation;

pub use types::*;
