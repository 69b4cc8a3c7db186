//! Shared test utilities for the pam-stack workspace.
//!
//! This crate provides standardised stack-file fixtures and a temporary
//! PAM layout. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`]: empty, full, broken and combined stack files
//! - [`target`]: [`TestTarget`] builder for a temporary `/etc`-like layout

pub mod fixtures;
pub mod target;

pub use target::TestTarget;
