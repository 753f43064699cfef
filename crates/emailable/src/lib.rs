//! # emailable
//!
//! Reusable email address sub-resources that any parent entity (facility,
//! user, organization, ...) can own through a polymorphic reference.
//!
//! This crate provides:
//! - **Email records** - typed, flagged email addresses tied to one owner
//! - **Primary enforcement** - at most one primary email per owner
//! - **Verification tracking** - one-way verified flag with timestamp
//! - **Bulk sync** - reconcile an owner's whole email set in one call
//! - **Boundary validation** - input shape checks before anything persists

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod email;
mod error;
pub mod service;

pub use config::EmailConfig;
pub use email::{
    EmailDto, EmailId, EmailInput, EmailRecord, EmailRepository, EmailResponse, OwnerRef,
    OwnsEmails, ValidationError, ValidationResult, validate_input,
};
pub use error::{Error, Result};
pub use service::EmailService;
