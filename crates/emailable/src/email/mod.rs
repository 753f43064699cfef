//! Email sub-resource types and storage.
//!
//! This module provides:
//! - **Model**: [`EmailRecord`], the owner reference and the [`OwnsEmails`]
//!   capability
//! - **DTO**: [`EmailDto`], the immutable write-shape passed to the service
//! - **Input**: [`EmailInput`], the raw boundary shape (single and bulk form)
//! - **Validation**: input rules applied before anything reaches the service
//! - **Repository**: owner-scoped persistence over `SQLite`

mod dto;
mod input;
mod model;
mod repository;
mod resource;
mod validation;

pub use dto::EmailDto;
pub use input::EmailInput;
pub use model::{EmailId, EmailRecord, OwnerRef, OwnsEmails};
pub use repository::EmailRepository;
pub use resource::EmailResponse;
pub use validation::{ValidationError, ValidationResult, validate_input};
