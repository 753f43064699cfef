//! Business rules over the email repository.

mod emails;

pub use emails::EmailService;
