//! Outbound e-mail
//!
//! The lifecycle engine only sees the [`Notifier`] trait. [`HttpMailer`] posts to a
//! transactional mail HTTP API; [`LogMailer`] writes the message to the log and is
//! used when no API is configured.

mod notifier;

pub use notifier::{mailer_from_config, HttpMailer, LogMailer, Notifier, OutgoingMail};
