//! Infrastructure adapters for the services the lifecycle depends on but does not own:
//! object storage for report media and outbound e-mail.

pub mod mail;
pub mod storage;
