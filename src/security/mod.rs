//! Keeping secrets out of operator-facing output.

pub mod credential_scrubber;

pub use credential_scrubber::{safe_error_message, scrub_credentials, scrub_secret};
