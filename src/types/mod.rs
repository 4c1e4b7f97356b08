// ABOUTME: Validated domain types.
// ABOUTME: Parsing happens once at the edge so the rest of the crate can trust the values.

mod app_name;

pub use app_name::{AppName, AppNameError};
