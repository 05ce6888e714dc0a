//! CLI command handlers. Each command is in its own file.

mod checksum;
mod fields;
mod upload;
mod validate;

pub use checksum::run_checksum;
pub use fields::run_fields;
pub use upload::run_upload;
pub use validate::run_validate;
