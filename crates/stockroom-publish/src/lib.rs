//! Publishing helpers for stockroom.
//!
//! Everything here consumes a finished inventory and touches the outside
//! world: the storefront page, the git repository holding the site, and the
//! image files themselves. Each step fails independently of the scan.

mod config;
mod error;
mod git;
mod render;
mod rename;

pub use config::{CONFIG_FILE_NAME, DEFAULT_PAGE, SiteConfig};
pub use error::{OperationError, PublishError};
pub use git::{DEFAULT_COMMIT_MESSAGE, GitOptions, PublishOutcome, publish};
pub use render::{PageUpdate, encode_inventory, has_inventory_marker, inject_inventory, update_page};
pub use rename::{
    RenameOptions, RenameReport, Renamed, normalize_filenames, normalized_name, validate_filename,
};
