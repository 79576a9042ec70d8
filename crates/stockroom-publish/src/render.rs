//! Inventory encoding and page injection.
//!
//! The storefront page carries its catalog as a script assignment:
//!
//! ```js
//! const inventoryDB = { "name": "Home", "type": "folder", "contents": [ ... ] };
//! ```
//!
//! Publishing replaces that assignment in place and leaves every other byte
//! of the page alone.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use stockroom_core::FolderNode;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::PublishError;

static INVENTORY_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)const inventoryDB\s*=\s*\{.*?\};").expect("inventory pattern is valid")
});

/// Result of [`update_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageUpdate {
    /// The page already held this inventory; nothing was written.
    Unchanged,
    /// The page was rewritten.
    Written {
        /// Size of the new page in bytes.
        bytes: usize,
    },
}

/// Encode the inventory as indented JSON safe to embed in a `<script>`.
///
/// `<`, `>`, `&` and `;` are written as `\u` escapes. They can only occur
/// inside string values, so the output stays valid JSON, can never close the
/// script element, and never contains the `};` that ends the assignment.
pub fn encode_inventory(root: &FolderNode) -> Result<String, PublishError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    root.serialize(&mut serializer)?;
    let json = String::from_utf8_lossy(&buf);
    Ok(escape_for_script(&json))
}

fn escape_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            ';' => out.push_str("\\u003b"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Check whether a page has an inventory assignment to replace.
pub fn has_inventory_marker(template: &str) -> bool {
    INVENTORY_ASSIGNMENT.is_match(template)
}

/// Replace the first inventory assignment in `template` with `json`.
///
/// Returns `None` when the page has no assignment.
pub fn inject_inventory(template: &str, json: &str) -> Option<String> {
    if !has_inventory_marker(template) {
        return None;
    }
    let replacement = format!("const inventoryDB = {json};");
    Some(
        INVENTORY_ASSIGNMENT
            .replace(template, NoExpand(&replacement))
            .into_owned(),
    )
}

/// Write the inventory into the page at `page`.
///
/// The page is replaced atomically: a failure at any step leaves the old
/// page untouched.
pub fn update_page(page: &Path, root: &FolderNode) -> Result<PageUpdate, PublishError> {
    if !page.is_file() {
        return Err(PublishError::PageNotFound {
            path: page.to_path_buf(),
        });
    }

    let template = fs::read_to_string(page).map_err(|e| PublishError::io(page, e))?;
    let json = encode_inventory(root)?;
    let updated = inject_inventory(&template, &json).ok_or_else(|| PublishError::MarkerNotFound {
        path: page.to_path_buf(),
    })?;

    if updated == template {
        debug!(page = %page.display(), "page already up to date");
        return Ok(PageUpdate::Unchanged);
    }

    write_atomic(page, updated.as_bytes())?;
    debug!(page = %page.display(), bytes = updated.len(), "page written");
    Ok(PageUpdate::Written {
        bytes: updated.len(),
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PublishError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PublishError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| PublishError::io(tmp.path(), e))?;
    if let Ok(meta) = fs::metadata(path) {
        let _ = fs::set_permissions(tmp.path(), meta.permissions());
    }
    tmp.persist(path).map_err(|e| PublishError::io(path, e.error))?;
    Ok(())
}
