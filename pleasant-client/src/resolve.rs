//! Path resolution over the credential tree.
//!
//! A path names a node (or an entry sub-field) by walking folder and
//! entry names from the root, separated by `/`. The final segment of a
//! path ending on an entry may name either a custom field or an
//! attachment; those two namespaces are disjoint per entry, and a name
//! occurring in both is reported as an error rather than resolved by
//! preference.

use crate::error::Error;
use crate::tree::{Attachment, Entry, Folder, Node};

/// The result of a successful [`lookup`].
#[derive(Debug)]
pub enum Resolved<'a> {
    Folder(&'a Folder),
    Entry(&'a Entry),
    Attachment(&'a Attachment),
    /// The string value of an entry's custom field.
    Field(&'a str),
}

/// Resolve `path` against `root`.
///
/// Leading and trailing separators are ignored; the empty path (and the
/// bare separator) name the root folder itself. Traversal is iterative,
/// consuming one segment per step:
///
/// - segments exhausted on a folder or entry: that node is the result;
/// - an entry with exactly one segment left: the segment names a
///   sub-field (custom field or attachment) of the entry;
/// - an entry with more segments left: entries have no children, so the
///   next segment cannot exist;
/// - a folder: descend into the named child.
pub fn lookup<'a>(root: &'a Folder, path: &str) -> Result<Resolved<'a>, Error> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Resolved::Folder(root));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    let mut folder = root;
    let mut rest = segments.as_slice();

    loop {
        let name = rest[0];
        rest = &rest[1..];

        let child = folder
            .child(name)
            .ok_or_else(|| not_found(path, name))?;

        match child {
            Node::Folder(sub) => {
                if rest.is_empty() {
                    return Ok(Resolved::Folder(sub));
                }
                folder = sub;
            }
            Node::Entry(entry) => {
                return match rest {
                    [] => Ok(Resolved::Entry(entry)),
                    [field] => entry_field(entry, field, path),
                    [next, ..] => Err(not_found(path, next)),
                };
            }
        }
    }
}

/// Sub-field lookup on an entry: the name must live in exactly one of
/// the attachment and custom-field namespaces.
fn entry_field<'a>(entry: &'a Entry, name: &str, path: &str) -> Result<Resolved<'a>, Error> {
    let attachment = entry.attachments().get(name);
    let field = entry.custom_fields().get(name);

    match (attachment, field) {
        (Some(_), Some(_)) => Err(Error::EntryNotDistinct {
            path: path.to_string(),
            field: name.to_string(),
        }),
        (Some(attachment), None) => Ok(Resolved::Attachment(attachment)),
        (None, Some(value)) => Ok(Resolved::Field(value)),
        (None, None) => Err(not_found(path, name)),
    }
}

fn not_found(path: &str, element: &str) -> Error {
    Error::ElementNotFound {
        path: path.to_string(),
        element: element.to_string(),
    }
}
