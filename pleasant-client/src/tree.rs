//! The typed credential tree built from the raw server hierarchy.
//!
//! Folders and entries share one name-keyed namespace per folder level.
//! Secrets are not part of the tree: [`Entry::password`] and
//! [`Attachment::content`] go back to the store on every call.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::api::{RawAttachment, RawEntry, RawFolder, StoreClient};
use crate::error::Error;
use crate::resolve::{self, Resolved};

/// A child of a folder: either a sub-folder or a credential entry.
#[derive(Debug)]
pub enum Node {
    Folder(Folder),
    Entry(Entry),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Folder(f) => f.name(),
            Node::Entry(e) => e.name(),
        }
    }
}

/// A named container of sub-folders and entries, keyed by name in one
/// shared namespace.
#[derive(Debug)]
pub struct Folder {
    name: String,
    children: BTreeMap<String, Node>,
}

impl Folder {
    /// Build a folder subtree from the raw hierarchy.
    ///
    /// Entries are inserted before sub-folders, so a folder sharing a name
    /// with an entry shadows it — the server-side namespace allows the
    /// collision, the path namespace cannot.
    pub(crate) fn build(raw: RawFolder, store: &Arc<dyn StoreClient>) -> Folder {
        let mut children = BTreeMap::new();

        for raw_entry in raw.credentials {
            let entry = Entry::build(raw_entry, store);
            if let Some(prev) = children.insert(entry.name.clone(), Node::Entry(entry)) {
                warn!(parent = %raw.name, child = %prev.name(), "duplicate entry name; keeping the later one");
            }
        }
        for raw_child in raw.children {
            let folder = Folder::build(raw_child, store);
            if let Some(prev) = children.insert(folder.name.clone(), Node::Folder(folder)) {
                warn!(parent = %raw.name, child = %prev.name(), "folder shadows an entry of the same name");
            }
        }

        Folder {
            name: raw.name,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct children, keyed by name.
    pub fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }
}

/// A credential record. The password is never held in memory between
/// accesses — [`Entry::password`] is one blocking round-trip per call.
pub struct Entry {
    id: String,
    name: String,
    username: String,
    url: String,
    custom_fields: BTreeMap<String, String>,
    attachments: BTreeMap<String, Attachment>,
    store: Arc<dyn StoreClient>,
}

impl Entry {
    pub(crate) fn build(raw: RawEntry, store: &Arc<dyn StoreClient>) -> Entry {
        let mut attachments = BTreeMap::new();
        for raw_attachment in raw.attachments {
            let attachment = Attachment::build(raw_attachment, store);
            attachments.insert(attachment.name.clone(), attachment);
        }

        Entry {
            id: raw.id,
            name: raw.name,
            username: raw.username,
            url: raw.url,
            custom_fields: raw.custom_user_fields,
            attachments,
            store: Arc::clone(store),
        }
    }

    /// Fetch a single entry by id, bypassing the hierarchy.
    pub fn fetch_by_id(store: Arc<dyn StoreClient>, entry_id: &str) -> Result<Entry, Error> {
        let raw = store.fetch_entry(entry_id)?;
        Ok(Entry::build(raw, &store))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Custom fields, keyed by field name. Distinct namespace from
    /// [`Entry::attachments`]; a name present in both is a lookup error.
    pub fn custom_fields(&self) -> &BTreeMap<String, String> {
        &self.custom_fields
    }

    /// Attachments, keyed by file name.
    pub fn attachments(&self) -> &BTreeMap<String, Attachment> {
        &self.attachments
    }

    /// Fetch the password from the store. Repeated calls refetch.
    pub fn password(&self) -> Result<Zeroizing<String>, Error> {
        self.store.fetch_password(&self.id)
    }

    /// Download every attachment of this entry into `dir`, creating the
    /// directory if needed. Files are named after the attachments.
    pub fn download_attachments(&self, dir: &Path) -> Result<(), Error> {
        std::fs::create_dir_all(dir)?;
        for attachment in self.attachments.values() {
            attachment.download(&dir.join(attachment.name()))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("url", &self.url)
            // Field values may hold secrets; list only the names.
            .field("custom_fields", &self.custom_fields.keys().collect::<Vec<_>>())
            .field("attachments", &self.attachments.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A named binary blob attached to an entry, addressed by the
/// (owning entry id, attachment id) pair. Content is fetched on demand
/// and never cached.
pub struct Attachment {
    entry_id: String,
    attachment_id: String,
    name: String,
    store: Arc<dyn StoreClient>,
}

impl Attachment {
    fn build(raw: RawAttachment, store: &Arc<dyn StoreClient>) -> Attachment {
        Attachment {
            entry_id: raw.credential_object_id,
            attachment_id: raw.attachment_id,
            name: raw.file_name,
            store: Arc::clone(store),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn attachment_id(&self) -> &str {
        &self.attachment_id
    }

    /// Fetch the binary content from the store. Repeated calls refetch.
    pub fn content(&self) -> Result<Vec<u8>, Error> {
        self.store.fetch_attachment(&self.entry_id, &self.attachment_id)
    }

    /// Fetch the content and write it to `path`.
    pub fn download(&self, path: &Path) -> Result<(), Error> {
        let content = self.content()?;
        std::fs::write(path, &content)?;
        info!(attachment = %self.name, target = %path.display(), "attachment downloaded");
        Ok(())
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("entry_id", &self.entry_id)
            .field("attachment_id", &self.attachment_id)
            .field("name", &self.name)
            .finish()
    }
}

/// The whole credential database: the root folder plus the store handle
/// it was fetched from. Built once per session; read-only afterwards.
#[derive(Debug)]
pub struct Database {
    root: Folder,
}

impl Database {
    /// Fetch the full hierarchy from the store and build the tree.
    /// This is the only network round-trip of tree construction.
    pub fn fetch(store: Arc<dyn StoreClient>) -> Result<Database, Error> {
        let raw = store.fetch_hierarchy()?;
        let root = Folder::build(raw, &store);
        debug!(children = root.children().len(), "credential tree built");
        Ok(Database { root })
    }

    pub fn root(&self) -> &Folder {
        &self.root
    }

    /// Resolve a slash-delimited path to a folder, entry, attachment, or
    /// custom-field value. See [`resolve::lookup`].
    pub fn lookup(&self, path: &str) -> Result<Resolved<'_>, Error> {
        resolve::lookup(&self.root, path)
    }

    /// Resolve `path` and require the result to be an entry.
    pub fn lookup_entry(&self, path: &str) -> Result<&Entry, Error> {
        match self.lookup(path)? {
            Resolved::Entry(entry) => Ok(entry),
            _ => Err(Error::NotAnEntry(path.to_string())),
        }
    }
}
