//! Shared test fixtures: a counting mock store and a small sample tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use zeroize::Zeroizing;

use crate::api::{RawEntry, RawFolder, StoreClient};
use crate::error::Error;
use crate::tree::Database;

/// Per-operation call counters, shared with the test via `Arc`.
#[derive(Default)]
pub(crate) struct Counters {
    hierarchies: AtomicUsize,
    entries: AtomicUsize,
    passwords: AtomicUsize,
    attachments: AtomicUsize,
}

impl Counters {
    pub fn hierarchies(&self) -> usize {
        self.hierarchies.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    pub fn passwords(&self) -> usize {
        self.passwords.load(Ordering::SeqCst)
    }

    pub fn attachments(&self) -> usize {
        self.attachments.load(Ordering::SeqCst)
    }
}

/// In-memory store serving a fixed raw hierarchy and counting every call.
pub(crate) struct MockStore {
    raw: RawFolder,
    counters: Arc<Counters>,
}

impl MockStore {
    /// Root
    /// ├── Development
    /// │   ├── Ops            (folder)
    /// │   │   └── deploy     (entry e-deploy)
    /// │   └── git            (entry e-git; custom fields Note + dup,
    /// │                       attachments id_rsa, file.txt, dup)
    /// └── Personal           (empty folder)
    pub fn sample() -> Arc<MockStore> {
        let raw = serde_json::from_value(serde_json::json!({
            "Name": "Root",
            "Children": [
                {
                    "Name": "Development",
                    "Children": [
                        {
                            "Name": "Ops",
                            "Children": [],
                            "Credentials": [
                                {
                                    "Id": "e-deploy",
                                    "Name": "deploy",
                                    "Username": "robot",
                                    "Url": "https://deploy.example.com"
                                }
                            ]
                        }
                    ],
                    "Credentials": [
                        {
                            "Id": "e-git",
                            "Name": "git",
                            "Username": "dev",
                            "Url": "https://git.example.com",
                            "CustomUserFields": {
                                "Note": "hello",
                                "dup": "field value"
                            },
                            "Attachments": [
                                {
                                    "CredentialObjectId": "e-git",
                                    "AttachmentId": "a-1",
                                    "FileName": "id_rsa"
                                },
                                {
                                    "CredentialObjectId": "e-git",
                                    "AttachmentId": "a-2",
                                    "FileName": "file.txt"
                                },
                                {
                                    "CredentialObjectId": "e-git",
                                    "AttachmentId": "a-3",
                                    "FileName": "dup"
                                }
                            ]
                        }
                    ]
                },
                {
                    "Name": "Personal",
                    "Children": [],
                    "Credentials": []
                }
            ],
            "Credentials": []
        }))
        .expect("sample fixture must deserialize");

        Arc::new(MockStore {
            raw,
            counters: Arc::new(Counters::default()),
        })
    }

    /// A root whose raw data carries both an entry and a folder named
    /// "Shared" at the same level.
    pub fn with_sibling_collision() -> Arc<MockStore> {
        let raw = serde_json::from_value(serde_json::json!({
            "Name": "Root",
            "Children": [
                { "Name": "Shared", "Children": [], "Credentials": [] }
            ],
            "Credentials": [
                { "Id": "e-shared", "Name": "Shared" }
            ]
        }))
        .expect("collision fixture must deserialize");

        Arc::new(MockStore {
            raw,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

impl StoreClient for MockStore {
    fn fetch_hierarchy(&self) -> Result<RawFolder, Error> {
        self.counters.hierarchies.fetch_add(1, Ordering::SeqCst);
        Ok(self.raw.clone())
    }

    fn fetch_entry(&self, entry_id: &str) -> Result<RawEntry, Error> {
        self.counters.entries.fetch_add(1, Ordering::SeqCst);
        find_entry(&self.raw, entry_id)
            .cloned()
            .ok_or_else(|| Error::Api(format!("no entry {entry_id}")))
    }

    fn fetch_password(&self, entry_id: &str) -> Result<Zeroizing<String>, Error> {
        self.counters.passwords.fetch_add(1, Ordering::SeqCst);
        match entry_id {
            "e-git" => Ok(Zeroizing::new("s3cret".to_string())),
            "e-deploy" => Ok(Zeroizing::new("d3ploy".to_string())),
            other => Err(Error::Api(format!("no entry {other}"))),
        }
    }

    fn fetch_attachment(&self, entry_id: &str, attachment_id: &str) -> Result<Vec<u8>, Error> {
        self.counters.attachments.fetch_add(1, Ordering::SeqCst);
        match (entry_id, attachment_id) {
            ("e-git", "a-1") => Ok(b"key material".to_vec()),
            ("e-git", "a-2") => Ok(b"text content".to_vec()),
            ("e-git", "a-3") => Ok(b"dup content".to_vec()),
            _ => Err(Error::Api(format!("no attachment {entry_id}/{attachment_id}"))),
        }
    }
}

fn find_entry<'a>(folder: &'a RawFolder, entry_id: &str) -> Option<&'a RawEntry> {
    folder
        .credentials
        .iter()
        .find(|e| e.id == entry_id)
        .or_else(|| folder.children.iter().find_map(|f| find_entry(f, entry_id)))
}

/// Database built from [`MockStore::sample`].
pub(crate) fn sample_database() -> Database {
    Database::fetch(MockStore::sample()).expect("sample tree must build")
}
