use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::contact::{Contact, ParseLineError};

pub const DEFAULT_CONTACTS_FILE: &str = "contacts.txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no contact selected")]
    NoSelection,
    #[error("contact index {index} is out of range (store holds {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("malformed record on line {line} of {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParseLineError,
    },
    #[error("failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Errors caused by what the user picked rather than by the filesystem.
    pub fn is_selection(&self) -> bool {
        matches!(self, StoreError::NoSelection | StoreError::OutOfRange { .. })
    }

    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Ordered contact records mirrored to a comma-delimited text file.
///
/// Every mutation rewrites the whole file before returning.
#[derive(Debug)]
pub struct ContactStore {
    path: PathBuf,
    contacts: Vec<Contact>,
}

impl ContactStore {
    /// Open the store at `path`, loading any existing records.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contacts = load(&path)?;
        debug!(path = %path.display(), count = contacts.len(), "loaded contacts");
        Ok(Self { path, contacts })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }

    #[cfg(test)]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    /// Display names in store order.
    pub fn names(&self) -> Vec<String> {
        self.contacts.iter().map(|c| c.name.clone()).collect()
    }

    pub fn append(&mut self, contact: Contact) -> Result<(), StoreError> {
        info!(name = %contact.name, "adding contact");
        self.contacts.push(contact);
        self.rewrite()
    }

    /// Remove the record at `index`. `None` means the caller has nothing
    /// selected.
    pub fn remove_at(&mut self, index: Option<usize>) -> Result<Contact, StoreError> {
        let index = index.ok_or(StoreError::NoSelection)?;
        if index >= self.contacts.len() {
            return Err(StoreError::OutOfRange {
                index,
                len: self.contacts.len(),
            });
        }
        let removed = self.contacts.remove(index);
        info!(index, name = %removed.name, "removed contact");
        self.rewrite()?;
        Ok(removed)
    }

    /// Put a record back at `index`, clamped to the current length.
    pub fn insert_at(&mut self, index: usize, contact: Contact) -> Result<usize, StoreError> {
        let index = index.min(self.contacts.len());
        info!(index, name = %contact.name, "restoring contact");
        self.contacts.insert(index, contact);
        self.rewrite()?;
        Ok(index)
    }

    /// Replace the backing file with the current contents.
    pub fn rewrite(&self) -> Result<(), StoreError> {
        let mut data = String::new();
        for contact in &self.contacts {
            data.push_str(&contact.to_line());
            data.push('\n');
        }
        write_atomic(&self.path, data.as_bytes())?;
        debug!(path = %self.path.display(), count = self.contacts.len(), "rewrote contacts file");
        Ok(())
    }
}

fn load(path: &Path) -> Result<Vec<Contact>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "contacts file missing; starting empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(StoreError::io("read", path, err)),
    };

    let mut contacts = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let contact = line.parse::<Contact>().map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        contacts.push(contact);
    }
    Ok(contacts)
}

/// Write `data` to a sibling temp file, sync it, then rename over `target`.
fn write_atomic(target: &Path, data: &[u8]) -> Result<(), StoreError> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|err| StoreError::io("create directory", &parent, err))?;

    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_CONTACTS_FILE);

    let mut counter: u32 = 0;
    let (temp_path, mut file) = loop {
        let candidate = if counter == 0 {
            parent.join(format!(".{file_name}.tmp"))
        } else {
            parent.join(format!(".{file_name}.{counter}.tmp"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => break (candidate, file),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(err) => return Err(StoreError::io("create temporary file", &candidate, err)),
        }
    };

    let written = file
        .write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|err| StoreError::io("write temporary file", &temp_path, err));
    drop(file);
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::io("replace", target, err));
    }

    if let Ok(dir) = fs::File::open(&parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}
