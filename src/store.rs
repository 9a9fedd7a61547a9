//! JSON-backed persistence for the account directory.
//!
//! The store is a single flat file holding the whole directory. Every save
//! rewrites it from scratch: the file is opened, truncated, serialized into,
//! flushed and closed. There is no append log and no locking; a single
//! process is assumed to own the file, and concurrent access from a second
//! process is undefined (last writer wins).

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dto::AccountRecord;
use crate::Error;

/// Path-owning handle to the persisted user store.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole store. Returns `Ok(None)` exactly when the file does
    /// not exist yet; any other read or parse failure propagates as an error
    /// instead of being mistaken for a fresh install.
    pub fn load(&self) -> Result<Option<HashMap<String, AccountRecord>>, Error> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "user store not found");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let accounts: HashMap<String, AccountRecord> =
            serde_json::from_reader(BufReader::new(file))?;
        debug!(
            path = %self.path.display(),
            accounts = accounts.len(),
            "user store loaded"
        );
        Ok(Some(accounts))
    }

    /// Serializes the full directory state to the store, overwriting it.
    /// Keys are written in sorted order, so saving an unchanged directory
    /// reproduces the file byte for byte.
    pub fn save(&self, accounts: &HashMap<String, AccountRecord>) -> Result<(), Error> {
        let ordered: BTreeMap<&String, &AccountRecord> = accounts.iter().collect();
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &ordered)?;
        writer.flush()?;
        debug!(
            path = %self.path.display(),
            accounts = accounts.len(),
            "user store saved"
        );
        Ok(())
    }
}
