//! The grouped settings store

use crate::cipher::{Cipher, CommonKey};
use crate::codec::{CodecRegistry, Encoded};
use crate::config::StoreOptions;
use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::events::{EventReceiver, StoreEvent, Subscribers};
use crate::log::LogSink;
use crate::sanitize::clean_non_empty;
use crate::storage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A document of named groups holding named, typed values.
///
/// None of the public methods fail or panic. Errors are reported to the
/// configured [`LogSink`] and as [`StoreEvent::Error`], and the call falls
/// back to the caller's default or leaves the store unchanged. The `try_*`
/// variants expose the underlying [`StoreError`].
///
/// # Example
///
/// ```no_run
/// use settings_store::StoreOptions;
///
/// let mut store = StoreOptions::new("My Settings.xml").open();
/// store.set("Editor", "FontSize", &14u32);
/// store.set("Editor", "Font", "Fira Code");
///
/// assert_eq!(store.get("Editor", "FontSize", 12u32), 14);
/// assert_eq!(store.get("Editor", "Missing", 12u32), 12);
/// ```
pub struct DataStore {
    path: PathBuf,
    document: Document,
    auto_save: bool,
    default_group: String,
    common_key: Option<CommonKey>,
    cipher: Arc<dyn Cipher>,
    log: Arc<dyn LogSink>,
    registry: CodecRegistry,
    subscribers: Subscribers,
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("path", &self.path)
            .field("groups", &self.document.groups.len())
            .field("auto_save", &self.auto_save)
            .field("default_group", &self.default_group)
            .field("encrypted", &self.common_key.is_some())
            .finish_non_exhaustive()
    }
}

impl StoreOptions {
    /// Open the store, loading the backing file.
    pub fn open(self) -> DataStore {
        let mut store = DataStore::unloaded(self);
        store.load_initial();
        store
    }

    /// Open the store with a subscription whose first event is [`StoreEvent::Loaded`].
    pub fn open_with_events(self) -> (DataStore, EventReceiver) {
        let mut store = DataStore::unloaded(self);
        let events = store.subscribe();
        store.load_initial();
        (store, events)
    }

    /// Open the store on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open_in_background(self) -> tokio::task::JoinHandle<(DataStore, EventReceiver)> {
        tokio::task::spawn_blocking(move || self.open_with_events())
    }
}

impl DataStore {
    /// Open a store at `location` with default options.
    pub fn open(location: impl Into<crate::StoreLocation>) -> Self {
        StoreOptions::new(location).open()
    }

    fn unloaded(options: StoreOptions) -> Self {
        let StoreOptions {
            location,
            auto_save,
            default_group,
            common_key,
            cipher,
            log,
            layout,
            registry,
        } = options;

        let path = location.resolve().unwrap_or_else(|e| {
            let fallback = location.fallback_path();
            log.error(&format!(
                "could not resolve settings location, using {}: {}",
                fallback.display(),
                e
            ));
            fallback
        });

        let mut store = Self {
            path,
            document: Document::new(layout),
            auto_save,
            default_group,
            common_key: None,
            cipher,
            log,
            registry,
            subscribers: Subscribers::default(),
        };

        if let Some(passphrase) = common_key {
            store.set_common_key(Some(&passphrase));
        }

        store
    }

    fn load_initial(&mut self) {
        self.document = match storage::load_document(&self.path, self.document.layout) {
            Ok(document) => document,
            Err(e) => {
                self.report("failed to load settings", &e);
                Document::new(self.document.layout)
            }
        };

        self.subscribers.emit(StoreEvent::Loaded {
            path: self.path.clone(),
            groups: self.document.groups.len(),
        });
    }

    fn report(&mut self, context: &str, error: &StoreError) {
        let message = format!("{} ({}): {}", context, self.path.display(), error);
        self.log.error(&message);
        self.subscribers.emit(StoreEvent::Error { message });
    }

    /// Receive future [`StoreEvent`]s.
    pub fn subscribe(&mut self) -> EventReceiver {
        self.subscribers.subscribe()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
    }

    /// Run `f` with auto-save suspended, then write the file once if auto-save was on.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let auto_save = self.auto_save;
        self.auto_save = false;
        let result = f(self);
        self.auto_save = auto_save;
        if auto_save {
            self.save();
        }
        result
    }

    /// Register additional value types.
    pub fn registry_mut(&mut self) -> &mut CodecRegistry {
        &mut self.registry
    }

    pub fn log_sink(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    /// Configure or clear the store-wide passphrase.
    pub fn set_common_key(&mut self, passphrase: Option<&str>) {
        match passphrase.filter(|p| !p.is_empty()) {
            None => self.common_key = None,
            Some(passphrase) => match CommonKey::seal(passphrase) {
                Ok(key) => self.common_key = Some(key),
                Err(e) => {
                    self.common_key = None;
                    self.report("failed to seal common key", &e);
                }
            },
        }
    }

    pub fn has_common_key(&self) -> bool {
        self.common_key.is_some()
    }

    // -- values ------------------------------------------------------------

    /// Store `value` under `group`/`key`.
    pub fn set<T: ?Sized + 'static>(&mut self, group: &str, key: &str, value: &T) {
        if let Err(e) = self.try_set(group, key, value, None) {
            self.report("failed to set value", &e);
        }
    }

    /// Store `value` encrypted with `passphrase`.
    pub fn set_secret<T: ?Sized + 'static>(
        &mut self,
        group: &str,
        key: &str,
        value: &T,
        passphrase: &str,
    ) {
        if let Err(e) = self.try_set(group, key, value, Some(passphrase)) {
            self.report("failed to set value", &e);
        }
    }

    /// Store an explicit null, distinct from both an empty string and a missing entry.
    pub fn set_null(&mut self, group: &str, key: &str) {
        if let Err(e) = self.try_write(group, key, Encoded::Null) {
            self.report("failed to set value", &e);
        }
    }

    /// Read `group`/`key` as `T`, or `default` when missing or unreadable.
    pub fn get<T: 'static>(&self, group: &str, key: &str, default: T) -> T {
        self.try_get(group, key, None)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    /// Read `group`/`key` as an optional value.
    ///
    /// A stored null yields `None`, a missing or unreadable entry yields
    /// `default`. Passing `Some(sentinel)` tells the two cases apart.
    pub fn get_nullable<T: 'static>(&self, group: &str, key: &str, default: Option<T>) -> Option<T> {
        match self.stored(group, key) {
            None => default,
            Some(Encoded::Null) => None,
            Some(_) => self.try_get(group, key, None).ok().flatten().or(default),
        }
    }

    /// Read a value stored with [`set_secret`](Self::set_secret).
    pub fn get_secret<T: 'static>(&self, group: &str, key: &str, default: T, passphrase: &str) -> T {
        self.try_get(group, key, Some(passphrase))
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    /// [`set`](Self::set) against the default group.
    pub fn put<T: ?Sized + 'static>(&mut self, key: &str, value: &T) {
        let group = self.default_group.clone();
        self.set(&group, key, value);
    }

    /// [`get`](Self::get) against the default group.
    pub fn fetch<T: 'static>(&self, key: &str, default: T) -> T {
        self.get(&self.default_group, key, default)
    }

    pub fn try_set<T: ?Sized + 'static>(
        &mut self,
        group: &str,
        key: &str,
        value: &T,
        passphrase: Option<&str>,
    ) -> Result<()> {
        if clean_pair(group, key).is_none() {
            return Ok(());
        }
        let encoded = self.registry.encode(value)?;
        let stored = self.seal(encoded, passphrase)?;
        self.try_write(group, key, stored)
    }

    /// `Ok(None)` for empty names, missing entries, nulls and failed conversions.
    pub fn try_get<T: 'static>(
        &self,
        group: &str,
        key: &str,
        passphrase: Option<&str>,
    ) -> Result<Option<T>> {
        let Some(stored) = self.stored(group, key) else {
            return Ok(None);
        };
        let value = self.unseal(stored, passphrase)?;
        Ok(self.registry.decode::<T>(&value))
    }

    fn try_write(&mut self, group: &str, key: &str, value: Encoded) -> Result<()> {
        let Some((group, key)) = clean_pair(group, key) else {
            return Ok(());
        };
        self.document.group_or_insert(&group).set(&key, value);
        self.persist_if_auto()
    }

    fn stored(&self, group: &str, key: &str) -> Option<&Encoded> {
        let (group, key) = clean_pair(group, key)?;
        self.document
            .group(&group)?
            .entry(&key)
            .map(|entry| &entry.value)
    }

    fn effective_passphrase(&self, explicit: Option<&str>) -> Result<Option<String>> {
        if let Some(passphrase) = explicit.filter(|p| !p.is_empty()) {
            return Ok(Some(passphrase.to_string()));
        }
        self.common_key
            .as_ref()
            .map(CommonKey::reveal)
            .transpose()
    }

    fn seal(&self, value: Encoded, passphrase: Option<&str>) -> Result<Encoded> {
        let plain = match &value {
            Encoded::Null => return Ok(value),
            Encoded::Text(s) | Encoded::Tree(s) => s,
        };
        match self.effective_passphrase(passphrase)? {
            Some(passphrase) => Ok(Encoded::Text(self.cipher.protect(plain, &passphrase)?)),
            None => Ok(value),
        }
    }

    fn unseal(&self, stored: &Encoded, passphrase: Option<&str>) -> Result<Encoded> {
        let sealed = match stored {
            Encoded::Null => return Ok(Encoded::Null),
            Encoded::Text(s) | Encoded::Tree(s) => s,
        };
        match self.effective_passphrase(passphrase)? {
            Some(passphrase) => Ok(Encoded::Text(self.cipher.reveal(sealed, &passphrase)?)),
            None => Ok(stored.clone()),
        }
    }

    // -- structure ---------------------------------------------------------

    pub fn contains(&self, group: &str, key: &str) -> bool {
        self.stored(group, key).is_some()
    }

    /// Whether `group`/`key` holds an explicitly stored null.
    pub fn is_null(&self, group: &str, key: &str) -> bool {
        self.stored(group, key).is_some_and(Encoded::is_null)
    }

    /// The text as persisted, after any encryption; `None` for missing entries and nulls.
    pub fn raw_value(&self, group: &str, key: &str) -> Option<String> {
        self.stored(group, key)
            .and_then(Encoded::as_str)
            .map(str::to_owned)
    }

    pub fn remove(&mut self, group: &str, key: &str) {
        if let Err(e) = self.try_remove(group, key) {
            self.report("failed to remove value", &e);
        }
    }

    /// Returns whether an entry was removed.
    pub fn try_remove(&mut self, group: &str, key: &str) -> Result<bool> {
        let Some((group, key)) = clean_pair(group, key) else {
            return Ok(false);
        };
        let removed = self
            .document
            .group_mut(&group)
            .is_some_and(|g| g.remove(&key));
        if removed {
            self.persist_if_auto()?;
        }
        Ok(removed)
    }

    pub fn remove_group(&mut self, group: &str) {
        if let Err(e) = self.try_remove_group(group) {
            self.report("failed to remove group", &e);
        }
    }

    /// Returns whether a group was removed.
    pub fn try_remove_group(&mut self, group: &str) -> Result<bool> {
        let Some(group) = clean_non_empty(group) else {
            return Ok(false);
        };
        let removed = self.document.remove_group(&group);
        if removed {
            self.persist_if_auto()?;
        }
        Ok(removed)
    }

    pub fn group_exists(&self, group: &str) -> bool {
        clean_non_empty(group).is_some_and(|g| self.document.group(&g).is_some())
    }

    /// Names of all groups, in document order.
    pub fn groups(&self) -> Vec<String> {
        self.document.groups.iter().map(|g| g.name.clone()).collect()
    }

    /// Entry names in `group`, in document order.
    pub fn keys(&self, group: &str) -> Vec<String> {
        clean_non_empty(group)
            .and_then(|g| self.document.group(&g))
            .map(|g| g.entries.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn group_title(&self, group: &str) -> Option<String> {
        let group = clean_non_empty(group)?;
        self.document.group(&group)?.title.clone()
    }

    /// Attach a display title to `group`, creating the group if needed.
    /// An empty title clears it.
    pub fn set_group_title(&mut self, group: &str, title: &str) {
        if let Err(e) = self.try_set_group_title(group, title) {
            self.report("failed to set group title", &e);
        }
    }

    pub fn try_set_group_title(&mut self, group: &str, title: &str) -> Result<()> {
        let Some(group) = clean_non_empty(group) else {
            return Ok(());
        };
        self.document.group_or_insert(&group).title =
            (!title.is_empty()).then(|| title.to_string());
        self.persist_if_auto()
    }

    // -- persistence -------------------------------------------------------

    fn persist_if_auto(&mut self) -> Result<()> {
        if self.auto_save { self.try_save() } else { Ok(()) }
    }

    /// Write the document to disk. Returns whether it succeeded.
    pub fn save(&mut self) -> bool {
        match self.try_save() {
            Ok(()) => true,
            Err(e) => {
                self.report("failed to save settings", &e);
                false
            }
        }
    }

    pub fn try_save(&mut self) -> Result<()> {
        storage::save_document(&self.path, &self.document)?;
        self.subscribers.emit(StoreEvent::Saved {
            path: self.path.clone(),
        });
        Ok(())
    }

    /// Discard the in-memory document and reload it from disk.
    ///
    /// A file that cannot be read leaves an empty document behind.
    pub fn refresh_data(&mut self) {
        if let Err(e) = self.try_refresh() {
            self.report("failed to reload settings", &e);
        }
    }

    pub fn try_refresh(&mut self) -> Result<()> {
        let layout = self.document.layout;
        match storage::load_document(&self.path, layout) {
            Ok(document) => {
                self.document = document;
                self.subscribers.emit(StoreEvent::Refreshed {
                    path: self.path.clone(),
                });
                Ok(())
            }
            Err(e) => {
                self.document = Document::new(layout);
                Err(e)
            }
        }
    }

    /// Delete the backing file and reset to an empty document.
    pub fn delete_file(&mut self) {
        if let Err(e) = self.try_delete_file() {
            self.report("failed to delete settings file", &e);
        }
    }

    /// On failure the in-memory document is left untouched.
    pub fn try_delete_file(&mut self) -> Result<()> {
        storage::delete_document(&self.path)?;
        self.document = Document::new(self.document.layout);
        self.subscribers.emit(StoreEvent::FileDeleted {
            path: self.path.clone(),
        });
        Ok(())
    }
}

fn clean_pair(group: &str, key: &str) -> Option<(String, String)> {
    Some((clean_non_empty(group)?, clean_non_empty(key)?))
}
