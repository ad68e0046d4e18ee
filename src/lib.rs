//! Settings Store
//!
//! A small document-oriented settings store for desktop applications.
//! Values live in named groups inside a single XML file next to the
//! application or in the per-user data directory.
//!
//! # Features
//!
//! - Typed get/set with a caller-supplied default on every read
//! - Group-based organization with optional group titles
//! - Optional per-entry encryption, per call or with a store-wide common key
//! - Auto-save after every mutation, or explicit [`DataStore::save`]
//! - A flat single-namespace variant, [`FlatStore`]
//! - Control state persistence through [`SettingControl`]
//! - Never fails outward: errors are logged and the default is returned
//!
//! # Example
//!
//! ```no_run
//! use settings_store::{AppDir, AppName, StoreLocation, StoreOptions, TracingSink};
//!
//! let location = StoreLocation::app(AppName::new("com", "example", "Notepad"), AppDir::UserData);
//! let mut store = StoreOptions::new(location).log_sink(TracingSink).open();
//!
//! store.set("Editor", "WordWrap", &true);
//! store.set_secret("Sync", "Token", "s3cr3t", "passphrase");
//!
//! let wrap = store.get("Editor", "WordWrap", false);
//! let token = store.get_secret("Sync", "Token", String::new(), "passphrase");
//! # let _ = (wrap, token);
//! ```

mod app_name;
mod cipher;
mod codec;
mod config;
mod controls;
mod document;
mod error;
mod events;
mod flat;
mod log;
mod sanitize;
mod storage;
mod store;

pub use app_name::AppName;
pub use cipher::{Cipher, CommonKey, DEFAULT_ITERATIONS, PassphraseCipher};
pub use codec::{CodecRegistry, Color, DATE_FORMAT, Encoded, SymbolicEnum};
pub use config::{AppDir, DEFAULT_GROUP, StoreConfig, StoreLocation, StoreOptions};
pub use controls::{ControlValue, SettingControl, SettingKind, control_key};
pub use document::{Document, Entry, Group, Layout};
pub use error::{Result, StoreError};
pub use events::{EventReceiver, StoreEvent};
pub use flat::FlatStore;
pub use log::{Level, LogSink, MemorySink, NoopSink, TracingSink};
pub use sanitize::clean;
pub use storage::{delete_document, load_document, save_document};
pub use store::DataStore;
