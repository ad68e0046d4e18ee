//! Store configuration: file location, builder options and the JSON config form

use crate::app_name::AppName;
use crate::cipher::{Cipher, DEFAULT_ITERATIONS, PassphraseCipher};
use crate::codec::CodecRegistry;
use crate::document::Layout;
use crate::error::{Result, StoreError};
use crate::log::{LogSink, NoopSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Group used when no group is named explicitly.
pub const DEFAULT_GROUP: &str = "General";

/// Which directory an application-named settings file lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppDir {
    /// The process' current working directory.
    WorkingDir,
    /// The per-user application data directory.
    #[default]
    UserData,
}

/// Where the backing file is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    /// An explicit file path.
    File(PathBuf),
    /// `"<application> Settings.xml"` inside the chosen directory.
    App { app: AppName, dir: AppDir },
}

impl StoreLocation {
    pub fn app(app: AppName, dir: AppDir) -> Self {
        Self::App { app, dir }
    }

    /// Resolve to a concrete path. Directories are created when the file is saved.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            StoreLocation::File(path) => Ok(path.clone()),
            StoreLocation::App {
                app,
                dir: AppDir::WorkingDir,
            } => Ok(app.settings_path_in(&std::env::current_dir()?)),
            StoreLocation::App {
                app,
                dir: AppDir::UserData,
            } => app
                .user_data_dir()
                .map(|dir| app.settings_path_in(&dir))
                .ok_or_else(|| {
                    StoreError::Config(format!(
                        "no per-user data directory for `{}`",
                        app.application
                    ))
                }),
        }
    }

    /// Path used when [`resolve`](Self::resolve) fails: the bare file name, relative.
    pub(crate) fn fallback_path(&self) -> PathBuf {
        match self {
            StoreLocation::File(path) => path.clone(),
            StoreLocation::App { app, .. } => PathBuf::from(app.file_name()),
        }
    }
}

impl From<PathBuf> for StoreLocation {
    fn from(path: PathBuf) -> Self {
        StoreLocation::File(path)
    }
}

impl From<&Path> for StoreLocation {
    fn from(path: &Path) -> Self {
        StoreLocation::File(path.to_path_buf())
    }
}

impl From<&str> for StoreLocation {
    fn from(path: &str) -> Self {
        StoreLocation::File(PathBuf::from(path))
    }
}

/// Builder for [`DataStore`](crate::DataStore).
///
/// # Example
///
/// ```no_run
/// use settings_store::{AppDir, AppName, StoreLocation, StoreOptions, TracingSink};
///
/// let store = StoreOptions::new(StoreLocation::app(AppName::bare("Notepad"), AppDir::UserData))
///     .auto_save(false)
///     .default_group("Editor")
///     .log_sink(TracingSink)
///     .open();
/// # drop(store);
/// ```
pub struct StoreOptions {
    pub(crate) location: StoreLocation,
    pub(crate) auto_save: bool,
    pub(crate) default_group: String,
    pub(crate) common_key: Option<String>,
    pub(crate) cipher: Arc<dyn Cipher>,
    pub(crate) log: Arc<dyn LogSink>,
    pub(crate) layout: Layout,
    pub(crate) registry: CodecRegistry,
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("location", &self.location)
            .field("auto_save", &self.auto_save)
            .field("default_group", &self.default_group)
            .field("common_key", &self.common_key.as_ref().map(|_| ".."))
            .field("layout", &self.layout)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl StoreOptions {
    /// Options with auto-save on, the [`DEFAULT_GROUP`], no encryption and a no-op log sink.
    pub fn new(location: impl Into<StoreLocation>) -> Self {
        Self {
            location: location.into(),
            auto_save: true,
            default_group: DEFAULT_GROUP.to_string(),
            common_key: None,
            cipher: Arc::new(PassphraseCipher::default()),
            log: Arc::new(NoopSink),
            layout: Layout::Grouped,
            registry: CodecRegistry::default(),
        }
    }

    /// Persist after every mutation (default `true`).
    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = enabled;
        self
    }

    pub fn default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }

    /// Encrypt every value with this passphrase unless a call supplies its own.
    pub fn common_key(mut self, passphrase: impl Into<String>) -> Self {
        self.common_key = Some(passphrase.into());
        self
    }

    pub fn cipher(mut self, cipher: impl Cipher + 'static) -> Self {
        self.cipher = Arc::new(cipher);
        self
    }

    pub fn log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.log = Arc::new(sink);
        self
    }

    pub fn shared_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log = sink;
        self
    }

    pub fn registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub(crate) fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Serializable store configuration, typically read from a JSON file.
///
/// ```
/// use settings_store::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{ "path": "app.xml", "auto_save": false }"#).unwrap();
/// assert!(!config.auto_save);
/// assert_eq!(config.default_group, "General");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Explicit file path; takes precedence over `app`.
    pub path: Option<PathBuf>,
    pub app: Option<AppName>,
    pub app_dir: AppDir,
    pub auto_save: bool,
    pub default_group: String,
    pub cipher_iterations: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            app: None,
            app_dir: AppDir::default(),
            auto_save: true,
            default_group: DEFAULT_GROUP.to_string(),
            cipher_iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl StoreConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn location(&self) -> Result<StoreLocation> {
        match (&self.path, &self.app) {
            (Some(path), _) => Ok(StoreLocation::File(path.clone())),
            (None, Some(app)) => Ok(StoreLocation::app(app.clone(), self.app_dir)),
            (None, None) => Err(StoreError::Config(
                "either `path` or `app` must be set".to_string(),
            )),
        }
    }

    pub fn into_options(self) -> Result<StoreOptions> {
        Ok(StoreOptions::new(self.location()?)
            .auto_save(self.auto_save)
            .default_group(self.default_group)
            .cipher(PassphraseCipher::new(self.cipher_iterations)))
    }
}
