//! Application identity used to resolve the settings file location

use std::path::{Path, PathBuf};

/// Application identifier used to place the settings file.
///
/// The per-user directory follows the platform convention provided by
/// `directories`:
/// - Linux: `$XDG_DATA_HOME/<app>` or `~/.local/share/<app>`
/// - macOS: `~/Library/Application Support/<qualifier>.<org>.<app>`
/// - Windows: `%APPDATA%\<org>\<app>\data`
///
/// # Example
///
/// ```
/// use settings_store::AppName;
///
/// let app = AppName::new("com", "acme", "Roadrunner");
/// assert_eq!(app.file_name(), "Roadrunner Settings.xml");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AppName {
    #[serde(default)]
    pub qualifier: String,
    #[serde(default)]
    pub organization: String,
    pub application: String,
}

impl AppName {
    /// Create a new application name
    ///
    /// * `qualifier` - Typically a reverse domain name (e.g., "com", "org")
    /// * `organization` - Your organization or username (e.g., "mycompany")
    /// * `application` - The application name (e.g., "myapp")
    pub fn new(
        qualifier: impl Into<String>,
        organization: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            qualifier: qualifier.into(),
            organization: organization.into(),
            application: application.into(),
        }
    }

    /// An application name without qualifier or organization.
    pub fn bare(application: impl Into<String>) -> Self {
        Self::new("", "", application)
    }

    /// `"<application> Settings.xml"`
    pub fn file_name(&self) -> String {
        format!("{} Settings.xml", self.application)
    }

    /// Per-user data directory for this application, if the platform has one.
    pub fn user_data_dir(&self) -> Option<PathBuf> {
        directories::ProjectDirs::from(
            self.qualifier.as_str(),
            self.organization.as_str(),
            self.application.as_str(),
        )
        .map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Settings file inside `dir`.
    pub fn settings_path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}
