//! Single-namespace variant of the store

use crate::config::{StoreLocation, StoreOptions};
use crate::controls::SettingControl;
use crate::document::{FLAT_GROUP, Layout};
use crate::events::EventReceiver;
use crate::store::DataStore;
use std::path::Path;

/// A settings file with one implicit namespace and no encryption.
///
/// Entries sit directly under the root element. Controls are saved under
/// their bare name.
///
/// ```no_run
/// use settings_store::FlatStore;
///
/// let mut saver = FlatStore::open("Dialog Settings.xml");
/// saver.set("LastFolder", "/home/ada");
/// assert_eq!(saver.get("LastFolder", String::new()), "/home/ada");
/// ```
#[derive(Debug)]
pub struct FlatStore {
    inner: DataStore,
}

impl FlatStore {
    pub fn open(location: impl Into<StoreLocation>) -> Self {
        Self::with_options(StoreOptions::new(location))
    }

    /// Open with custom options. Any common key in `options` is ignored.
    pub fn with_options(mut options: StoreOptions) -> Self {
        options.common_key = None;
        Self {
            inner: options.layout(Layout::Flat).open(),
        }
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn auto_saves(&self) -> bool {
        self.inner.auto_save()
    }

    pub fn set_auto_save(&mut self, enabled: bool) {
        self.inner.set_auto_save(enabled);
    }

    pub fn subscribe(&mut self) -> EventReceiver {
        self.inner.subscribe()
    }

    pub fn registry_mut(&mut self) -> &mut crate::CodecRegistry {
        self.inner.registry_mut()
    }

    pub fn set<T: ?Sized + 'static>(&mut self, key: &str, value: &T) {
        self.inner.set(FLAT_GROUP, key, value);
    }

    pub fn set_null(&mut self, key: &str) {
        self.inner.set_null(FLAT_GROUP, key);
    }

    pub fn get<T: 'static>(&self, key: &str, default: T) -> T {
        self.inner.get(FLAT_GROUP, key, default)
    }

    /// `None` for a stored null, `default` for a missing or unreadable entry.
    pub fn get_nullable<T: 'static>(&self, key: &str, default: Option<T>) -> Option<T> {
        self.inner.get_nullable(FLAT_GROUP, key, default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(FLAT_GROUP, key)
    }

    pub fn is_null(&self, key: &str) -> bool {
        self.inner.is_null(FLAT_GROUP, key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys(FLAT_GROUP)
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(FLAT_GROUP, key);
    }

    pub fn save(&mut self) -> bool {
        self.inner.save()
    }

    pub fn refresh_data(&mut self) {
        self.inner.refresh_data();
    }

    pub fn delete_file(&mut self) {
        self.inner.delete_file();
    }

    /// Save the state of `control` under its name.
    pub fn auto_save(&mut self, control: &dyn SettingControl) {
        let value = control.value();
        self.inner
            .write_control_value(FLAT_GROUP, control.setting_name(), &value);
    }

    /// Restore `control` from the entry under its name, keeping its state when absent.
    pub fn auto_load(&self, control: &mut dyn SettingControl) {
        let current = control.value();
        let restored = self
            .inner
            .read_control_value(FLAT_GROUP, control.setting_name(), current);
        control.apply(restored);
    }

    /// Save several controls, writing the file once when auto-save is on.
    pub fn auto_save_all<'a, I>(&mut self, controls: I)
    where
        I: IntoIterator<Item = &'a dyn SettingControl>,
    {
        self.inner.batch(|inner| {
            for control in controls {
                inner.write_control_value(FLAT_GROUP, control.setting_name(), &control.value());
            }
        });
    }

    pub fn auto_load_all<'a, I>(&self, controls: I)
    where
        I: IntoIterator<Item = &'a mut dyn SettingControl>,
    {
        for control in controls {
            self.auto_load(control);
        }
    }
}
