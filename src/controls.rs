//! Saving and restoring UI control state
//!
//! The store does not know about any widget toolkit. The UI layer maps each
//! of its widgets to one of the closed set of [`SettingKind`]s by
//! implementing [`SettingControl`], and the store persists the
//! [`ControlValue`] under a key derived from the control's name.

use crate::store::DataStore;

/// The closed set of control states the store knows how to persist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKind {
    /// Checked / unchecked.
    Toggle,
    /// Index of the selected item, `-1` for none.
    SelectedIndex,
    /// A numeric spinner or slider value.
    NumericValue,
    /// Anything else, persisted as its text.
    FreeText,
    /// Indices of all selected items.
    MultiSelection,
}

impl SettingKind {
    /// Suffix appended to the control name to form its key in a grouped store.
    pub fn key_suffix(self) -> &'static str {
        match self {
            SettingKind::Toggle => "Checked",
            SettingKind::SelectedIndex => "SelectedIndex",
            SettingKind::NumericValue => "Value",
            SettingKind::FreeText => "Text",
            SettingKind::MultiSelection => "SelectedIndices",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    Toggle(bool),
    SelectedIndex(i32),
    NumericValue(f64),
    FreeText(String),
    MultiSelection(Vec<usize>),
}

impl ControlValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            ControlValue::Toggle(_) => SettingKind::Toggle,
            ControlValue::SelectedIndex(_) => SettingKind::SelectedIndex,
            ControlValue::NumericValue(_) => SettingKind::NumericValue,
            ControlValue::FreeText(_) => SettingKind::FreeText,
            ControlValue::MultiSelection(_) => SettingKind::MultiSelection,
        }
    }
}

/// A UI control whose state can be saved to and loaded from a store.
pub trait SettingControl {
    /// Stable identifier the key is derived from.
    fn setting_name(&self) -> &str;

    /// Current state of the control.
    fn value(&self) -> ControlValue;

    /// Restore a previously saved state.
    fn apply(&mut self, value: ControlValue);

    /// Kind whose suffix forms the key; the kind of [`value`](Self::value) by default.
    fn kind(&self) -> SettingKind {
        self.value().kind()
    }
}

/// `<name>_<suffix>`, e.g. `chkWrap_Checked`.
pub fn control_key(name: &str, kind: SettingKind) -> String {
    format!("{}_{}", name, kind.key_suffix())
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn split_indices(text: &str) -> Option<Vec<usize>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

impl DataStore {
    pub(crate) fn write_control_value(&mut self, group: &str, key: &str, value: &ControlValue) {
        match value {
            ControlValue::Toggle(checked) => self.set(group, key, checked),
            ControlValue::SelectedIndex(index) => self.set(group, key, index),
            ControlValue::NumericValue(number) => self.set(group, key, number),
            ControlValue::FreeText(text) => self.set(group, key, text.as_str()),
            ControlValue::MultiSelection(indices) => {
                self.set(group, key, join_indices(indices).as_str())
            }
        }
    }

    /// Read a control value, using `current` as the default.
    pub(crate) fn read_control_value(
        &self,
        group: &str,
        key: &str,
        current: ControlValue,
    ) -> ControlValue {
        match current {
            ControlValue::Toggle(checked) => ControlValue::Toggle(self.get(group, key, checked)),
            ControlValue::SelectedIndex(index) => {
                ControlValue::SelectedIndex(self.get(group, key, index))
            }
            ControlValue::NumericValue(number) => {
                ControlValue::NumericValue(self.get(group, key, number))
            }
            ControlValue::FreeText(text) => ControlValue::FreeText(self.get(group, key, text)),
            ControlValue::MultiSelection(indices) => {
                let parsed = self
                    .try_get::<String>(group, key, None)
                    .ok()
                    .flatten()
                    .and_then(|text| split_indices(&text));
                ControlValue::MultiSelection(parsed.unwrap_or(indices))
            }
        }
    }

    /// Save the state of `control` in the default group.
    pub fn save_control(&mut self, control: &dyn SettingControl) {
        let value = control.value();
        let key = control_key(control.setting_name(), control.kind());
        let group = self.default_group().to_string();
        self.write_control_value(&group, &key, &value);
    }

    /// Restore the state of `control` from the default group, keeping its
    /// current state when nothing was saved.
    pub fn load_control(&self, control: &mut dyn SettingControl) {
        let current = control.value();
        let key = control_key(control.setting_name(), control.kind());
        let restored = self.read_control_value(self.default_group(), &key, current);
        control.apply(restored);
    }

    /// Save several controls, writing the file once at the end when auto-save is on.
    pub fn save_controls<'a, I>(&mut self, controls: I)
    where
        I: IntoIterator<Item = &'a dyn SettingControl>,
    {
        self.batch(|store| {
            for control in controls {
                store.save_control(control);
            }
        });
    }

    pub fn load_controls<'a, I>(&self, controls: I)
    where
        I: IntoIterator<Item = &'a mut dyn SettingControl>,
    {
        for control in controls {
            self.load_control(control);
        }
    }
}
