//! Identifier cleaning for group and entry names

/// Strip everything that is not an ASCII letter, digit, `_`, `.` or `-`.
///
/// Group and entry names become element names and attribute values in the
/// backing document, so every name passes through here before lookup,
/// creation or deletion. A name that would start with a digit, `.` or `-`
/// gets a leading `_` so it stays a valid XML element name. The result is
/// idempotent: `clean(clean(s)) == clean(s)`.
pub fn clean(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    match cleaned.chars().next() {
        Some(first) if first.is_ascii_digit() || matches!(first, '.' | '-') => {
            format!("_{}", cleaned)
        }
        _ => cleaned,
    }
}

/// Clean a name, returning `None` when nothing usable is left.
pub(crate) fn clean_non_empty(name: &str) -> Option<String> {
    let cleaned = clean(name);
    (!cleaned.is_empty()).then_some(cleaned)
}
