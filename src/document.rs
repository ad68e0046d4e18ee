//! In-memory settings document and its XML form
//!
//! Grouped layout:
//!
//! ```xml
//! <Settings xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
//!   <Group Name="Window" Title="Main window">
//!     <Width>800</Width>
//!     <LastFile xsi:nil="true" />
//!   </Group>
//! </Settings>
//! ```
//!
//! Flat layout keeps the entries directly under the root element.
//!
//! Values are written as escaped text but otherwise verbatim. Control
//! characters other than tab, newline and carriage return are not allowed in
//! XML 1.0; such values round-trip through this store but make the file
//! unreadable for strict XML parsers. Store them as `Vec<u8>` (base64) when
//! that matters.

use crate::codec::Encoded;
use crate::error::{Result, StoreError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

const ROOT_ELEMENT: &str = "Settings";
const GROUP_ELEMENT: &str = "Group";
const NAME_ATTR: &str = "Name";
const TITLE_ATTR: &str = "Title";
const NIL_ATTR: &str = "xsi:nil";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Group name used internally to hold the entries of a flat document.
pub(crate) const FLAT_GROUP: &str = "_";

/// How groups are laid out in the backing file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// `Group` elements under the root, entries inside each group.
    #[default]
    Grouped,
    /// Entries directly under the root, a single implicit namespace.
    Flat,
}

/// A single named value inside a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub value: Encoded,
}

/// A named partition of entries with an optional display title.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub title: Option<String>,
    pub entries: Vec<Entry>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Insert or overwrite `name`, keeping the original position of an existing entry.
    pub fn set(&mut self, name: &str, value: Encoded) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove `name`, returning whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }
}

/// An ordered forest of groups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub layout: Layout,
    pub groups: Vec<Group>,
}

impl Document {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            groups: Vec::new(),
        }
    }

    /// First group named `name`.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.name == name)
    }

    /// The group named `name`, appended if it does not exist yet.
    pub fn group_or_insert(&mut self, name: &str) -> &mut Group {
        let index = match self.groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    pub fn remove_group(&mut self, name: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.name != name);
        self.groups.len() != before
    }

    /// Parse a document. Empty or whitespace-only input yields an empty document.
    pub fn parse(xml: &str, layout: Layout) -> Result<Self> {
        let mut document = Document::new(layout);
        if xml.trim().is_empty() {
            return Ok(document);
        }

        let mut reader = Reader::from_str(xml);
        let mut saw_root = false;
        let mut current: Option<Group> = None;

        loop {
            match reader.read_event()? {
                Event::Start(_) if !saw_root => {
                    saw_root = true;
                    if layout == Layout::Flat {
                        current = Some(Group::new(FLAT_GROUP));
                    }
                }
                Event::Empty(_) if !saw_root => {
                    saw_root = true;
                    break;
                }
                Event::Start(e) => match current.as_mut() {
                    Some(group) => {
                        let name = element_name(&e);
                        let end = e.to_end().into_owned();
                        let raw = reader.read_text(end.name())?;
                        group.set(&name, content_value(&raw)?);
                    }
                    None if e.name().as_ref() == GROUP_ELEMENT.as_bytes() => {
                        current = Some(group_from_attributes(&e)?);
                    }
                    None => {
                        let end = e.to_end().into_owned();
                        reader.read_to_end(end.name())?;
                    }
                },
                Event::Empty(e) => match current.as_mut() {
                    Some(group) => {
                        let name = element_name(&e);
                        let value = if has_nil_marker(&e)? {
                            Encoded::Null
                        } else {
                            Encoded::Text(String::new())
                        };
                        group.set(&name, value);
                    }
                    None if e.name().as_ref() == GROUP_ELEMENT.as_bytes() => {
                        push_group(&mut document, group_from_attributes(&e)?);
                    }
                    None => {}
                },
                Event::End(_) => match current.take() {
                    Some(group) if layout == Layout::Grouped => push_group(&mut document, group),
                    Some(group) => {
                        push_group(&mut document, group);
                        break;
                    }
                    None => break,
                },
                Event::Eof => {
                    if !saw_root || current.is_some() {
                        return Err(StoreError::InvalidDocument(
                            "unexpected end of document".to_string(),
                        ));
                    }
                    break;
                }
                _ => {}
            }
        }

        if !saw_root {
            return Err(StoreError::InvalidDocument(
                "missing root element".to_string(),
            ));
        }

        Ok(document)
    }

    /// Serialize the document as indented XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new(ROOT_ELEMENT);
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        writer.write_event(Event::Start(root))?;

        match self.layout {
            Layout::Grouped => {
                for group in &self.groups {
                    let mut start = BytesStart::new(GROUP_ELEMENT);
                    start.push_attribute((NAME_ATTR, group.name.as_str()));
                    if let Some(title) = &group.title {
                        start.push_attribute((TITLE_ATTR, title.as_str()));
                    }

                    if group.entries.is_empty() {
                        writer.write_event(Event::Empty(start))?;
                        continue;
                    }

                    writer.write_event(Event::Start(start))?;
                    write_entries(&mut writer, &group.entries)?;
                    writer.write_event(Event::End(BytesEnd::new(GROUP_ELEMENT)))?;
                }
            }
            Layout::Flat => {
                for group in &self.groups {
                    write_entries(&mut writer, &group.entries)?;
                }
            }
        }

        writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))
    }
}

fn push_group(document: &mut Document, group: Group) {
    match document.group_mut(&group.name) {
        Some(existing) => {
            for entry in group.entries {
                existing.set(&entry.name, entry.value);
            }
            if existing.title.is_none() {
                existing.title = group.title;
            }
        }
        None => document.groups.push(group),
    }
}

fn write_entries(writer: &mut Writer<Vec<u8>>, entries: &[Entry]) -> Result<()> {
    for entry in entries {
        match &entry.value {
            Encoded::Null => {
                let mut empty = BytesStart::new(entry.name.as_str());
                empty.push_attribute((NIL_ATTR, "true"));
                writer.write_event(Event::Empty(empty))?;
            }
            Encoded::Text(text) => {
                writer.write_event(Event::Start(BytesStart::new(entry.name.as_str())))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(BytesEnd::new(entry.name.as_str())))?;
            }
            Encoded::Tree(fragment) => {
                writer.write_event(Event::Start(BytesStart::new(entry.name.as_str())))?;
                writer.write_event(Event::Text(BytesText::from_escaped(fragment.as_str())))?;
                writer.write_event(Event::End(BytesEnd::new(entry.name.as_str())))?;
            }
        }
    }
    Ok(())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn group_from_attributes(e: &BytesStart<'_>) -> Result<Group> {
    let mut group = Group::default();
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            key if key == NAME_ATTR.as_bytes() => group.name = attr.unescape_value()?.into_owned(),
            key if key == TITLE_ATTR.as_bytes() => {
                group.title = Some(attr.unescape_value()?.into_owned())
            }
            _ => {}
        }
    }
    Ok(group)
}

fn has_nil_marker(e: &BytesStart<'_>) -> Result<bool> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"nil" {
            return Ok(attr.unescape_value()?.trim().eq_ignore_ascii_case("true"));
        }
    }
    Ok(false)
}

/// Raw element content becomes a tree when it holds child elements, text otherwise.
fn content_value(raw: &str) -> Result<Encoded> {
    let trimmed = raw.trim();
    if trimmed.starts_with('<') {
        Ok(Encoded::Tree(trimmed.to_string()))
    } else {
        Ok(Encoded::Text(quick_xml::escape::unescape(raw)?.into_owned()))
    }
}
