//! Error type shared by the store internals

use std::io;

/// Errors produced by the internal `try_*` operations of the store.
///
/// The public, infallible API never returns these; it logs them through the
/// configured [`LogSink`](crate::LogSink) and falls back to a default.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed settings document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed escape sequence: {0}")]
    XmlEscape(#[from] quick_xml::escape::EscapeError),

    #[error("invalid settings document: {0}")]
    InvalidDocument(String),

    #[error("cipher failure: {0}")]
    Cipher(String),

    #[error("value could not be encoded: {0}")]
    Codec(String),

    #[error("no codec registered for type `{0}`")]
    UnregisteredType(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
