//! Typed values to and from their canonical stored form
//!
//! Every value written to the store goes through a [`CodecRegistry`], a
//! `TypeId`-keyed table of `(encode, decode)` function pairs. The default
//! registry knows about the primitive types, strings, dates, byte blobs and
//! [`Color`]; applications add their own enumerations with
//! [`CodecRegistry::register_enum`] and serde types with
//! [`CodecRegistry::register_structured`].
//!
//! Decoding never fails outward: a value that cannot be converted simply
//! yields `None`, and the store hands back the caller's default.

use crate::error::{Result, StoreError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Timestamp layout used for [`NaiveDateTime`] values (`MM/dd/yyyy hh:mm:ss.fff tt`).
pub const DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S%.3f %p";

/// The canonical stored form of a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encoded {
    /// An explicitly stored null, distinct from an empty string.
    Null,
    /// Plain text content.
    Text(String),
    /// A structured XML fragment kept as the entry's child content.
    Tree(String),
}

impl Encoded {
    /// The textual payload, or `None` for a stored null.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Encoded::Null => None,
            Encoded::Text(s) | Encoded::Tree(s) => Some(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Encoded::Null)
    }
}

/// An ARGB color stored as its signed 32-bit integer value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    pub const fn from_argb(value: i32) -> Self {
        let bits = value as u32;
        Self {
            a: (bits >> 24) as u8,
            r: (bits >> 16) as u8,
            g: (bits >> 8) as u8,
            b: bits as u8,
        }
    }

    pub const fn to_argb(self) -> i32 {
        (((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32)
            as i32
    }
}

/// An enumeration stored by the symbolic name of its variant.
///
/// Implement it by hand or with [`symbolic_enum!`](crate::symbolic_enum), then
/// call [`CodecRegistry::register_enum`].
pub trait SymbolicEnum: Sized + Copy + 'static {
    /// Every variant, in declaration order.
    fn variants() -> &'static [Self];

    /// The symbolic name written to the document.
    fn name(&self) -> &'static str;
}

/// Implement [`SymbolicEnum`] for a fieldless enum.
///
/// ```
/// use settings_store::{SymbolicEnum, symbolic_enum};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Theme { Light, Dark }
///
/// symbolic_enum!(Theme { Light, Dark });
///
/// assert_eq!(Theme::Dark.name(), "Dark");
/// ```
#[macro_export]
macro_rules! symbolic_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::SymbolicEnum for $ty {
            fn variants() -> &'static [Self] {
                &[$($ty::$variant),+]
            }

            fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

struct CodecEntry {
    type_name: &'static str,
    encode: Option<Box<dyn Any + Send + Sync>>,
    decode: Option<Box<dyn Any + Send + Sync>>,
}

/// Table of `(encode, decode)` pairs keyed by the value's type.
pub struct CodecRegistry {
    codecs: HashMap<TypeId, CodecEntry>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.codecs.values().map(|c| c.type_name).collect();
        names.sort_unstable();
        f.debug_struct("CodecRegistry").field("types", &names).finish()
    }
}

macro_rules! register_parsed {
    ($registry:ident: $($ty:ty),+ $(,)?) => {
        $( $registry.register::<$ty>(encode_display::<$ty>, decode_parsed::<$ty>); )+
    };
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        register_parsed!(registry:
            i8, i16, i32, i64, i128, isize,
            u8, u16, u32, u64, u128, usize,
            f32, f64, char,
        );
        registry.register::<bool>(encode_display::<bool>, decode_bool);
        registry.register::<String>(encode_display::<String>, decode_string);
        registry.register_encoder::<str>(encode_str);
        registry.register::<NaiveDateTime>(encode_datetime, decode_datetime);
        registry.register::<Vec<u8>>(encode_blob, decode_blob);
        registry.register::<Color>(encode_color, decode_color);

        registry
    }
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register (or replace) the codec pair for `T`.
    pub fn register<T: 'static>(
        &mut self,
        encode: fn(&T) -> Result<Encoded>,
        decode: fn(&Encoded) -> Option<T>,
    ) -> &mut Self {
        self.codecs.insert(
            TypeId::of::<T>(),
            CodecEntry {
                type_name: std::any::type_name::<T>(),
                encode: Some(Box::new(encode)),
                decode: Some(Box::new(decode)),
            },
        );
        self
    }

    /// Register an encoder only, for borrowed forms such as `str`.
    pub fn register_encoder<T: ?Sized + 'static>(
        &mut self,
        encode: fn(&T) -> Result<Encoded>,
    ) -> &mut Self {
        let entry = self
            .codecs
            .entry(TypeId::of::<T>())
            .or_insert_with(|| CodecEntry {
                type_name: std::any::type_name::<T>(),
                encode: None,
                decode: None,
            });
        entry.encode = Some(Box::new(encode));
        self
    }

    /// Store `E` by variant name, parsed back case-insensitively.
    pub fn register_enum<E: SymbolicEnum>(&mut self) -> &mut Self {
        self.register::<E>(encode_enum::<E>, decode_enum::<E>)
    }

    /// Store `T` as an XML fragment nested inside its entry.
    pub fn register_structured<T>(&mut self) -> &mut Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.register::<T>(encode_structured::<T>, decode_structured::<T>)
    }

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<T>())
    }

    pub fn encode<T: ?Sized + 'static>(&self, value: &T) -> Result<Encoded> {
        let encode = self
            .codecs
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.encode.as_ref())
            .and_then(|f| f.downcast_ref::<fn(&T) -> Result<Encoded>>())
            .ok_or(StoreError::UnregisteredType(std::any::type_name::<T>()))?;
        encode(value)
    }

    /// Decode `encoded` as `T`; `None` when `T` is unknown or conversion fails.
    pub fn decode<T: 'static>(&self, encoded: &Encoded) -> Option<T> {
        let decode = self
            .codecs
            .get(&TypeId::of::<T>())?
            .decode
            .as_ref()?
            .downcast_ref::<fn(&Encoded) -> Option<T>>()?;
        decode(encoded)
    }
}

fn encode_display<T: Display>(value: &T) -> Result<Encoded> {
    Ok(Encoded::Text(value.to_string()))
}

fn encode_str(value: &str) -> Result<Encoded> {
    Ok(Encoded::Text(value.to_owned()))
}

fn decode_parsed<T: FromStr>(encoded: &Encoded) -> Option<T> {
    let text = encoded.as_str()?;
    text.parse().ok().or_else(|| text.trim().parse().ok())
}

fn decode_string(encoded: &Encoded) -> Option<String> {
    encoded.as_str().map(str::to_owned)
}

fn decode_bool(encoded: &Encoded) -> Option<bool> {
    let text = encoded.as_str()?.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn encode_datetime(value: &NaiveDateTime) -> Result<Encoded> {
    Ok(Encoded::Text(value.format(DATE_FORMAT).to_string()))
}

fn decode_datetime(encoded: &Encoded) -> Option<NaiveDateTime> {
    let text = encoded.as_str()?.trim();
    NaiveDateTime::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn encode_blob(value: &Vec<u8>) -> Result<Encoded> {
    Ok(Encoded::Text(STANDARD.encode(value)))
}

fn decode_blob(encoded: &Encoded) -> Option<Vec<u8>> {
    STANDARD.decode(encoded.as_str()?.trim()).ok()
}

fn encode_color(value: &Color) -> Result<Encoded> {
    Ok(Encoded::Text(value.to_argb().to_string()))
}

fn decode_color(encoded: &Encoded) -> Option<Color> {
    let value: i64 = encoded.as_str()?.trim().parse().ok()?;
    let bits = if value < 0 {
        i32::try_from(value).ok()?
    } else {
        u32::try_from(value).ok()? as i32
    };
    Some(Color::from_argb(bits))
}

fn encode_enum<E: SymbolicEnum>(value: &E) -> Result<Encoded> {
    Ok(Encoded::Text(value.name().to_string()))
}

fn decode_enum<E: SymbolicEnum>(encoded: &Encoded) -> Option<E> {
    let text = encoded.as_str()?.trim();
    E::variants()
        .iter()
        .copied()
        .find(|variant| variant.name().eq_ignore_ascii_case(text))
}

fn encode_structured<T: Serialize>(value: &T) -> Result<Encoded> {
    quick_xml::se::to_string(value)
        .map(Encoded::Tree)
        .map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode_structured<T: DeserializeOwned>(encoded: &Encoded) -> Option<T> {
    quick_xml::de::from_str(encoded.as_str()?.trim()).ok()
}
