// Tri-state optional field
//
// The policy API distinguishes a field that was omitted from one that was
// sent as `""`. A partial update that omits `description` leaves it alone;
// one that sends `"description": ""` blanks it. `Option<String>` cannot
// carry that difference, so every optional scalar in the wire model is a
// `Field<T>`.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// An optional wire field: absent, present-but-empty, or present with a value.
///
/// Struct fields of this type must be annotated with
/// `#[serde(default, skip_serializing_if = "Field::is_absent")]` so that
/// `Absent` is omitted on encode and a missing key decodes as `Absent`.
///
/// `null` decodes as `Absent`. `""` decodes as `Empty` for every `T`,
/// and `Empty` always encodes as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Field<T> {
    /// Not sent / not returned.
    #[default]
    Absent,
    /// Explicitly sent or returned as the empty string.
    Empty,
    /// A real value.
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Borrow the value, treating `Empty` and `Absent` alike.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Empty | Self::Absent => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Empty | Self::Absent => None,
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Value(v) => Field::Value(v),
            Self::Empty => Field::Empty,
            Self::Absent => Field::Absent,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Value(v) => Field::Value(f(v)),
            Self::Empty => Field::Empty,
            Self::Absent => Field::Absent,
        }
    }
}

impl Field<String> {
    /// Build a string field, mapping `""` to `Empty`.
    ///
    /// Prefer this over `Field::Value(String::new())`, which would encode
    /// as `""` and come back as `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Value(value)
        }
    }

    /// The string content, `""` for `Empty`, `None` for `Absent`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Empty => Some(""),
            Self::Absent => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Empty => serializer.serialize_str(""),
            Self::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Json::deserialize(deserializer)? {
            Json::Null => Ok(Self::Absent),
            Json::String(s) if s.is_empty() => Ok(Self::Empty),
            other => T::deserialize(other).map(Self::Value).map_err(D::Error::custom),
        }
    }
}
