use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use prefkit_base::{ErrorKind, PrefError, PrefResult};

/// A single stored preference value.
///
/// Serialized as `{"type": "int", "value": 3}` so the file format keeps the kind
/// of every value; `1` and `1L` must not collapse into the same JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PrefValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(#[serde(with = "float_repr")] f32),
    String(String),
    StringSet(BTreeSet<String>),
}

impl PrefValue {
    /// Name of the value kind, as used in error messages and on disk.
    pub fn kind(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "bool",
            PrefValue::Int(_) => "int",
            PrefValue::Long(_) => "long",
            PrefValue::Float(_) => "float",
            PrefValue::String(_) => "string",
            PrefValue::StringSet(_) => "string_set",
        }
    }

    /// Parses textual input of the given kind, e.g. from the command line.
    ///
    /// String sets are written as comma-separated items; an empty input is the
    /// empty set.
    pub fn parse(kind: &str, raw: &str) -> PrefResult<PrefValue> {
        let invalid = |e: &dyn fmt::Display| {
            Box::new(PrefError::message(format!(
                "Invalid {} value '{}': {}",
                kind, raw, e
            )))
        };
        match kind {
            "bool" => raw.parse().map(PrefValue::Bool).map_err(|e| invalid(&e)),
            "int" => raw.parse().map(PrefValue::Int).map_err(|e| invalid(&e)),
            "long" => raw.parse().map(PrefValue::Long).map_err(|e| invalid(&e)),
            "float" => raw.parse().map(PrefValue::Float).map_err(|e| invalid(&e)),
            "string" => Ok(PrefValue::String(raw.to_string())),
            "string_set" => Ok(PrefValue::StringSet(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            other => Err(prefkit_base::err!(
                "Unknown value type '{}', expected one of bool, int, long, float, string, string_set",
                other
            )),
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(v) => write!(f, "{}", v),
            PrefValue::Int(v) => write!(f, "{}", v),
            PrefValue::Long(v) => write!(f, "{}", v),
            PrefValue::Float(v) => write!(f, "{}", v),
            PrefValue::String(v) => write!(f, "{}", v),
            PrefValue::StringSet(v) => {
                let items: Vec<&str> = v.iter().map(String::as_str).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/* 📖 # Why a PrefType trait instead of one getter per type?

Every accessor operation (get, get-with-default, get-or-none, commit, apply) exists
for each of the six value kinds. A trait that maps a Rust type to its PrefValue
variant and built-in default lets the accessor implement each operation once, and
the compiler picks the kind from the type at the call site.
*/

/// A Rust type that can be stored as a preference.
pub trait PrefType: Sized {
    /// Kind name of the matching [`PrefValue`] variant.
    const KIND: &'static str;

    /// Value returned by getters when the key is absent and no default is given.
    fn default_pref() -> Self;

    /// Extracts the value, handing the original back if it has another kind.
    fn from_pref(value: PrefValue) -> Result<Self, PrefValue>;

    fn into_pref(self) -> PrefValue;
}

macro_rules! impl_pref_type {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl PrefType for $ty {
            const KIND: &'static str = $kind;

            fn default_pref() -> Self {
                <$ty>::default()
            }

            fn from_pref(value: PrefValue) -> Result<Self, PrefValue> {
                match value {
                    PrefValue::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }

            fn into_pref(self) -> PrefValue {
                PrefValue::$variant(self)
            }
        }

        impl From<$ty> for PrefValue {
            fn from(value: $ty) -> Self {
                PrefValue::$variant(value)
            }
        }
    };
}

impl_pref_type!(bool, Bool, "bool");
impl_pref_type!(i32, Int, "int");
impl_pref_type!(i64, Long, "long");
impl_pref_type!(f32, Float, "float");
impl_pref_type!(String, String, "string");
impl_pref_type!(BTreeSet<String>, StringSet, "string_set");

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

/// Floats are written as JSON numbers, except NaN and the infinities, which JSON
/// numbers cannot express: those become the strings `"NaN"`, `"Infinity"` and
/// `"-Infinity"`.
mod float_repr {
    use std::fmt;

    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value == f32::INFINITY {
            serializer.serialize_str("Infinity")
        } else if *value == f32::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_f32(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f32, E> {
            Ok(v as f32)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f32, E> {
            Ok(v as f32)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f32, E> {
            Ok(v as f32)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f32, E> {
            match v {
                "NaN" => Ok(f32::NAN),
                "Infinity" => Ok(f32::INFINITY),
                "-Infinity" => Ok(f32::NEG_INFINITY),
                other => Err(E::invalid_value(Unexpected::Str(other), &self)),
            }
        }
    }
}

/// Builds the error returned when a stored value is read as the wrong kind.
pub(crate) fn type_mismatch<T: PrefType>(key: &str, found: &PrefValue) -> Box<PrefError> {
    Box::new(PrefError::new(ErrorKind::TypeMismatch {
        key: key.to_string(),
        expected: T::KIND,
        found: found.kind(),
    }))
}
