//! Dialect-neutral values and the scalar conversion traits.
//!
//! Every parameter sent to a [`Connection`](crate::Connection) and every column read back
//! travels as a [`Value`]. Record fields convert through [`ToValue`] / [`FromValue`], which
//! the `Table` derive wires into the generated accessors.
//!
//! Enums stored as integers implement the traits by hand:
//!
//! ```ignore
//! impl ToValue for Status {
//!     const KIND: ScalarKind = ScalarKind::I16;
//!     fn to_value(&self) -> Value {
//!         Value::I16(*self as i16)
//!     }
//! }
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Declared scalar family of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    Text,
    Bytes,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    /// Anything the crate has no scalar mapping for (e.g. unmapped fields).
    Other,
}

impl ScalarKind {
    /// Signed/unsigned integer families accepted for server-generated keys.
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    /// Scalars that can address the key-specialized statements.
    pub const fn supports_key_lookup(self) -> bool {
        !matches!(self, Self::Bytes | Self::Json | Self::Other)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamptz",
            Self::Json => "json",
            Self::Other => "other",
        }
    }
}

/// An owned parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    #[cfg(feature = "rust_decimal")]
    Decimal(rust_decimal::Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The scalar family of this value, `None` for `Null`.
    pub fn kind(&self) -> Option<ScalarKind> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(_) => ScalarKind::Decimal,
            Self::Text(_) => ScalarKind::Text,
            Self::Bytes(_) => ScalarKind::Bytes,
            Self::Uuid(_) => ScalarKind::Uuid,
            Self::Date(_) => ScalarKind::Date,
            Self::Time(_) => ScalarKind::Time,
            Self::Timestamp(_) => ScalarKind::Timestamp,
            Self::TimestampTz(_) => ScalarKind::TimestampTz,
            Self::Json(_) => ScalarKind::Json,
        })
    }

    pub(crate) fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::Bool(b) => Some(i128::from(b)),
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v.into()),
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v.into()),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v.into()),
            Self::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// `==`, except that floats compare by their canonical bits: `-0.0` matches `0.0` and
    /// every NaN matches every other NaN.
    pub fn equivalent(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::F32(a), Self::F32(b)) => canonical_f32(*a) == canonical_f32(*b),
            (Self::F64(a), Self::F64(b)) => canonical_f64(*a) == canonical_f64(*b),
            _ => self == other,
        }
    }

    /// Feed this value into a hasher, consistently with [`Value::equivalent`].
    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::I8(v) => v.hash(state),
            Self::I16(v) => v.hash(state),
            Self::I32(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::U8(v) => v.hash(state),
            Self::U16(v) => v.hash(state),
            Self::U32(v) => v.hash(state),
            Self::U64(v) => v.hash(state),
            Self::F32(v) => canonical_f32(*v).hash(state),
            Self::F64(v) => canonical_f64(*v).hash(state),
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(v) => v.hash(state),
            Self::Text(v) => v.hash(state),
            Self::Bytes(v) => v.hash(state),
            Self::Uuid(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
            Self::Time(v) => v.hash(state),
            Self::Timestamp(v) => v.hash(state),
            Self::TimestampTz(v) => v.hash(state),
            Self::Json(v) => v.to_string().hash(state),
        }
    }
}

fn canonical_f32(v: f32) -> u32 {
    if v.is_nan() {
        f32::NAN.to_bits()
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

fn canonical_f64(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

/// Failure converting a [`Value`] into a Rust scalar.
#[derive(Debug, Clone, Error)]
#[error("cannot convert {found} into {expected}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: String,
}

impl ConversionError {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        let found = match found.kind() {
            Some(kind) => kind.name().to_string(),
            None => "NULL".to_string(),
        };
        Self { expected, found }
    }

    fn overflow(expected: &'static str, value: i128) -> Self {
        Self {
            expected,
            found: format!("out-of-range integer {value}"),
        }
    }
}

/// Convert a Rust scalar into a [`Value`].
pub trait ToValue {
    /// Declared scalar family.
    const KIND: ScalarKind;
    /// Whether `NULL` is representable.
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;
}

/// Convert a [`Value`] back into a Rust scalar.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// Scalars usable as a bare key for the key-specialized statements.
pub trait KeyType: ToValue + FromValue + Clone + Send + Sync + 'static {}

macro_rules! int_value {
    ($($t:ty => $variant:ident, $kind:ident);+ $(;)?) => {$(
        impl ToValue for $t {
            const KIND: ScalarKind = ScalarKind::$kind;
            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let wide = value
                    .as_i128()
                    .ok_or_else(|| ConversionError::new(stringify!($t), &value))?;
                <$t>::try_from(wide).map_err(|_| ConversionError::overflow(stringify!($t), wide))
            }
        }

        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }

        impl KeyType for $t {}
    )+};
}

int_value! {
    i8 => I8, I8;
    i16 => I16, I16;
    i32 => I32, I32;
    i64 => I64, I64;
    u8 => U8, U8;
    u16 => U16, U16;
    u32 => U32, U32;
    u64 => U64, U64;
}

impl ToValue for f32 {
    const KIND: ScalarKind = ScalarKind::F32;
    fn to_value(&self) -> Value {
        Value::F32(*self)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| ConversionError::new("f32", &value))
    }
}

impl ToValue for f64 {
    const KIND: ScalarKind = ScalarKind::F64;
    fn to_value(&self) -> Value {
        Value::F64(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value
            .as_f64()
            .ok_or_else(|| ConversionError::new("f64", &value))
    }
}

impl KeyType for f32 {}
impl KeyType for f64 {}

impl ToValue for bool {
    const KIND: ScalarKind = ScalarKind::Bool;
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            // SQLite and MySQL report booleans as integers.
            ref other => match other.as_i128() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(ConversionError::new("bool", other)),
            },
        }
    }
}

impl KeyType for bool {}

impl ToValue for String {
    const KIND: ScalarKind = ScalarKind::Text;
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for str {
    const KIND: ScalarKind = ScalarKind::Text;
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ConversionError::new("String", &other)),
        }
    }
}

impl KeyType for String {}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl ToValue for Vec<u8> {
    const KIND: ScalarKind = ScalarKind::Bytes;
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(ConversionError::new("Vec<u8>", &other)),
        }
    }
}

impl ToValue for uuid::Uuid {
    const KIND: ScalarKind = ScalarKind::Uuid;
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(ref s) => {
                uuid::Uuid::parse_str(s).map_err(|_| ConversionError::new("Uuid", &value))
            }
            other => Err(ConversionError::new("Uuid", &other)),
        }
    }
}

impl KeyType for uuid::Uuid {}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl ToValue for NaiveDate {
    const KIND: ScalarKind = ScalarKind::Date;
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(ConversionError::new("NaiveDate", &other)),
        }
    }
}

impl ToValue for NaiveTime {
    const KIND: ScalarKind = ScalarKind::Time;
    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Time(t) => Ok(t),
            other => Err(ConversionError::new("NaiveTime", &other)),
        }
    }
}

impl ToValue for NaiveDateTime {
    const KIND: ScalarKind = ScalarKind::Timestamp;
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::TimestampTz(t) => Ok(t.naive_utc()),
            other => Err(ConversionError::new("NaiveDateTime", &other)),
        }
    }
}

impl ToValue for DateTime<Utc> {
    const KIND: ScalarKind = ScalarKind::TimestampTz;
    fn to_value(&self) -> Value {
        Value::TimestampTz(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::TimestampTz(t) => Ok(t),
            Value::Timestamp(t) => Ok(t.and_utc()),
            other => Err(ConversionError::new("DateTime<Utc>", &other)),
        }
    }
}

impl KeyType for NaiveDate {}
impl KeyType for NaiveTime {}
impl KeyType for NaiveDateTime {}
impl KeyType for DateTime<Utc> {}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl ToValue for serde_json::Value {
    const KIND: ScalarKind = ScalarKind::Json;
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(ref s) => {
                serde_json::from_str(s).map_err(|_| ConversionError::new("json", &value))
            }
            other => Err(ConversionError::new("json", &other)),
        }
    }
}

#[cfg(feature = "rust_decimal")]
impl ToValue for rust_decimal::Decimal {
    const KIND: ScalarKind = ScalarKind::Decimal;
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

#[cfg(feature = "rust_decimal")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Decimal(d) => Ok(d),
            ref other => match other.as_i128() {
                Some(i) => rust_decimal::Decimal::try_from_i128_with_scale(i, 0)
                    .map_err(|_| ConversionError::new("Decimal", other)),
                None => Err(ConversionError::new("Decimal", other)),
            },
        }
    }
}

#[cfg(feature = "rust_decimal")]
impl KeyType for rust_decimal::Decimal {}

impl<T: ToValue> ToValue for Option<T> {
    const KIND: ScalarKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    const KIND: ScalarKind = T::KIND;
    const NULLABLE: bool = T::NULLABLE;

    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}
