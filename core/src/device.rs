//! Device capabilities.
//!
//! # Design
//! A device is anything that can name itself (`Identifiable`). Registration
//! additionally needs a push token and a platform (`Registrable`), and may
//! include a language and a time-zone offset: those are default trait methods
//! returning `None`, so a device type opts in by overriding them instead of
//! being inspected at runtime. Tag updates go through `Taggable`, which hands
//! over an explicit `Tags` list.

use std::fmt;

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ApiError;

/// Platform of a registered device, as encoded on the wire.
///
/// Code 6 is reserved by the provider and has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Ios,
    BlackBerry,
    Android,
    Nokia,
    WindowsPhone,
    Osx,
}

impl DeviceType {
    pub fn code(&self) -> u8 {
        match self {
            DeviceType::Ios => 1,
            DeviceType::BlackBerry => 2,
            DeviceType::Android => 3,
            DeviceType::Nokia => 4,
            DeviceType::WindowsPhone => 5,
            DeviceType::Osx => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DeviceType::Ios),
            2 => Some(DeviceType::BlackBerry),
            3 => Some(DeviceType::Android),
            4 => Some(DeviceType::Nokia),
            5 => Some(DeviceType::WindowsPhone),
            7 => Some(DeviceType::Osx),
            _ => None,
        }
    }
}

impl Serialize for DeviceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Ios => "iOS",
            DeviceType::BlackBerry => "BlackBerry",
            DeviceType::Android => "Android",
            DeviceType::Nokia => "Nokia",
            DeviceType::WindowsPhone => "Windows Phone",
            DeviceType::Osx => "OSX",
        };
        f.write_str(name)
    }
}

/// Anything the provider can address by hardware id.
pub trait Identifiable {
    fn device_id(&self) -> &str;
}

/// A device that can be registered for push notifications.
pub trait Registrable: Identifiable {
    fn push_token(&self) -> &str;

    /// `None` means the platform is unknown; registration rejects it.
    fn device_type(&self) -> Option<DeviceType>;

    fn language(&self) -> Option<&str> {
        None
    }

    /// Offset from UTC in seconds.
    fn timezone(&self) -> Option<i32> {
        None
    }
}

/// A device that carries custom segmentation tags.
pub trait Taggable: Identifiable {
    fn tags(&self) -> Tags;
}

impl<T: Identifiable + ?Sized> Identifiable for &T {
    fn device_id(&self) -> &str {
        (**self).device_id()
    }
}

impl Identifiable for str {
    fn device_id(&self) -> &str {
        self
    }
}

impl Identifiable for String {
    fn device_id(&self) -> &str {
        self
    }
}

/// A single tag value, or the reason it has no JSON form.
///
/// Non-finite floats are kept as rejections instead of collapsing to `null`;
/// a `Tags` list holding one fails to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct TagValue(Result<Value, String>);

impl TagValue {
    fn float(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(n) => TagValue(Ok(Value::Number(n))),
            None => TagValue(Err(format!("{value} is not a finite number"))),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        self.0.as_ref().ok()
    }
}

macro_rules! tag_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for TagValue {
                fn from(value: $t) -> Self {
                    TagValue(Ok(Value::from(value)))
                }
            }
        )*
    };
}

tag_value_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, bool, String, &str, Value);

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::float(value)
    }
}

impl From<f32> for TagValue {
    fn from(value: f32) -> Self {
        TagValue::float(f64::from(value))
    }
}

impl<T: Into<TagValue>> From<Option<T>> for TagValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TagValue(Ok(Value::Null)), Into::into)
    }
}

/// Named tag values sent with `setTags`.
///
/// Insertion order is kept locally but carries no meaning on the wire.
/// Inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    entries: Vec<(String, TagValue)>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A value without a JSON form is recorded and
    /// makes the request fail to build.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TagValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Insert any serializable value, failing if it has no JSON form.
    pub fn try_insert<V: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &V,
    ) -> Result<(), ApiError> {
        let value =
            serde_json::to_value(value).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.insert(name, value);
        Ok(())
    }

    /// Insert a float, failing on NaN and infinities.
    pub fn try_insert_float(&mut self, name: impl Into<String>, value: f64) -> Result<(), ApiError> {
        let value = TagValue::float(value);
        if let TagValue(Err(reason)) = &value {
            return Err(ApiError::Serialization(reason.clone()));
        }
        self.insert(name, value);
        Ok(())
    }

    /// Value stored under `name`; `None` when missing or not representable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            match &value.0 {
                Ok(v) => map.serialize_entry(name, v)?,
                Err(reason) => return Err(S::Error::custom(format!("tag {name:?}: {reason}"))),
            }
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<TagValue>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (name, value) in iter {
            tags.insert(name, value);
        }
        tags
    }
}

/// A plain device record covering every capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    pub hardware_id: String,
    pub push_token: String,
    pub device_type: Option<DeviceType>,
    pub language: Option<String>,
    pub timezone: Option<i32>,
}

impl Identifiable for Device {
    fn device_id(&self) -> &str {
        &self.hardware_id
    }
}

impl Registrable for Device {
    fn push_token(&self) -> &str {
        &self.push_token
    }

    fn device_type(&self) -> Option<DeviceType> {
        self.device_type
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn timezone(&self) -> Option<i32> {
        self.timezone
    }
}
