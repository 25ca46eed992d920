//! Response envelopes returned by the Pushwoosh JSON API.
//!
//! # Design
//! Every reply shares the `{"status_code", "status_message", "response"}`
//! shape. `Response` is the bare envelope; operation-specific envelopes embed
//! it with `#[serde(flatten)]` and add a typed `response` payload. The
//! `Envelope` trait lets `Client` decode any of them generically and attach
//! the raw transport response afterwards.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::http::HttpResponse;

/// Status code the provider uses for success, both on the transport and
/// inside the envelope.
pub const STATUS_OK: i64 = 200;

/// The shared response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Response {
    #[serde(rename = "status_code")]
    pub status: i64,
    #[serde(rename = "status_message")]
    pub message: String,
    /// The transport response this envelope was decoded from.
    #[serde(skip)]
    pub raw: Option<HttpResponse>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// A type that embeds the shared `Response` envelope.
pub trait Envelope: DeserializeOwned {
    fn envelope(&self) -> &Response;
    fn envelope_mut(&mut self) -> &mut Response;
}

impl Envelope for Response {
    fn envelope(&self) -> &Response {
        self
    }

    fn envelope_mut(&mut self) -> &mut Response {
        self
    }
}

/// A tag the provider refused to store, with its reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedTag {
    pub tag: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagsInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedTag>,
}

/// Reply to `setTags`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TagsResponse {
    #[serde(flatten)]
    pub base: Response,
    #[serde(rename = "response", default, skip_serializing_if = "Option::is_none")]
    pub info: Option<TagsInfo>,
}

impl TagsResponse {
    /// Tags the provider skipped; empty when none were reported.
    pub fn skipped(&self) -> &[SkippedTag] {
        self.info.as_ref().map(|i| i.skipped.as_slice()).unwrap_or_default()
    }
}

impl Envelope for TagsResponse {
    fn envelope(&self) -> &Response {
        &self.base
    }

    fn envelope_mut(&mut self) -> &mut Response {
        &mut self.base
    }
}

/// A configured geozone and its distance from the queried point, in metres.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoneInfo {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub distance: f64,
}

/// Reply to `getNearestZone`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZoneResponse {
    #[serde(flatten)]
    pub base: Response,
    #[serde(rename = "response", default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ZoneInfo>,
}

impl Envelope for ZoneResponse {
    fn envelope(&self) -> &Response {
        &self.base
    }

    fn envelope_mut(&mut self) -> &mut Response {
        &mut self.base
    }
}
