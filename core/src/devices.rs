//! Device operations: register, unregister, badge, push stats, tags, zones.
//!
//! # Design
//! Every operation is split the same way as the rest of the crate:
//! `build_*` validates inputs and produces the `HttpRequest` without any I/O,
//! and the plain-named method sends it through the client's transport. A
//! failed precondition therefore never reaches the network.

use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::device::{DeviceType, Identifiable, Registrable, Taggable, Tags};
use crate::error::{ApiError, Precondition};
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::types::{Response, TagsResponse, ZoneResponse};

pub const REGISTER_DEVICE_PATH: &str = "/registerDevice";
pub const UNREGISTER_DEVICE_PATH: &str = "/unregisterDevice";
pub const SET_BADGE_PATH: &str = "/setBadge";
pub const PUSH_STAT_PATH: &str = "/pushStat";
pub const SET_TAGS_PATH: &str = "/setTags";
pub const NEAREST_ZONE_PATH: &str = "/getNearestZone";

#[derive(Serialize)]
struct RegisterBody<'a> {
    application: &'a str,
    push_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    hwid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<i32>,
    device_type: DeviceType,
}

#[derive(Serialize)]
struct UnregisterBody<'a> {
    application: &'a str,
    hwid: &'a str,
}

#[derive(Serialize)]
struct BadgeBody<'a> {
    application: &'a str,
    hwid: &'a str,
    badge: i64,
}

#[derive(Serialize)]
struct PushStatBody<'a> {
    application: &'a str,
    hwid: &'a str,
    hash: &'a str,
}

#[derive(Serialize)]
struct TagsBody<'a> {
    application: &'a str,
    hwid: &'a str,
    tags: &'a Tags,
}

#[derive(Serialize)]
struct NearestZoneBody<'a> {
    application: &'a str,
    hwid: &'a str,
    lat: f64,
    lng: f64,
}

/// Device operations bound to a `Client`. Obtained from `Client::devices`.
#[derive(Debug)]
pub struct Devices<'a, T> {
    client: &'a Client<T>,
}

impl<T> Clone for Devices<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Devices<'_, T> {}

impl<'a, T> Devices<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    fn application(&self) -> Result<&'a str, ApiError> {
        let application = self.client.application();
        if application.is_empty() {
            return Err(Precondition::Application.into());
        }
        Ok(application)
    }

    pub fn build_register<D: Registrable + ?Sized>(
        &self,
        device: &D,
    ) -> Result<HttpRequest, ApiError> {
        let application = self.application()?;
        let hwid = hardware_id(device)?;
        let push_token = device.push_token();
        if push_token.is_empty() {
            return Err(Precondition::PushToken.into());
        }
        let device_type = device.device_type().ok_or(Precondition::DeviceType)?;

        let body = RegisterBody {
            application,
            push_token,
            language: device.language().filter(|l| !l.is_empty()),
            hwid,
            timezone: device.timezone().filter(|tz| *tz != 0),
            device_type,
        };
        self.client
            .new_request(HttpMethod::Post, REGISTER_DEVICE_PATH, Some(&body))
    }

    /// Unregister by bare hardware id; no device record is needed.
    pub fn build_unregister(&self, hardware_id: &str) -> Result<HttpRequest, ApiError> {
        let application = self.application()?;
        if hardware_id.is_empty() {
            return Err(Precondition::HardwareId.into());
        }
        let body = UnregisterBody {
            application,
            hwid: hardware_id,
        };
        self.client
            .new_request(HttpMethod::Post, UNREGISTER_DEVICE_PATH, Some(&body))
    }

    /// `badge` is sent as-is; the provider accepts negative values.
    pub fn build_set_badge<D: Identifiable + ?Sized>(
        &self,
        device: &D,
        badge: i64,
    ) -> Result<HttpRequest, ApiError> {
        let application = self.application()?;
        let hwid = hardware_id(device)?;
        let body = BadgeBody {
            application,
            hwid,
            badge,
        };
        self.client
            .new_request(HttpMethod::Post, SET_BADGE_PATH, Some(&body))
    }

    pub fn build_push_stat<D: Identifiable + ?Sized>(
        &self,
        device: &D,
        hash: &str,
    ) -> Result<HttpRequest, ApiError> {
        let application = self.application()?;
        let hwid = hardware_id(device)?;
        if hash.is_empty() {
            return Err(Precondition::Hash.into());
        }
        let body = PushStatBody {
            application,
            hwid,
            hash,
        };
        self.client
            .new_request(HttpMethod::Post, PUSH_STAT_PATH, Some(&body))
    }

    pub fn build_set_tags<D: Taggable + ?Sized>(&self, device: &D) -> Result<HttpRequest, ApiError> {
        let application = self.application()?;
        let hwid = hardware_id(device)?;
        let tags = device.tags();
        let body = TagsBody {
            application,
            hwid,
            tags: &tags,
        };
        self.client
            .new_request(HttpMethod::Post, SET_TAGS_PATH, Some(&body))
    }

    pub fn build_nearest_zone<D: Identifiable + ?Sized>(
        &self,
        device: &D,
        lat: f64,
        lng: f64,
    ) -> Result<HttpRequest, ApiError> {
        let application = self.application()?;
        let hwid = hardware_id(device)?;
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ApiError::Serialization(format!(
                "coordinates must be finite numbers, got ({lat}, {lng})"
            )));
        }
        let body = NearestZoneBody {
            application,
            hwid,
            lat,
            lng,
        };
        self.client
            .new_request(HttpMethod::Post, NEAREST_ZONE_PATH, Some(&body))
    }
}

impl<T: Transport> Devices<'_, T> {
    pub fn register<D: Registrable + ?Sized>(&self, device: &D) -> Result<Response, ApiError> {
        let request = self.build_register(device)?;
        debug!(hwid = device.device_id(), "registering device");
        self.client.execute(&request)
    }

    pub fn unregister(&self, hardware_id: &str) -> Result<Response, ApiError> {
        let request = self.build_unregister(hardware_id)?;
        debug!(hwid = hardware_id, "unregistering device");
        self.client.execute(&request)
    }

    pub fn set_badge<D: Identifiable + ?Sized>(
        &self,
        device: &D,
        badge: i64,
    ) -> Result<Response, ApiError> {
        let request = self.build_set_badge(device, badge)?;
        self.client.execute(&request)
    }

    /// Report that the push identified by `hash` was opened on `device`.
    pub fn push_stat<D: Identifiable + ?Sized>(
        &self,
        device: &D,
        hash: &str,
    ) -> Result<Response, ApiError> {
        let request = self.build_push_stat(device, hash)?;
        self.client.execute(&request)
    }

    /// Send the device's tags. The reply lists tags the provider skipped.
    pub fn set_tags<D: Taggable + ?Sized>(&self, device: &D) -> Result<TagsResponse, ApiError> {
        let request = self.build_set_tags(device)?;
        self.client.execute(&request)
    }

    /// Nearest configured geozone to (`lat`, `lng`).
    pub fn nearest_zone<D: Identifiable + ?Sized>(
        &self,
        device: &D,
        lat: f64,
        lng: f64,
    ) -> Result<ZoneResponse, ApiError> {
        let request = self.build_nearest_zone(device, lat, lng)?;
        self.client.execute(&request)
    }
}

fn hardware_id<D: Identifiable + ?Sized>(device: &D) -> Result<&str, ApiError> {
    let hwid = device.device_id();
    if hwid.is_empty() {
        return Err(Precondition::HardwareId.into());
    }
    Ok(hwid)
}
