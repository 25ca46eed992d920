//! Synchronous client for the Pushwoosh device API.
//!
//! # Overview
//! Registers and unregisters devices, sets badges, reports push opens,
//! attaches tags and queries the nearest geozone. Each call validates its
//! inputs, wraps the payload as `{"request": ...}`, POSTs it under the
//! versioned base URL and decodes the `{"status_code", "status_message",
//! "response"}` envelope, mapping any non-200 status to an `ApiError`.
//!
//! # Design
//! - `Client` builds `HttpRequest` values and parses `HttpResponse` values
//!   without I/O; a pluggable `Transport` (default: `ureq`) does the
//!   round-trip in between.
//! - Device capabilities are traits (`Identifiable`, `Registrable`,
//!   `Taggable`) with optional fields as default methods.
//! - No retries, caching or background work: one call, one request.
//!
//! ```no_run
//! use pushwoosh::{Client, Device, DeviceType};
//!
//! let client = Client::new("XXXXX-XXXXX");
//! let device = Device {
//!     hardware_id: "hwid".to_string(),
//!     push_token: "token".to_string(),
//!     device_type: Some(DeviceType::Android),
//!     ..Device::default()
//! };
//! client.devices().register(&device)?;
//! # Ok::<(), pushwoosh::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod devices;
pub mod error;
pub mod http;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::Client;
pub use config::{ClientConfig, API_VERSION, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use device::{Device, DeviceType, Identifiable, Registrable, TagValue, Taggable, Tags};
pub use devices::Devices;
pub use error::{ApiError, Precondition};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{Envelope, Response, SkippedTag, TagsInfo, TagsResponse, ZoneInfo, ZoneResponse};
