use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

/// Path prefix of the emulated API version.
pub const API_PREFIX: &str = "/json/1.3";

/// Envelope status for a rejected argument, as the real provider uses it.
pub const STATUS_REJECTED: i64 = 210;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredDevice {
    pub hwid: String,
    pub push_token: String,
    pub device_type: u8,
    pub language: Option<String>,
    pub timezone: Option<i64>,
    pub badge: i64,
    pub tags: Map<String, Value>,
    pub opened: Vec<String>,
}

/// A request as it reached the server.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub user_agent: Option<String>,
    pub body: Value,
}

/// A raw reply returned instead of the emulated behaviour.
#[derive(Clone, Debug)]
pub struct CannedReply {
    pub status: u16,
    pub body: String,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<String, RegisteredDevice>,
    zones: Vec<Zone>,
    requests: Vec<RecordedRequest>,
    canned: HashMap<String, CannedReply>,
}

/// Shared state of the emulated provider.
#[derive(Clone, Default)]
pub struct Provider {
    inner: Arc<RwLock<Inner>>,
}

impl Provider {
    pub fn with_zones(zones: Vec<Zone>) -> Self {
        let inner = Inner {
            zones,
            ..Inner::default()
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.read().await.requests.clone()
    }

    pub async fn device(&self, hwid: &str) -> Option<RegisteredDevice> {
        self.inner.read().await.devices.get(hwid).cloned()
    }

    /// Answer every later call to `method` with `reply`.
    pub async fn script(&self, method: &str, reply: CannedReply) {
        self.inner
            .write()
            .await
            .canned
            .insert(method.to_string(), reply);
    }
}

#[derive(Deserialize)]
struct RequestEnvelope {
    request: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Reply {
    pub status_code: i64,
    pub status_message: String,
    pub response: Option<Value>,
}

impl Reply {
    fn ok(response: Option<Value>) -> Self {
        Self {
            status_code: 200,
            status_message: "OK".to_string(),
            response,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_REJECTED,
            status_message: message.into(),
            response: None,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

#[derive(Deserialize)]
struct RegisterDevice {
    application: String,
    hwid: String,
    push_token: String,
    device_type: u8,
    language: Option<String>,
    timezone: Option<i64>,
}

#[derive(Deserialize)]
struct UnregisterDevice {
    application: String,
    hwid: String,
}

#[derive(Deserialize)]
struct SetBadge {
    application: String,
    hwid: String,
    badge: i64,
}

#[derive(Deserialize)]
struct PushStat {
    application: String,
    hwid: String,
    hash: String,
}

#[derive(Deserialize)]
struct SetTags {
    application: String,
    hwid: String,
    tags: Map<String, Value>,
}

#[derive(Deserialize)]
struct NearestZone {
    application: String,
    hwid: String,
    lat: f64,
    lng: f64,
}

pub fn app(provider: Provider) -> Router {
    Router::new()
        .route(&format!("{API_PREFIX}/{{method}}"), post(dispatch))
        .with_state(provider)
}

pub async fn run(listener: TcpListener, provider: Provider) -> Result<(), std::io::Error> {
    axum::serve(listener, app(provider)).await
}

async fn dispatch(
    State(provider): State<Provider>,
    Path(method): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let envelope: RequestEnvelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(%method, error = %e, "malformed request body");
            return (StatusCode::BAD_REQUEST, "malformed request body").into_response();
        }
    };

    let mut inner = provider.inner.write().await;
    inner.requests.push(RecordedRequest {
        method: method.clone(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: envelope.request.clone(),
    });

    if let Some(canned) = inner.canned.get(&method) {
        debug!(%method, status = canned.status, "canned reply");
        let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, canned.body.clone()).into_response();
    }

    let request = envelope.request;
    let reply = match method.as_str() {
        "registerDevice" => with_request(request, |r| register_device(&mut inner, r)),
        "unregisterDevice" => with_request(request, |r| unregister_device(&mut inner, r)),
        "setBadge" => with_request(request, |r| set_badge(&mut inner, r)),
        "pushStat" => with_request(request, |r| push_stat(&mut inner, r)),
        "setTags" => with_request(request, |r| set_tags(&mut inner, r)),
        "getNearestZone" => with_request(request, |r| nearest_zone(&inner, r)),
        _ => return (StatusCode::NOT_FOUND, "unknown method").into_response(),
    };
    info!(%method, status_code = reply.status_code, "handled request");
    reply.into_response()
}

/// Decode the typed request, rejecting missing or mistyped arguments.
fn with_request<T: DeserializeOwned>(request: Value, handle: impl FnOnce(T) -> Reply) -> Reply {
    match serde_json::from_value(request) {
        Ok(typed) => handle(typed),
        Err(e) => Reply::rejected(format!("Invalid request: {e}")),
    }
}

fn check_application(application: &str) -> Result<(), Reply> {
    if application.is_empty() {
        return Err(Reply::rejected("Application not found"));
    }
    Ok(())
}

fn known_device<'a>(inner: &'a mut Inner, hwid: &str) -> Result<&'a mut RegisteredDevice, Reply> {
    inner
        .devices
        .get_mut(hwid)
        .ok_or_else(|| Reply::rejected(format!("Device not found: {hwid}")))
}

fn register_device(inner: &mut Inner, r: RegisterDevice) -> Reply {
    if let Err(reply) = check_application(&r.application) {
        return reply;
    }
    if r.hwid.is_empty() || r.push_token.is_empty() || r.device_type == 0 {
        return Reply::rejected("Missing device arguments");
    }
    let device = inner.devices.entry(r.hwid.clone()).or_default();
    device.hwid = r.hwid;
    device.push_token = r.push_token;
    device.device_type = r.device_type;
    device.language = r.language;
    device.timezone = r.timezone;
    Reply::ok(None)
}

fn unregister_device(inner: &mut Inner, r: UnregisterDevice) -> Reply {
    if let Err(reply) = check_application(&r.application) {
        return reply;
    }
    inner.devices.remove(&r.hwid);
    Reply::ok(None)
}

fn set_badge(inner: &mut Inner, r: SetBadge) -> Reply {
    if let Err(reply) = check_application(&r.application) {
        return reply;
    }
    match known_device(inner, &r.hwid) {
        Ok(device) => {
            device.badge = r.badge;
            Reply::ok(None)
        }
        Err(reply) => reply,
    }
}

fn push_stat(inner: &mut Inner, r: PushStat) -> Reply {
    if let Err(reply) = check_application(&r.application) {
        return reply;
    }
    match known_device(inner, &r.hwid) {
        Ok(device) => {
            device.opened.push(r.hash);
            Reply::ok(None)
        }
        Err(reply) => reply,
    }
}

fn set_tags(inner: &mut Inner, r: SetTags) -> Reply {
    if let Err(reply) = check_application(&r.application) {
        return reply;
    }
    let device = match known_device(inner, &r.hwid) {
        Ok(device) => device,
        Err(reply) => return reply,
    };
    let mut skipped = Vec::new();
    for (tag, value) in r.tags {
        if value.is_null() {
            skipped.push(json!({"tag": tag, "reason": "null value"}));
        } else {
            device.tags.insert(tag, value);
        }
    }
    Reply::ok(Some(json!({ "skipped": skipped })))
}

fn nearest_zone(inner: &Inner, r: NearestZone) -> Reply {
    if let Err(reply) = check_application(&r.application) {
        return reply;
    }
    if !inner.devices.contains_key(&r.hwid) {
        return Reply::rejected(format!("Device not found: {}", r.hwid));
    }
    let nearest = inner
        .zones
        .iter()
        .map(|zone| (zone, haversine(r.lat, r.lng, zone.lat, zone.lng)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    match nearest {
        Some((zone, distance)) => Reply::ok(Some(json!({
            "name": zone.name,
            "lat": zone.lat,
            "lng": zone.lng,
            "distance": distance,
        }))),
        None => Reply::rejected("No zones configured"),
    }
}

/// Great-circle distance in metres between two points given in degrees.
pub fn haversine(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
