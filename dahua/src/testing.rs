//! In-process camera for gateway tests
//!
//! Speaks just enough of the CGI API: digest challenges with a rotatable
//! nonce and replay detection, `setConfig`/`getConfig` against an
//! in-memory table, coaxial control and canned magicBox reads.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use dahua_core::auth::{parse_params, Algorithm};
use dahua_core::{Command, Credentials, DigestChallenge, EncodedRequest};
use dahua_transport::{Error, Response, Result, Transport};

pub const REALM: &str = "Login to 4X7C5A1ZAG21L3F";
pub const OPAQUE: &str = "6d1e2b9f0c4a";

#[derive(Clone)]
pub struct FakeCamera {
    inner: Arc<Inner>,
}

struct Inner {
    credentials: Credentials,
    probe_delay: Duration,
    challenge_on_probe: bool,
    probes: AtomicU32,
    sends: AtomicU32,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    nonce_seq: u32,
    config: BTreeMap<String, String>,
    requests: Vec<String>,
    failure: Option<Error>,
    /// `(nonce, nc)` pairs already accepted
    seen: BTreeSet<(String, u32)>,
    /// Signed requests to handle and then drop the connection on
    resets: u32,
    /// setConfig keys answered with `Error`
    rejected_keys: BTreeSet<String>,
}

impl FakeCamera {
    pub fn new(username: &str, password: &str) -> Self {
        Self::build(username, password, Duration::ZERO, true)
    }

    /// Camera whose challenge rounds take a while
    pub fn slow_probe(username: &str, password: &str, delay: Duration) -> Self {
        Self::build(username, password, delay, true)
    }

    /// Camera that answers the probe with `200` instead of a challenge
    pub fn without_auth() -> Self {
        Self::build("admin", "", Duration::ZERO, false)
    }

    fn build(username: &str, password: &str, probe_delay: Duration, challenge_on_probe: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                credentials: Credentials::new(username, password),
                probe_delay,
                challenge_on_probe,
                probes: AtomicU32::new(0),
                sends: AtomicU32::new(0),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Unauthenticated probes received so far
    pub fn probes(&self) -> u32 {
        self.inner.probes.load(Ordering::SeqCst)
    }

    /// Every call to `send`, including injected failures
    pub fn sends(&self) -> u32 {
        self.inner.sends.load(Ordering::SeqCst)
    }

    /// URIs of accepted, authenticated requests
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn config(&self, key: &str) -> Option<String> {
        self.state().config.get(key).cloned()
    }

    pub fn set_config(&self, key: &str, value: &str) {
        self.state().config.insert(key.to_string(), value.to_string());
    }

    /// Rotate the nonce; outstanding signatures become stale
    pub fn expire_nonce(&self) {
        self.state().nonce_seq += 1;
    }

    /// Fail every request with `error` until cleared
    pub fn fail_with(&self, error: Option<Error>) {
        self.state().failure = error;
    }

    /// Apply the next `count` signed requests, then reset the connection
    /// instead of replying
    pub fn reset_after_handling(&self, count: u32) {
        self.state().resets = count;
    }

    /// Answer any setConfig carrying `key` with `Error` / `Bad Request!`
    pub fn reject_key(&self, key: &str) {
        self.state().rejected_keys.insert(key.to_string());
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().unwrap()
    }

    fn nonce(&self) -> String {
        format!("nonce-{:04}", self.state().nonce_seq)
    }

    fn challenge(&self, stale: bool) -> Response {
        let mut header = format!(
            "Digest realm=\"{REALM}\", qop=\"auth\", nonce=\"{}\", opaque=\"{OPAQUE}\"",
            self.nonce()
        );
        if stale {
            header.push_str(", stale=TRUE");
        }
        Response::unauthorized(header)
    }

    /// Check an `Authorization` header; `Err` carries the 401 to return
    fn verify(&self, request: &EncodedRequest, authorization: &str) -> std::result::Result<(), Response> {
        let params: BTreeMap<String, String> = parse_params(authorization.trim_start_matches("Digest "))
            .into_iter()
            .collect();
        let param = |name: &str| params.get(name).map(String::as_str).unwrap_or_default();

        let nonce = self.nonce();
        if param("nonce") != nonce {
            return Err(self.challenge(true));
        }

        let uri = request.uri();
        let nc = u32::from_str_radix(param("nc"), 16).unwrap_or(0);
        let expected = DigestChallenge {
            realm: REALM.to_string(),
            nonce: self.nonce(),
            opaque: Some(OPAQUE.to_string()),
            algorithm: Algorithm::Md5,
            qop_auth: true,
            stale: false,
        }
        .response(&self.inner.credentials, "GET", &uri, nc, param("cnonce"));

        let valid = param("username") == self.inner.credentials.username()
            && param("realm") == REALM
            && param("uri") == uri
            && param("opaque") == OPAQUE
            && nc > 0
            && param("response") == expected;

        // A replayed nonce count is refused like a bad password
        if valid && self.state().seen.insert((nonce, nc)) {
            Ok(())
        } else {
            Err(self.challenge(false))
        }
    }

    fn handle(&self, request: &EncodedRequest) -> Response {
        let mut state = self.state();
        state.requests.push(request.uri());

        let body = match request.command {
            Command::SetConfig => {
                if request.params.iter().any(|(key, _)| state.rejected_keys.contains(key)) {
                    return Response::new(400, "Error\r\nBad Request!\r\n");
                }
                for (key, value) in &request.params {
                    state.config.insert(key.clone(), value.clone());
                }
                "OK\r\n".to_string()
            }
            Command::GetConfig => {
                let name = request.get("name").unwrap_or_default();
                let lines: String = state
                    .config
                    .iter()
                    .filter(|(key, _)| {
                        key.strip_prefix(name)
                            .is_some_and(|rest| rest.starts_with('[') || rest.starts_with('.'))
                    })
                    .map(|(key, value)| format!("table.{key}={value}\r\n"))
                    .collect();
                if lines.is_empty() {
                    return Response::new(400, "Error\r\nBad Request!\r\n");
                }
                lines
            }
            Command::GetSystemInfo => "deviceType=IPC-HDW5831R-ZE\r\n\
                 hardwareVersion=1.00\r\n\
                 processor=S3LM\r\n\
                 serialNumber=4X7C5A1ZAG21L3F\r\n\
                 updateSerial=IPC-HDW5831R-ZE\r\n"
                .to_string(),
            Command::GetSoftwareVersion => "version=2.800.0000016.0.R,build:2020-06-05\r\n".to_string(),
            Command::GetMachineName => "name=FrontDoorCam\r\n".to_string(),
            Command::GetVendor => "vendor=Dahua\r\n".to_string(),
            Command::GetDeviceType => "type=IPC-HDW5831R-ZE\r\n".to_string(),
            Command::Control => {
                let target = request.get("info[0].Type").unwrap_or_default();
                let io = request.get("info[0].IO").unwrap_or_default();
                state.config.insert(format!("coaxial.{target}"), io.to_string());
                "OK\r\n".to_string()
            }
            Command::GetStatus => {
                let on_off = |target: &str| match state.config.get(&format!("coaxial.{target}")) {
                    Some(io) if io == "1" => "On",
                    _ => "Off",
                };
                format!(
                    "status.status.Speaker={}\r\nstatus.status.WhiteLight={}\r\n",
                    on_off("2"),
                    on_off("1")
                )
            }
        };

        Response::new(200, body)
    }
}

#[async_trait]
impl Transport for FakeCamera {
    async fn send(&self, request: &EncodedRequest, authorization: Option<&str>) -> Result<Response> {
        self.inner.sends.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.state().failure.clone() {
            return Err(error);
        }

        let Some(authorization) = authorization else {
            self.inner.probes.fetch_add(1, Ordering::SeqCst);
            if !self.inner.probe_delay.is_zero() {
                tokio::time::sleep(self.inner.probe_delay).await;
            }
            if !self.inner.challenge_on_probe {
                return Ok(self.handle(request));
            }
            return Ok(self.challenge(false));
        };

        if let Err(rejection) = self.verify(request, authorization) {
            return Ok(rejection);
        }

        let response = self.handle(request);
        let mut state = self.state();
        if state.resets > 0 {
            state.resets -= 1;
            return Err(Error::ConnectionReset("connection reset after reply".into()));
        }
        Ok(response)
    }

    fn remote_addr(&self) -> String {
        "fake-camera".to_string()
    }
}
