// SPDX-License-Identifier: GPL-3.0-only

//! XDG desktop portal camera access
//!
//! `AccessCamera` returns immediately with a request object path; the user's
//! answer arrives later as a `Response` signal on that object. The signal
//! subscription is made on the predicted path before the call so the answer
//! cannot be missed.
//!
//! A sandboxed process cannot reach the PipeWire daemon on its own. After a
//! grant, `OpenPipeWireRemote` hands out a connection restricted to cameras,
//! which capture pipelines pass to `pipewiresrc`.

use super::{PermissionResponse, PermissionService, PermissionStatus, RequestToken};
use futures::StreamExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DEST: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_IFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_IFACE: &str = "org.freedesktop.portal.Request";

/// Portal response codes
const RESPONSE_SUCCESS: u32 = 0;
const RESPONSE_CANCELLED: u32 = 1;

/// PipeWire connection opened after the last grant
static PIPEWIRE_REMOTE: Mutex<Option<OwnedFd>> = Mutex::new(None);

/// File descriptor of the portal's PipeWire connection, once granted
///
/// The descriptor stays open for the rest of the process.
pub fn pipewire_remote_fd() -> Option<RawFd> {
    PIPEWIRE_REMOTE
        .lock()
        .ok()?
        .as_ref()
        .map(AsRawFd::as_raw_fd)
}

fn store_pipewire_remote(fd: OwnedFd) {
    match PIPEWIRE_REMOTE.lock() {
        Ok(mut slot) => *slot = Some(fd),
        Err(e) => warn!(error = %e, "PipeWire remote slot poisoned"),
    }
}

/// Camera permission through `org.freedesktop.portal.Camera`
#[derive(Debug, Clone, Default)]
pub struct PortalPermissions {
    granted: Arc<AtomicBool>,
}

impl PortalPermissions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionService for PortalPermissions {
    fn name(&self) -> &'static str {
        "portal"
    }

    fn status(&self) -> PermissionStatus {
        // The portal has no query call; a grant lasts for the process lifetime
        if self.granted.load(Ordering::Acquire) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Prompt
        }
    }

    fn request(&self, token: RequestToken) -> BoxFuture<'static, PermissionResponse> {
        let granted = self.granted.clone();
        Box::pin(async move {
            let response = match access_camera(&token).await {
                Ok(code) => response_from_code(token, code),
                Err(e) => {
                    error!(error = %e, "Camera portal request failed");
                    PermissionResponse::denied(token, false)
                }
            };
            if response.granted {
                granted.store(true, Ordering::Release);
                match open_pipewire_remote().await {
                    Ok(fd) => {
                        info!(fd = fd.as_raw_fd(), "Opened PipeWire remote for the camera");
                        store_pipewire_remote(fd);
                    }
                    Err(e) => warn!(error = %e, "Failed to open PipeWire remote"),
                }
            }
            response
        })
    }

    fn denial_hint(&self) -> Option<String> {
        Some(
            "Allow camera access for this application in your system privacy settings \
             or run: flatpak permission-reset <app-id>"
                .to_string(),
        )
    }
}

/// Map a portal response code to a permission response
pub fn response_from_code(token: RequestToken, code: u32) -> PermissionResponse {
    match code {
        RESPONSE_SUCCESS => PermissionResponse::granted(token),
        RESPONSE_CANCELLED => PermissionResponse::denied(token, true),
        _ => PermissionResponse::denied(token, false),
    }
}

/// Object path the portal will use for a request
///
/// `/org/freedesktop/portal/desktop/request/SENDER/TOKEN` where SENDER is the
/// caller's unique bus name without the leading `:` and with `.` replaced by `_`.
pub fn request_path(unique_name: &str, handle_token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_PATH, sender, handle_token)
}

/// Handle tokens must be unique per request and valid path elements
fn handle_token(token: &RequestToken) -> String {
    format!("{}_{}", token.as_str(), uuid::Uuid::new_v4().simple())
}

async fn access_camera(token: &RequestToken) -> Result<u32, String> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DEST, PORTAL_PATH, CAMERA_IFACE)
        .await
        .map_err(|e| format!("Failed to create camera portal proxy: {}", e))?;

    match camera.get_property::<bool>("IsCameraPresent").await {
        Ok(present) => debug!(present, "Portal camera presence"),
        Err(e) => debug!(error = %e, "IsCameraPresent unavailable"),
    }

    let unique_name = connection
        .unique_name()
        .ok_or_else(|| "Connection has no unique name".to_string())?
        .to_string();
    let handle = handle_token(token);
    let path = request_path(&unique_name, &handle);

    let request = zbus::Proxy::new(&connection, PORTAL_DEST, path.as_str(), REQUEST_IFACE)
        .await
        .map_err(|e| format!("Failed to create request proxy: {}", e))?;
    let mut responses = request
        .receive_signal("Response")
        .await
        .map_err(|e| format!("Failed to subscribe to portal response: {}", e))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::new(handle.as_str()));

    let returned: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| format!("AccessCamera failed: {}", e))?;
    if returned.as_str() != path {
        warn!(expected = %path, returned = %returned, "Portal returned unexpected request path");
    }
    info!(request = %returned, "Waiting for camera permission response");

    let message = responses
        .next()
        .await
        .ok_or_else(|| "Portal response stream ended".to_string())?;
    let (code, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| format!("Malformed portal response: {}", e))?;

    info!(code, "Camera portal responded");
    Ok(code)
}

async fn open_pipewire_remote() -> Result<OwnedFd, String> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DEST, PORTAL_PATH, CAMERA_IFACE)
        .await
        .map_err(|e| format!("Failed to create camera portal proxy: {}", e))?;

    let options: HashMap<&str, Value> = HashMap::new();
    let fd: zbus::zvariant::OwnedFd = camera
        .call("OpenPipeWireRemote", &(options,))
        .await
        .map_err(|e| format!("OpenPipeWireRemote failed: {}", e))?;
    Ok(fd.into())
}
