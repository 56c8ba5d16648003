// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission handling
//!
//! The scanner asks a [`PermissionService`] whether the camera may be used.
//! Inside a sandbox this is the XDG camera portal; on a plain host it is the
//! access mode of the `/dev/video*` nodes.
//!
//! Requests are correlated by a [`RequestToken`]. Responses carrying another
//! token belong to someone else and must be ignored by the receiver.

pub mod device;
pub mod portal;

pub use device::DevicePermissions;
pub use portal::PortalPermissions;

use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;

/// Correlation token for a permission request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new(crate::constants::permission::CAMERA_REQUEST_TOKEN)
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current camera permission as the platform reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Camera use is allowed
    Granted,
    /// Not granted yet, the user can be asked
    Prompt,
    /// Denied and asking again will not help
    Denied,
}

/// Outcome of a permission request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionResponse {
    pub token: RequestToken,
    pub granted: bool,
    /// The platform would show the prompt again
    pub can_ask_again: bool,
}

impl PermissionResponse {
    pub fn granted(token: RequestToken) -> Self {
        Self {
            token,
            granted: true,
            can_ask_again: true,
        }
    }

    pub fn denied(token: RequestToken, can_ask_again: bool) -> Self {
        Self {
            token,
            granted: false,
            can_ask_again,
        }
    }
}

/// Platform permission facility
pub trait PermissionService: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Non-blocking status check
    fn status(&self) -> PermissionStatus;

    /// Ask for camera access; resolves once the user or platform answered
    fn request(&self, token: RequestToken) -> BoxFuture<'static, PermissionResponse>;

    /// How the user can grant access by hand after a permanent denial
    fn denial_hint(&self) -> Option<String>;
}

/// Whether the process runs inside a Flatpak sandbox
pub fn is_sandboxed() -> bool {
    Path::new("/.flatpak-info").exists()
}

/// Permission service suited to the current environment
pub fn system_service() -> Arc<dyn PermissionService> {
    if is_sandboxed() {
        Arc::new(PortalPermissions::new())
    } else {
        Arc::new(DevicePermissions::new())
    }
}
