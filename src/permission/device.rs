// SPDX-License-Identifier: GPL-3.0-only

//! Host camera permission from device node access modes
//!
//! Outside a sandbox nobody prompts the user: access is whatever the
//! `/dev/video*` nodes allow. A denial therefore cannot be fixed by asking
//! again, only by joining the group that owns the nodes.

use super::{PermissionResponse, PermissionService, PermissionStatus, RequestToken};
use futures::future::BoxFuture;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Camera permission from `/dev/video*` access
#[derive(Debug, Clone)]
pub struct DevicePermissions {
    dev_dir: PathBuf,
}

impl Default for DevicePermissions {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicePermissions {
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Look for video nodes under another directory
    pub fn with_dev_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dir.into(),
        }
    }

    fn video_nodes(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dev_dir) else {
            return Vec::new();
        };
        let mut nodes: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("video"))
            .map(|entry| entry.path())
            .collect();
        nodes.sort();
        nodes
    }
}

/// Whether the current user may read and write `path`
fn can_read_write(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
}

impl PermissionService for DevicePermissions {
    fn name(&self) -> &'static str {
        "device"
    }

    fn status(&self) -> PermissionStatus {
        let nodes = self.video_nodes();
        // No nodes: let PipeWire or the pipeline report the missing camera
        if nodes.is_empty() || nodes.iter().any(|node| can_read_write(node)) {
            PermissionStatus::Granted
        } else {
            debug!(count = nodes.len(), "No accessible video node");
            PermissionStatus::Denied
        }
    }

    fn request(&self, token: RequestToken) -> BoxFuture<'static, PermissionResponse> {
        let response = match self.status() {
            PermissionStatus::Granted => PermissionResponse::granted(token),
            _ => PermissionResponse::denied(token, false),
        };
        Box::pin(async move { response })
    }

    fn denial_hint(&self) -> Option<String> {
        let node = self.video_nodes().into_iter().next()?;
        Some(adduser_hint(&node, "video"))
    }
}

/// Instructions for joining the group that owns `path`
///
/// Resolves the owning group from `/etc/group` and picks `doas` when
/// installed, `sudo` otherwise.
pub fn adduser_hint(path: &Path, fallback_group: &str) -> String {
    let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());

    let escalation_tool = if Path::new("/usr/bin/doas").exists() {
        "doas"
    } else {
        "sudo"
    };

    let group = std::fs::metadata(path)
        .ok()
        .and_then(|meta| group_name(meta.gid()))
        .unwrap_or_else(|| fallback_group.to_string());

    format!("Run: {escalation_tool} adduser {username} {group}, then log out and back in.")
}

fn group_name(gid: u32) -> Option<String> {
    let contents = std::fs::read_to_string("/etc/group").ok()?;
    contents.lines().find_map(|line| {
        let mut parts = line.split(':');
        let name = parts.next()?;
        let id = parts.nth(1)?.parse::<u32>().ok()?;
        (id == gid).then(|| name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scanner-dev-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_no_nodes_is_granted() {
        let dir = scratch_dir("empty");
        let permissions = DevicePermissions::with_dev_dir(&dir);
        assert_eq!(permissions.status(), PermissionStatus::Granted);
        assert!(permissions.denial_hint().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_accessible_node_is_granted() {
        let dir = scratch_dir("rw");
        std::fs::write(dir.join("video0"), b"").unwrap();
        let permissions = DevicePermissions::with_dev_dir(&dir);
        assert_eq!(permissions.status(), PermissionStatus::Granted);

        let response = pollster::block_on(permissions.request(RequestToken::default()));
        assert!(response.granted);
        assert_eq!(response.token, RequestToken::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_hint_mentions_group_and_tool() {
        let dir = scratch_dir("hint");
        let node = dir.join("video0");
        std::fs::write(&node, b"").unwrap();
        let hint = adduser_hint(&node, "video");
        assert!(hint.contains("adduser"));
        assert!(hint.contains("sudo") || hint.contains("doas"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
