// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 control access for focus and flash LED
//!
//! Only the handful of controls a scanner needs: continuous autofocus on the
//! capture node and the flash LED mode, which lives either on the capture
//! node (UVC) or on a separate flash subdevice (phones, tablets).

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;
const V4L2_CTRL_CLASS_FLASH: u32 = 0x009c0000;

const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;
const V4L2_CID_FLASH_CLASS_BASE: u32 = V4L2_CTRL_CLASS_FLASH | 0x900;

/// Continuous autofocus enable
pub const V4L2_CID_FOCUS_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 12;
/// Flash LED mode (menu: none, flash, torch)
pub const V4L2_CID_FLASH_LED_MODE: u32 = V4L2_CID_FLASH_CLASS_BASE + 1;

// ===== Flash LED mode menu values =====
pub const V4L2_FLASH_LED_MODE_NONE: i32 = 0;
pub const V4L2_FLASH_LED_MODE_FLASH: i32 = 1;
pub const V4L2_FLASH_LED_MODE_TORCH: i32 = 2;

const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// (dir << 30) | (size << 16) | ('V' << 8) | nr
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008561B;
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

/// Information about a V4L2 control
#[derive(Debug, Clone)]
pub struct ControlInfo {
    pub id: u32,
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl ControlInfo {
    pub fn is_disabled(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_DISABLED != 0
    }

    /// Whether `value` lies inside the advertised range
    pub fn accepts(&self, value: i32) -> bool {
        (self.minimum..=self.maximum).contains(&value)
    }
}

fn extract_name(bytes: &[u8; 32]) -> String {
    let name_len = bytes.iter().position(|&c| c == 0).unwrap_or(32);
    String::from_utf8_lossy(&bytes[..name_len]).to_string()
}

/// Query if a control exists and get its information
pub fn query_control(device_path: &str, control_id: u32) -> Option<ControlInfo> {
    let file = File::open(device_path).ok()?;

    let mut qctrl = V4l2Queryctrl {
        id: control_id,
        ctrl_type: 0,
        name: [0; 32],
        minimum: 0,
        maximum: 0,
        step: 0,
        default_value: 0,
        flags: 0,
        reserved: [0; 2],
    };

    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_QUERYCTRL,
            &mut qctrl as *mut V4l2Queryctrl,
        )
    };
    if result < 0 {
        return None;
    }

    Some(ControlInfo {
        id: qctrl.id,
        name: extract_name(&qctrl.name),
        minimum: qctrl.minimum,
        maximum: qctrl.maximum,
        default_value: qctrl.default_value,
        flags: qctrl.flags,
    })
}

/// Get current value of a control
pub fn get_control(device_path: &str, control_id: u32) -> Option<i32> {
    let file = File::open(device_path).ok()?;
    let mut ctrl = V4l2Control {
        id: control_id,
        value: 0,
    };

    let result =
        unsafe { libc::ioctl(file.as_raw_fd(), VIDIOC_G_CTRL, &mut ctrl as *mut V4l2Control) };
    if result < 0 {
        debug!(device_path, control_id, "Failed to get V4L2 control");
        return None;
    }
    Some(ctrl.value)
}

/// Set value of a control
pub fn set_control(device_path: &str, control_id: u32, value: i32) -> Result<(), String> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(device_path)
        .map_err(|e| format!("Failed to open device: {}", e))?;

    let mut ctrl = V4l2Control {
        id: control_id,
        value,
    };

    let result =
        unsafe { libc::ioctl(file.as_raw_fd(), VIDIOC_S_CTRL, &mut ctrl as *mut V4l2Control) };
    if result < 0 {
        let errno = std::io::Error::last_os_error();
        warn!(device_path, control_id, value, ?errno, "Failed to set V4L2 control");
        return Err(errno.to_string());
    }
    Ok(())
}

/// Check if a control is available on the device
pub fn has_control(device_path: &str, control_id: u32) -> bool {
    query_control(device_path, control_id)
        .map(|info| !info.is_disabled())
        .unwrap_or(false)
}

/// Turn on continuous autofocus when the device exposes it
///
/// Returns whether autofocus is now enabled.
pub fn enable_autofocus(device_path: &str) -> bool {
    if !has_control(device_path, V4L2_CID_FOCUS_AUTO) {
        debug!(device_path, "No autofocus control");
        return false;
    }
    if get_control(device_path, V4L2_CID_FOCUS_AUTO) == Some(1) {
        return true;
    }
    set_control(device_path, V4L2_CID_FOCUS_AUTO, 1).is_ok()
}

/// Find V4L2 subdevices exposing a usable torch mode
pub fn discover_flash_subdevices() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };

    let mut subdevs: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            name.starts_with("v4l-subdev").then(|| format!("/dev/{}", name))
        })
        .filter(|path| supports_torch(path))
        .collect();
    subdevs.sort();
    subdevs
}

/// Whether the node's flash LED mode control can select torch
pub fn supports_torch(device_path: &str) -> bool {
    query_control(device_path, V4L2_CID_FLASH_LED_MODE)
        .is_some_and(|info| !info.is_disabled() && info.accepts(V4L2_FLASH_LED_MODE_TORCH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_id_values() {
        assert_eq!(V4L2_CID_FOCUS_AUTO, 0x009a090c);
        assert_eq!(V4L2_CID_FLASH_LED_MODE, 0x009c0901);
    }

    #[test]
    fn test_control_range() {
        let info = ControlInfo {
            id: V4L2_CID_FLASH_LED_MODE,
            name: "LED Mode".into(),
            minimum: 0,
            maximum: 1,
            default_value: 0,
            flags: 0,
        };
        assert!(info.accepts(V4L2_FLASH_LED_MODE_FLASH));
        assert!(!info.accepts(V4L2_FLASH_LED_MODE_TORCH));
        assert!(!info.is_disabled());
    }

    #[test]
    fn test_missing_device() {
        assert!(query_control("/dev/does-not-exist", V4L2_CID_FOCUS_AUTO).is_none());
        assert!(!enable_autofocus("/dev/does-not-exist"));
        assert!(set_control("/dev/does-not-exist", V4L2_CID_FOCUS_AUTO, 1).is_err());
    }
}
