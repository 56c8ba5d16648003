// SPDX-License-Identifier: GPL-3.0-only

//! Torch (continuous flash LED) control
//!
//! Two hardware paths exist on Linux:
//! - the V4L2 `FLASH_LED_MODE` control, on the capture node (some UVC
//!   cameras) or on a dedicated flash subdevice (phones)
//! - sysfs LEDs at `/sys/class/leds/*:flash` or `*:torch`, driven through `brightness`
//!
//! [`find_torch`] probes them in that order.

use crate::backends::camera::v4l2_controls::{
    self, V4L2_CID_FLASH_LED_MODE, V4L2_FLASH_LED_MODE_NONE, V4L2_FLASH_LED_MODE_TORCH,
};
use crate::errors::FlashError;
use crate::permission::device::adduser_hint;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SYSFS_LEDS: &str = "/sys/class/leds";

/// A controllable torch
pub trait Torch: Send {
    /// Device node or LED name, for logs
    fn name(&self) -> &str;

    /// Switch continuous light on or off
    fn set_torch(&self, on: bool) -> Result<(), FlashError>;
}

/// Torch driven by the V4L2 flash LED mode control
#[derive(Debug, Clone)]
pub struct V4l2Torch {
    device_path: String,
}

impl V4l2Torch {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }
}

impl Torch for V4l2Torch {
    fn name(&self) -> &str {
        &self.device_path
    }

    fn set_torch(&self, on: bool) -> Result<(), FlashError> {
        let mode = if on {
            V4L2_FLASH_LED_MODE_TORCH
        } else {
            V4L2_FLASH_LED_MODE_NONE
        };
        v4l2_controls::set_control(&self.device_path, V4L2_CID_FLASH_LED_MODE, mode).map_err(
            |reason| FlashError::ControlFailed {
                device: self.device_path.clone(),
                reason,
            },
        )
    }
}

/// A flash LED exposed through sysfs
#[derive(Debug, Clone)]
pub struct LedDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    max_brightness: u32,
    name: String,
}

impl LedDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value, clamped to `max_brightness`
    pub fn set_brightness(&self, value: u32) -> Result<(), FlashError> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())?;
        Ok(())
    }
}

/// Torch made of every writable `*:flash` LED
#[derive(Debug, Clone)]
pub struct LedTorch {
    name: String,
    leds: Vec<LedDevice>,
}

impl LedTorch {
    /// Scan `/sys/class/leds` for writable flash LEDs
    pub fn discover() -> Option<Self> {
        Self::discover_in(Path::new(SYSFS_LEDS))
    }

    /// Scan `dir` for `*:flash` entries
    ///
    /// LEDs that exist but are not writable are skipped; when that leaves
    /// nothing, the group membership hint is logged.
    pub fn discover_in(dir: &Path) -> Option<Self> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            debug!(dir = %dir.display(), "No LED class directory");
            return None;
        };

        let mut leds = Vec::new();
        let mut unwritable: Vec<PathBuf> = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };
            if !(name_str.ends_with(":flash") || name_str.ends_with(":torch")) {
                continue;
            }

            let led_path = entry.path();
            let max_brightness = match std::fs::read_to_string(led_path.join("max_brightness"))
                .ok()
                .and_then(|s| s.trim().parse::<u32>().ok())
            {
                Some(v) if v > 0 => v,
                _ => {
                    warn!(led = name_str, "Invalid max_brightness value");
                    continue;
                }
            };

            let brightness_path = led_path.join("brightness");
            if std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
                .is_err()
            {
                warn!(path = %brightness_path.display(), "Flash LED found but not writable");
                unwritable.push(brightness_path);
                continue;
            }

            info!(name = name_str, max_brightness, "Discovered flash LED");
            leds.push(LedDevice {
                path: led_path,
                max_brightness,
                name: name_str.to_string(),
            });
        }

        if leds.is_empty() {
            if let Some(path) = unwritable.first() {
                warn!(hint = %adduser_hint(path, "feedbackd"), "Flash LEDs cannot be controlled");
            }
            return None;
        }

        leds.sort_by(|a, b| a.name.cmp(&b.name));
        let name = leds
            .iter()
            .map(|led| led.name.as_str())
            .collect::<Vec<_>>()
            .join("+");
        Some(Self { name, leds })
    }

    pub fn leds(&self) -> &[LedDevice] {
        &self.leds
    }
}

impl Torch for LedTorch {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_torch(&self, on: bool) -> Result<(), FlashError> {
        let mut errors = Vec::new();
        for led in &self.leds {
            let value = if on { led.max_brightness } else { 0 };
            if let Err(e) = led.set_brightness(value) {
                warn!(led = %led.name, error = %e, "Failed to switch flash LED");
                errors.push(e);
            }
        }
        // Fails only when no LED switched
        if errors.len() == self.leds.len()
            && let Some(e) = errors.into_iter().next()
        {
            return Err(e);
        }
        Ok(())
    }
}

/// Locate a torch for a camera
///
/// Tries the capture node, then flash subdevices, then sysfs LEDs.
pub fn find_torch(v4l2_path: Option<&str>) -> Option<Box<dyn Torch>> {
    if let Some(path) = v4l2_path
        && v4l2_controls::supports_torch(path)
    {
        debug!(path, "Torch on capture node");
        return Some(Box::new(V4l2Torch::new(path)));
    }

    if let Some(path) = v4l2_controls::discover_flash_subdevices().into_iter().next() {
        debug!(path, "Torch on flash subdevice");
        return Some(Box::new(V4l2Torch::new(path)));
    }

    LedTorch::discover().map(|torch| Box::new(torch) as Box<dyn Torch>)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scanner-leds-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fake_led(dir: &Path, name: &str, max: &str) -> PathBuf {
        let led = dir.join(name);
        std::fs::create_dir_all(&led).unwrap();
        std::fs::write(led.join("max_brightness"), max).unwrap();
        std::fs::write(led.join("brightness"), "0").unwrap();
        led
    }

    #[test]
    fn test_led_torch_switches_brightness() {
        let dir = scratch_dir("switch");
        let led = fake_led(&dir, "white:flash", "255\n");
        fake_led(&dir, "green:status", "1");

        let torch = LedTorch::discover_in(&dir).expect("flash LED discovered");
        assert_eq!(torch.leds().len(), 1);
        assert_eq!(torch.name(), "white:flash");

        torch.set_torch(true).unwrap();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "255");
        torch.set_torch(false).unwrap();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "0");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_max_brightness_is_skipped() {
        let dir = scratch_dir("invalid");
        fake_led(&dir, "white:flash", "0");
        assert!(LedTorch::discover_in(&dir).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory() {
        assert!(LedTorch::discover_in(Path::new("/nonexistent/leds")).is_none());
    }

    #[test]
    fn test_v4l2_torch_reports_device() {
        let torch = V4l2Torch::new("/dev/does-not-exist");
        match torch.set_torch(true) {
            Err(FlashError::ControlFailed { device, .. }) => {
                assert_eq!(device, "/dev/does-not-exist")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
