// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Camera permission request settings
pub mod permission {
    /// Correlation token attached to every camera permission request.
    ///
    /// Also used as the portal `handle_token`, so it must only contain
    /// characters valid in a D-Bus object path element.
    pub const CAMERA_REQUEST_TOKEN: &str = "scanner_camera_access";
}

/// Detector configuration (fixed, not user configurable)
pub mod detector {
    use crate::detector::SymbologyFilter;

    /// Symbologies the detector is built for
    pub const SYMBOLOGIES: SymbologyFilter = SymbologyFilter::All;

    /// Continuous autofocus on the camera source
    pub const AUTOFOCUS: bool = true;

    /// Frames are downscaled so that neither side exceeds this before decoding
    pub const MAX_DIMENSION: u32 = 640;

    /// Default minimum gap between two detection passes
    pub const DEFAULT_DETECTION_INTERVAL_MS: u64 = 250;
}

/// Pipeline configuration
pub mod pipeline {
    /// Maximum buffers queued in the appsink before old frames are dropped
    pub const MAX_BUFFERS: u32 = 2;

    /// Pixel format delivered to the preview surface
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Capacity of the frame channel between pipeline and preview surface
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;

    /// Capacity of the UI message channel used by the preview subscription
    pub const MESSAGE_CHANNEL_CAPACITY: usize = 8;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline stop timeout
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline start timeout
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// How long a terminal notice stays visible before the screen closes
    pub const TERMINAL_NOTICE_DELAY: Duration = Duration::from_secs(3);

    /// Input poll interval in terminal mode (~60 fps)
    pub const TERMINAL_POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// UI layout constants
pub mod ui {
    /// Text size of the decoded result label
    pub const RESULT_TEXT_SIZE: u16 = 20;

    /// Text size of the secondary result line (timestamp)
    pub const CAPTION_TEXT_SIZE: u16 = 12;

    /// Width of the clear and flash buttons
    pub const BUTTON_WIDTH: f32 = 120.0;

    /// Padding around the result panel
    pub const PANEL_PADDING: u16 = 16;

    /// Minimum window size
    pub const MIN_WINDOW_WIDTH: f32 = 360.0;
    pub const MIN_WINDOW_HEIGHT: f32 = 320.0;
}

/// Application metadata
pub mod app_info {
    /// Application version (from git or packaging)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Project repository
    pub const REPOSITORY: &str = "https://github.com/cosmic-utils/scanner";
}
