// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use scanner::constants::{detector, permission, pipeline, timing};
use scanner::detector::{Symbology, SymbologyFilter};

#[test]
fn test_detector_reports_every_supported_symbology() {
    assert_eq!(detector::SYMBOLOGIES, SymbologyFilter::All);
    for symbology in Symbology::SUPPORTED {
        assert!(detector::SYMBOLOGIES.allows(*symbology));
    }
    assert!(detector::AUTOFOCUS);
}

#[test]
fn test_request_token_is_a_valid_object_path_element() {
    // Portal request handles embed the token in a D-Bus object path
    assert!(!permission::CAMERA_REQUEST_TOKEN.is_empty());
    assert!(
        permission::CAMERA_REQUEST_TOKEN
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    );
}

#[test]
fn test_pipeline_channels_are_bounded() {
    assert!(pipeline::FRAME_CHANNEL_CAPACITY > 0);
    assert!(pipeline::MESSAGE_CHANNEL_CAPACITY >= pipeline::FRAME_CHANNEL_CAPACITY);
    assert_eq!(pipeline::OUTPUT_FORMAT, "RGBA");
}

#[test]
fn test_timeouts_are_ordered() {
    assert!(timing::STOP_TIMEOUT_SECS <= timing::START_TIMEOUT_SECS);
    assert!(timing::TERMINAL_POLL_INTERVAL < timing::TERMINAL_NOTICE_DELAY);
}
