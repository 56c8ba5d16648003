// SPDX-License-Identifier: GPL-3.0-only

//! Scanner screen scenarios driven through the public API

use futures::future::BoxFuture;
use scanner::backends::camera::{
    BackendResult, CameraBackend, CameraBackendType, CameraDevice, CameraFrame, CameraSession,
    PreviewSurface, SessionOptions,
};
use scanner::detector::{Barcode, DetectionBatch, FrameRegion, Symbology};
use scanner::errors::FlashError;
use scanner::flash::Torch;
use scanner::permission::{PermissionResponse, PermissionService, PermissionStatus, RequestToken};
use scanner::screen::{Effect, FlashState, Notice, PermissionState, ScannerScreen};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Permission service that answers requests from a script
struct ScriptedPermissions {
    status: Mutex<PermissionStatus>,
    answers: Mutex<VecDeque<(bool, bool)>>,
}

impl ScriptedPermissions {
    fn new(status: PermissionStatus, answers: &[(bool, bool)]) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status),
            answers: Mutex::new(answers.iter().copied().collect()),
        })
    }
}

impl PermissionService for ScriptedPermissions {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn status(&self) -> PermissionStatus {
        *self.status.lock().unwrap()
    }

    fn request(&self, token: RequestToken) -> BoxFuture<'static, PermissionResponse> {
        let (granted, can_ask_again) = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((false, false));
        if granted {
            *self.status.lock().unwrap() = PermissionStatus::Granted;
        } else if !can_ask_again {
            *self.status.lock().unwrap() = PermissionStatus::Denied;
        }
        Box::pin(async move {
            if granted {
                PermissionResponse::granted(token)
            } else {
                PermissionResponse::denied(token, can_ask_again)
            }
        })
    }

    fn denial_hint(&self) -> Option<String> {
        Some("Enable camera access in Settings".into())
    }
}

#[derive(Default)]
struct Rig {
    running: AtomicBool,
    torch_on: AtomicBool,
}

struct RigBackend(Arc<Rig>);

impl CameraBackend for RigBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![rig_device()]
    }

    fn create_session(
        &self,
        device: &CameraDevice,
        _options: SessionOptions,
    ) -> BackendResult<Box<dyn CameraSession>> {
        Ok(Box::new(RigSession {
            rig: self.0.clone(),
            device: device.clone(),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        true
    }
}

struct RigSession {
    rig: Arc<Rig>,
    device: CameraDevice,
}

impl CameraSession for RigSession {
    fn start(&mut self, surface: &PreviewSurface) -> BackendResult<()> {
        // One blank frame, like a camera that just opened
        let _ = surface
            .sender()
            .try_send(CameraFrame::from_rgba(8, 8, vec![255; 8 * 8 * 4]));
        self.rig.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.rig.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.rig.running.load(Ordering::SeqCst)
    }

    fn torch(&self) -> Option<Box<dyn Torch>> {
        Some(Box::new(RigTorch(self.rig.clone())))
    }

    fn device(&self) -> &CameraDevice {
        &self.device
    }
}

struct RigTorch(Arc<Rig>);

impl Torch for RigTorch {
    fn name(&self) -> &str {
        "rig"
    }

    fn set_torch(&self, on: bool) -> Result<(), FlashError> {
        self.0.torch_on.store(on, Ordering::SeqCst);
        Ok(())
    }
}

fn rig_device() -> CameraDevice {
    CameraDevice {
        name: "Rig Camera".into(),
        path: "/dev/video0".into(),
        v4l2_path: Some("/dev/video0".into()),
    }
}

fn code(text: &str) -> Barcode {
    Barcode {
        display_value: text.into(),
        symbology: Symbology::QrCode,
        region: FrameRegion::from_pixels(10, 10, 40, 40, 100, 100),
    }
}

/// Resolve effects the way a front end does; returns notices and whether it closed
fn drive(screen: &mut ScannerScreen, effects: Vec<Effect>) -> (Vec<Notice>, bool) {
    let mut notices = Vec::new();
    let mut closed = false;
    let mut pending = effects;
    while !pending.is_empty() {
        let mut next = Vec::new();
        for effect in pending {
            match effect {
                Effect::ShowNotice(notice) => notices.push(notice),
                Effect::RequestPermission(token) => {
                    let response = pollster::block_on(screen.permission_service().request(token));
                    next.extend(screen.on_permission_result(response));
                }
                Effect::CloseScreen => closed = true,
            }
        }
        pending = next;
    }
    (notices, closed)
}

#[test]
fn test_first_run_prompt_retry_then_scan() {
    let rig = Arc::new(Rig::default());
    let permissions = ScriptedPermissions::new(PermissionStatus::Prompt, &[(false, true), (true, false)]);
    let mut screen = ScannerScreen::new(permissions, Arc::new(RigBackend(rig.clone())), rig_device());

    let effects = screen.start();
    let (notices, closed) = drive(&mut screen, effects);
    assert_eq!(notices, vec![Notice::PermissionRationale]);
    assert!(!closed);
    assert_eq!(screen.permission(), PermissionState::Granted);

    // Preview appears after permission; the camera starts and delivers a frame
    let (surface, mut frames) = PreviewSurface::channel(2);
    screen.surface_created(surface);
    assert!(screen.is_scanning());
    let frame = frames.try_recv().expect("camera delivered a frame");

    // A blank frame holds no code
    let detector = screen.detector().expect("detector is built on setup");
    assert!(detector.detect_sync(&frame).is_empty());

    screen.on_detections(DetectionBatch::new(screen.generation(), vec![code("ABC123")]));
    assert_eq!(screen.result().map(|r| r.text.as_str()), Some("ABC123"));
    assert!(!rig.running.load(Ordering::SeqCst));
}

#[test]
fn test_permanent_denial_closes_with_hint() {
    let rig = Arc::new(Rig::default());
    let permissions = ScriptedPermissions::new(PermissionStatus::Prompt, &[(false, false)]);
    let mut screen = ScannerScreen::new(permissions, Arc::new(RigBackend(rig.clone())), rig_device());

    let effects = screen.start();
    let (notices, closed) = drive(&mut screen, effects);
    assert!(closed);
    assert_eq!(screen.permission(), PermissionState::DeniedPermanently);
    assert!(notices.iter().any(|n| matches!(
        n,
        Notice::PermissionDeniedPermanently { hint: Some(hint) } if hint.contains("Settings")
    )));

    // Nothing may start the camera afterwards
    screen.surface_created(PreviewSurface::channel(1).0);
    assert!(!rig.running.load(Ordering::SeqCst));
}

#[test]
fn test_clear_discards_results_from_previous_session() {
    let rig = Arc::new(Rig::default());
    let permissions = ScriptedPermissions::new(PermissionStatus::Granted, &[]);
    let mut screen = ScannerScreen::new(permissions, Arc::new(RigBackend(rig.clone())), rig_device());
    assert!(screen.start().is_empty());
    screen.surface_created(PreviewSurface::channel(1).0);

    let first_generation = screen.generation();
    screen.on_detections(DetectionBatch::new(first_generation, vec![code("first")]));
    assert!(screen.clear().is_empty());
    assert!(screen.is_scanning());

    // A detection that was in flight for the old session arrives late
    screen.on_detections(DetectionBatch::new(first_generation, vec![code("late")]));
    assert!(screen.result().is_none());

    screen.on_detections(DetectionBatch::new(
        screen.generation(),
        vec![code("second"), code("ignored")],
    ));
    assert_eq!(screen.result().map(|r| r.text.as_str()), Some("second"));
}

#[test]
fn test_torch_follows_session() {
    let rig = Arc::new(Rig::default());
    let permissions = ScriptedPermissions::new(PermissionStatus::Granted, &[]);
    let mut screen = ScannerScreen::new(permissions, Arc::new(RigBackend(rig.clone())), rig_device());
    assert!(screen.start().is_empty());
    screen.surface_created(PreviewSurface::channel(1).0);

    screen.toggle_flash();
    assert_eq!(screen.flash(), FlashState::Torch);
    assert!(rig.torch_on.load(Ordering::SeqCst));

    // Leaving the screen turns the light off
    screen.surface_destroyed();
    assert_eq!(screen.flash(), FlashState::Off);
    assert!(!rig.torch_on.load(Ordering::SeqCst));
}
