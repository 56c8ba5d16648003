// SPDX-License-Identifier: GPL-3.0-only

//! The scanner screen controller
//!
//! `ScannerScreen` coordinates the camera permission, the camera session
//! lifecycle, detection results and the torch. It is synchronous and owned
//! by the UI thread; anything asynchronous (permission prompts, detection)
//! happens outside and is fed back in through its methods. Work the host has
//! to carry out is returned as [`Effect`]s.
//!
//! The camera session runs exactly when permission is granted, a preview
//! surface exists and no result is on display.

pub mod state;

pub use state::{Effect, FlashState, Notice, PermissionState, ScanResult, flash_button_label};

use crate::backends::camera::{CameraBackend, CameraDevice, CameraSession, PreviewSurface, SessionOptions};
use crate::constants::detector::{AUTOFOCUS, SYMBOLOGIES};
use crate::detector::{BarcodeDetector, DetectionBatch};
use crate::errors::{AppResult, ScannerError};
use crate::permission::{PermissionResponse, PermissionService, PermissionStatus, RequestToken};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// Session generations are unique across every screen of the process
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

pub struct ScannerScreen {
    permissions: Arc<dyn PermissionService>,
    backend: Arc<dyn CameraBackend>,
    device: CameraDevice,
    request_token: RequestToken,

    permission: PermissionState,
    session: Option<Box<dyn CameraSession>>,
    detector: Option<Arc<BarcodeDetector>>,
    surface: Option<PreviewSurface>,
    result: Option<ScanResult>,
    flash: FlashState,
    /// Bumped every time the session starts; detection batches carry it
    generation: u64,
}

impl ScannerScreen {
    pub fn new(
        permissions: Arc<dyn PermissionService>,
        backend: Arc<dyn CameraBackend>,
        device: CameraDevice,
    ) -> Self {
        Self {
            permissions,
            backend,
            device,
            request_token: RequestToken::default(),
            permission: PermissionState::Unknown,
            session: None,
            detector: None,
            surface: None,
            result: None,
            flash: FlashState::Off,
            generation: 0,
        }
    }

    /// Permission gate, run once when the screen opens
    pub fn start(&mut self) -> Vec<Effect> {
        info!(service = self.permissions.name(), device = %self.device.name, "Scanner screen starting");
        match self.permissions.status() {
            PermissionStatus::Granted => {
                self.permission = PermissionState::Granted;
                self.setup_logged();
                Vec::new()
            }
            PermissionStatus::Prompt => vec![
                Effect::ShowNotice(Notice::PermissionRationale),
                Effect::RequestPermission(self.request_token.clone()),
            ],
            PermissionStatus::Denied => self.deny_permanently(),
        }
    }

    /// Handle the answer to a permission request
    pub fn on_permission_result(&mut self, response: PermissionResponse) -> Vec<Effect> {
        if response.token != self.request_token {
            warn!(token = %response.token, "Ignoring permission response for another request");
            return Vec::new();
        }

        if response.granted {
            info!("Camera permission granted");
            self.permission = PermissionState::Granted;
            self.setup_logged();
            Vec::new()
        } else if response.can_ask_again {
            info!("Camera permission denied, asking again");
            self.permission = PermissionState::Denied;
            vec![Effect::RequestPermission(self.request_token.clone())]
        } else {
            self.deny_permanently()
        }
    }

    fn deny_permanently(&mut self) -> Vec<Effect> {
        warn!("Camera permission permanently denied");
        self.permission = PermissionState::DeniedPermanently;
        self.stop_session();
        vec![
            Effect::ShowNotice(Notice::PermissionDeniedPermanently {
                hint: self.permissions.denial_hint(),
            }),
            Effect::CloseScreen,
        ]
    }

    /// Build the detector and the camera session
    ///
    /// Only the first call has an effect. The camera is started right away
    /// when the preview surface already exists.
    pub fn setup(&mut self) -> AppResult<()> {
        if self.session.is_some() {
            warn!("Scanner already set up, ignoring");
            return Ok(());
        }

        self.detector = Some(Arc::new(BarcodeDetector::new(SYMBOLOGIES)));
        let session = self
            .backend
            .create_session(&self.device, SessionOptions { autofocus: AUTOFOCUS })
            .inspect_err(|e| {
                error!(error = %e, device = %self.device.name, "Failed to create camera session");
            })?;
        self.session = Some(session);

        // The surface may already exist when permission arrives late
        if self.surface.is_some() && self.result.is_none() {
            self.start_session()?;
        }
        Ok(())
    }

    fn setup_logged(&mut self) {
        if let Err(e) = self.setup() {
            error!(error = %e, "Failed to start camera");
        }
    }

    /// The preview surface became available
    pub fn surface_created(&mut self, surface: PreviewSurface) {
        debug!(surface = surface.id(), "Preview surface created");
        self.surface = Some(surface);

        if !self.recheck_permission() {
            debug!("Surface created without camera permission");
            return;
        }
        if self.result.is_some() {
            return;
        }
        if let Err(e) = self.start_session() {
            error!(error = %e, "Failed to start camera");
        }
    }

    /// The preview surface is gone
    pub fn surface_destroyed(&mut self) {
        debug!("Preview surface destroyed");
        self.stop_session();
        self.surface = None;
    }

    /// Apply a detection batch
    ///
    /// Only the first barcode counts. Batches produced for an earlier
    /// session, or arriving while nothing is scanning, are dropped.
    pub fn on_detections(&mut self, batch: DetectionBatch) {
        let Some(first) = batch.barcodes.into_iter().next() else {
            return;
        };
        if batch.generation != self.generation || !self.is_scanning() {
            debug!(
                batch = batch.generation,
                current = self.generation,
                "Discarding stale detection batch"
            );
            return;
        }

        info!(symbology = %first.symbology, "Barcode detected");
        self.stop_session();
        self.result = Some(ScanResult::new(first.display_value, first.symbology));
    }

    /// Drop the displayed result and resume scanning
    pub fn clear(&mut self) -> Vec<Effect> {
        self.result = None;

        if !self.recheck_permission() {
            info!("Camera permission missing, not restarting after clear");
            return Vec::new();
        }
        let restarted = if self.session.is_none() {
            self.setup()
        } else {
            self.start_session()
        };
        match restarted {
            Ok(()) => Vec::new(),
            Err(ScannerError::NotReady(what)) => {
                debug!(what, "Restart deferred until the preview is ready");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to restart camera");
                vec![Effect::ShowNotice(Notice::CameraRestartFailed(e.to_string()))]
            }
        }
    }

    /// Switch the torch of the running camera
    ///
    /// No-op without a running session or without torch hardware.
    pub fn toggle_flash(&mut self) {
        match self.switch_torch() {
            Ok(()) => {}
            Err(ScannerError::NotReady(what)) => debug!(what, "No torch available"),
            Err(e) => warn!(error = %e, "Failed to switch torch"),
        }
    }

    fn switch_torch(&mut self) -> AppResult<()> {
        let torch = self
            .session
            .as_ref()
            .filter(|session| session.is_running())
            .and_then(|session| session.torch())
            .ok_or(ScannerError::NotReady("torch"))?;

        let target = self.flash.toggled();
        torch.set_torch(target.is_on())?;
        debug!(torch = torch.name(), ?target, "Torch switched");
        self.flash = target;
        Ok(())
    }

    fn recheck_permission(&mut self) -> bool {
        match self.permissions.status() {
            PermissionStatus::Granted => {
                self.permission = PermissionState::Granted;
                true
            }
            PermissionStatus::Prompt => {
                if self.permission == PermissionState::Granted {
                    self.permission = PermissionState::Denied;
                }
                false
            }
            PermissionStatus::Denied => {
                self.permission = PermissionState::DeniedPermanently;
                false
            }
        }
    }

    fn start_session(&mut self) -> AppResult<()> {
        let surface = self
            .surface
            .as_ref()
            .ok_or(ScannerError::NotReady("preview surface"))?;
        let session = self
            .session
            .as_mut()
            .ok_or(ScannerError::NotReady("camera session"))?;
        if session.is_running() {
            return Ok(());
        }

        session.start(surface)?;
        self.generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        debug!(generation = self.generation, "Scanning");
        Ok(())
    }

    /// Stop the session, switching the torch off first
    fn stop_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_running() {
            return;
        }

        if self.flash.is_on() {
            match session.torch() {
                Some(torch) => {
                    if let Err(e) = torch.set_torch(false) {
                        warn!(error = %e, "Failed to switch torch off");
                    }
                }
                None => debug!("Torch vanished before switch off"),
            }
        }
        self.flash = FlashState::Off;
        session.stop();
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    pub fn flash(&self) -> FlashState {
        self.flash
    }

    pub fn flash_label(&self) -> String {
        flash_button_label(self.flash)
    }

    /// Whether frames are being analyzed right now
    pub fn is_scanning(&self) -> bool {
        self.result.is_none() && self.session.as_ref().is_some_and(|s| s.is_running())
    }

    /// The placeholder hint shows whenever no result does
    pub fn hint_visible(&self) -> bool {
        self.result.is_none()
    }

    pub fn detector(&self) -> Option<Arc<BarcodeDetector>> {
        self.detector.clone()
    }

    /// Session generation that fresh detection batches must carry
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn permission_service(&self) -> Arc<dyn PermissionService> {
        self.permissions.clone()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }
}

impl Drop for ScannerScreen {
    fn drop(&mut self) {
        self.stop_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, BackendResult, CameraBackendType};
    use crate::detector::{Barcode, FrameRegion, Symbology};
    use crate::errors::FlashError;
    use crate::flash::Torch;
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakePermissions {
        status: Mutex<PermissionStatus>,
    }

    impl FakePermissions {
        fn new(status: PermissionStatus) -> Arc<Self> {
            Arc::new(Self {
                status: Mutex::new(status),
            })
        }

        fn set(&self, status: PermissionStatus) {
            *self.status.lock().unwrap() = status;
        }
    }

    impl PermissionService for FakePermissions {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn status(&self) -> PermissionStatus {
            *self.status.lock().unwrap()
        }

        fn request(&self, token: RequestToken) -> BoxFuture<'static, PermissionResponse> {
            Box::pin(async move { PermissionResponse::granted(token) })
        }

        fn denial_hint(&self) -> Option<String> {
            Some("hint".into())
        }
    }

    #[derive(Default)]
    struct Hardware {
        running: AtomicBool,
        starts: AtomicUsize,
        sessions: AtomicUsize,
        fail_create: AtomicBool,
        fail_start: AtomicBool,
        torch_on: AtomicBool,
        has_torch: AtomicBool,
        torch_fails: AtomicBool,
    }

    struct FakeBackend {
        hw: Arc<Hardware>,
    }

    impl CameraBackend for FakeBackend {
        fn enumerate_cameras(&self) -> Vec<CameraDevice> {
            vec![device()]
        }

        fn create_session(
            &self,
            device: &CameraDevice,
            _options: SessionOptions,
        ) -> BackendResult<Box<dyn CameraSession>> {
            if self.hw.fail_create.load(Ordering::SeqCst) {
                return Err(BackendError::DeviceNotFound(device.path.clone()));
            }
            self.hw.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                hw: self.hw.clone(),
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

    struct FakeSession {
        hw: Arc<Hardware>,
        device: CameraDevice,
    }

    impl CameraSession for FakeSession {
        fn start(&mut self, _surface: &PreviewSurface) -> BackendResult<()> {
            if self.hw.fail_start.load(Ordering::SeqCst) {
                return Err(BackendError::InitializationFailed("device busy".into()));
            }
            self.hw.starts.fetch_add(1, Ordering::SeqCst);
            self.hw.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.hw.running.store(false, Ordering::SeqCst);
        }

        fn is_running(&self) -> bool {
            self.hw.running.load(Ordering::SeqCst)
        }

        fn torch(&self) -> Option<Box<dyn Torch>> {
            (self.is_running() && self.hw.has_torch.load(Ordering::SeqCst))
                .then(|| Box::new(FakeTorch { hw: self.hw.clone() }) as Box<dyn Torch>)
        }

        fn device(&self) -> &CameraDevice {
            &self.device
        }
    }

    struct FakeTorch {
        hw: Arc<Hardware>,
    }

    impl Torch for FakeTorch {
        fn name(&self) -> &str {
            "fake-torch"
        }

        fn set_torch(&self, on: bool) -> Result<(), FlashError> {
            if self.hw.torch_fails.load(Ordering::SeqCst) {
                return Err(FlashError::ControlFailed {
                    device: "fake".into(),
                    reason: "EINVAL".into(),
                });
            }
            self.hw.torch_on.store(on, Ordering::SeqCst);
            Ok(())
        }
    }

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Fake".into(),
            path: "/dev/video0".into(),
            v4l2_path: Some("/dev/video0".into()),
        }
    }

    fn screen(status: PermissionStatus) -> (ScannerScreen, Arc<FakePermissions>, Arc<Hardware>) {
        let permissions = FakePermissions::new(status);
        let hw = Arc::new(Hardware::default());
        hw.has_torch.store(true, Ordering::SeqCst);
        let screen = ScannerScreen::new(
            permissions.clone(),
            Arc::new(FakeBackend { hw: hw.clone() }),
            device(),
        );
        (screen, permissions, hw)
    }

    fn surface() -> PreviewSurface {
        PreviewSurface::channel(1).0
    }

    fn barcode(text: &str) -> Barcode {
        Barcode {
            display_value: text.into(),
            symbology: Symbology::QrCode,
            region: FrameRegion::from_pixels(0, 0, 10, 10, 100, 100),
        }
    }

    fn running_screen() -> (ScannerScreen, Arc<FakePermissions>, Arc<Hardware>) {
        let (mut screen, permissions, hw) = screen(PermissionStatus::Granted);
        assert!(screen.start().is_empty());
        screen.surface_created(surface());
        assert!(screen.is_scanning());
        (screen, permissions, hw)
    }

    /// Session runs exactly when granted, a surface exists and no result shows
    fn assert_invariant(screen: &ScannerScreen, hw: &Hardware) {
        let expected = screen.permission() == PermissionState::Granted
            && screen.result().is_none()
            && screen.has_surface();
        assert_eq!(hw.running.load(Ordering::SeqCst), expected);
    }

    #[test]
    fn test_granted_start_sets_up_once() {
        let (mut screen, _, hw) = screen(PermissionStatus::Granted);
        assert!(screen.start().is_empty());
        assert_eq!(screen.permission(), PermissionState::Granted);
        assert!(screen.detector().is_some());
        assert_eq!(hw.sessions.load(Ordering::SeqCst), 1);

        assert!(screen.setup().is_ok());
        assert_eq!(hw.sessions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prompt_shows_rationale_then_requests() {
        let (mut screen, _, _) = screen(PermissionStatus::Prompt);
        let effects = screen.start();
        assert_eq!(
            effects,
            vec![
                Effect::ShowNotice(Notice::PermissionRationale),
                Effect::RequestPermission(RequestToken::default()),
            ]
        );
        assert_eq!(screen.permission(), PermissionState::Unknown);
    }

    #[test]
    fn test_denied_at_start_closes_screen() {
        let (mut screen, _, hw) = screen(PermissionStatus::Denied);
        let effects = screen.start();
        assert_eq!(screen.permission(), PermissionState::DeniedPermanently);
        assert_eq!(effects.last(), Some(&Effect::CloseScreen));
        assert!(matches!(
            effects.first(),
            Some(Effect::ShowNotice(Notice::PermissionDeniedPermanently { hint: Some(_) }))
        ));
        assert_eq!(hw.sessions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_denial_with_ask_again_requests_again() {
        let (mut screen, _, _) = screen(PermissionStatus::Prompt);
        screen.start();
        for _ in 0..3 {
            let effects =
                screen.on_permission_result(PermissionResponse::denied(RequestToken::default(), true));
            assert_eq!(effects, vec![Effect::RequestPermission(RequestToken::default())]);
            assert_eq!(screen.permission(), PermissionState::Denied);
        }
    }

    #[test]
    fn test_permanent_denial_always_closes() {
        let (mut screen, _, _) = screen(PermissionStatus::Prompt);
        screen.start();
        let effects =
            screen.on_permission_result(PermissionResponse::denied(RequestToken::default(), false));
        assert_eq!(screen.permission(), PermissionState::DeniedPermanently);
        assert!(effects.contains(&Effect::CloseScreen));
    }

    #[test]
    fn test_grant_after_prompt_sets_up() {
        let (mut screen, permissions, hw) = screen(PermissionStatus::Prompt);
        screen.start();
        screen.surface_created(surface());
        assert!(!hw.running.load(Ordering::SeqCst));

        permissions.set(PermissionStatus::Granted);
        let effects = screen.on_permission_result(PermissionResponse::granted(RequestToken::default()));
        assert!(effects.is_empty());
        assert_eq!(screen.permission(), PermissionState::Granted);
        assert!(screen.is_scanning());
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_foreign_token_is_ignored() {
        let (mut screen, _, hw) = screen(PermissionStatus::Prompt);
        screen.start();
        let effects =
            screen.on_permission_result(PermissionResponse::granted(RequestToken::new("other")));
        assert!(effects.is_empty());
        assert_eq!(screen.permission(), PermissionState::Unknown);
        assert_eq!(hw.sessions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_surface_lifecycle() {
        let (mut screen, _, hw) = running_screen();
        assert_invariant(&screen, &hw);

        screen.surface_destroyed();
        assert!(!screen.is_scanning());
        assert_invariant(&screen, &hw);

        screen.surface_created(surface());
        assert!(screen.is_scanning());
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_surface_created_after_revocation_aborts() {
        let (mut screen, permissions, hw) = screen(PermissionStatus::Granted);
        screen.start();
        permissions.set(PermissionStatus::Prompt);
        screen.surface_created(surface());
        assert!(!hw.running.load(Ordering::SeqCst));
        assert_eq!(screen.permission(), PermissionState::Denied);
    }

    #[test]
    fn test_camera_start_failure_is_not_fatal() {
        let (mut screen, _, hw) = screen(PermissionStatus::Granted);
        screen.start();
        hw.fail_start.store(true, Ordering::SeqCst);
        screen.surface_created(surface());
        assert!(!screen.is_scanning());
        assert!(screen.result().is_none());
    }

    #[test]
    fn test_first_barcode_wins_and_stops_session() {
        let (mut screen, _, hw) = running_screen();
        let generation = screen.generation();
        screen.on_detections(DetectionBatch::new(
            generation,
            vec![barcode("first"), barcode("second")],
        ));

        assert_eq!(screen.result().map(|r| r.text.as_str()), Some("first"));
        assert!(!hw.running.load(Ordering::SeqCst));
        assert!(!screen.hint_visible());
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_empty_batch_changes_nothing() {
        let (mut screen, _, hw) = running_screen();
        screen.on_detections(DetectionBatch::new(screen.generation(), Vec::new()));
        assert!(screen.result().is_none());
        assert!(screen.is_scanning());
        assert_eq!(screen.flash(), FlashState::Off);
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_stale_batches_are_discarded() {
        let (mut screen, _, _) = running_screen();
        let generation = screen.generation();
        screen.on_detections(DetectionBatch::new(generation, vec![barcode("one")]));

        // In flight when the first result arrived
        screen.on_detections(DetectionBatch::new(generation, vec![barcode("two")]));
        assert_eq!(screen.result().map(|r| r.text.as_str()), Some("one"));

        screen.clear();
        screen.on_detections(DetectionBatch::new(generation, vec![barcode("old")]));
        assert!(screen.result().is_none());
        assert!(screen.is_scanning());
    }

    #[test]
    fn test_clear_with_permission_restarts() {
        let (mut screen, _, hw) = running_screen();
        screen.on_detections(DetectionBatch::new(screen.generation(), vec![barcode("x")]));
        let before = screen.generation();

        assert!(screen.clear().is_empty());
        assert!(screen.hint_visible());
        assert!(screen.is_scanning());
        assert!(screen.generation() > before);
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_clear_without_permission_is_silent() {
        let (mut screen, permissions, hw) = running_screen();
        screen.on_detections(DetectionBatch::new(screen.generation(), vec![barcode("x")]));
        permissions.set(PermissionStatus::Prompt);

        assert!(screen.clear().is_empty());
        assert!(screen.result().is_none());
        assert!(!hw.running.load(Ordering::SeqCst));
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_clear_restart_failure_shows_notice() {
        let (mut screen, _, hw) = running_screen();
        screen.on_detections(DetectionBatch::new(screen.generation(), vec![barcode("x")]));
        hw.fail_start.store(true, Ordering::SeqCst);

        let effects = screen.clear();
        assert!(matches!(
            effects.as_slice(),
            [Effect::ShowNotice(Notice::CameraRestartFailed(_))]
        ));
    }

    #[test]
    fn test_clear_without_session_reports_failed_setup() {
        let (mut screen, _, hw) = screen(PermissionStatus::Granted);
        hw.fail_create.store(true, Ordering::SeqCst);
        assert!(screen.start().is_empty());
        screen.surface_created(surface());
        assert!(!screen.is_scanning());

        let effects = screen.clear();
        assert!(matches!(
            effects.as_slice(),
            [Effect::ShowNotice(Notice::CameraRestartFailed(reason))] if reason.contains("/dev/video0")
        ));

        // The camera is back; the next clear sets up and starts it
        hw.fail_create.store(false, Ordering::SeqCst);
        assert!(screen.clear().is_empty());
        assert!(screen.is_scanning());
        assert_invariant(&screen, &hw);
    }

    #[test]
    fn test_generations_differ_between_screens() {
        let (mut old, _, old_hw) = running_screen();
        let old_generation = old.generation();
        old.surface_destroyed();
        drop(old);
        assert!(!old_hw.running.load(Ordering::SeqCst));

        let (mut new, _, hw) = running_screen();
        assert_ne!(new.generation(), old_generation);

        // A detection started for the previous camera lands on the new screen
        new.on_detections(DetectionBatch::new(old_generation, vec![barcode("old camera")]));
        assert!(new.result().is_none());
        assert!(new.is_scanning());
        assert_invariant(&new, &hw);
    }

    #[test]
    fn test_toggle_flash_twice_restores_state() {
        let (mut screen, _, hw) = running_screen();
        let label = screen.flash_label();

        screen.toggle_flash();
        assert_eq!(screen.flash(), FlashState::Torch);
        assert!(hw.torch_on.load(Ordering::SeqCst));
        assert_ne!(screen.flash_label(), label);

        screen.toggle_flash();
        assert_eq!(screen.flash(), FlashState::Off);
        assert!(!hw.torch_on.load(Ordering::SeqCst));
        assert_eq!(screen.flash_label(), label);
    }

    #[test]
    fn test_toggle_flash_without_session_is_noop() {
        let (mut screen, _, hw) = screen(PermissionStatus::Prompt);
        screen.toggle_flash();
        assert_eq!(screen.flash(), FlashState::Off);
        assert!(!hw.torch_on.load(Ordering::SeqCst));
    }

    #[test]
    fn test_toggle_flash_failure_keeps_state() {
        let (mut screen, _, hw) = running_screen();
        hw.torch_fails.store(true, Ordering::SeqCst);
        screen.toggle_flash();
        assert_eq!(screen.flash(), FlashState::Off);
    }

    #[test]
    fn test_torch_off_when_result_shows() {
        let (mut screen, _, hw) = running_screen();
        screen.toggle_flash();
        assert!(hw.torch_on.load(Ordering::SeqCst));

        screen.on_detections(DetectionBatch::new(screen.generation(), vec![barcode("x")]));
        assert!(!hw.torch_on.load(Ordering::SeqCst));
        assert_eq!(screen.flash(), FlashState::Off);
        assert_eq!(screen.flash_label(), "Flash ON");
    }

    #[test]
    fn test_torch_off_when_surface_destroyed() {
        let (mut screen, _, hw) = running_screen();
        screen.toggle_flash();
        screen.surface_destroyed();
        assert!(!hw.torch_on.load(Ordering::SeqCst));
        assert_eq!(screen.flash(), FlashState::Off);
    }

    #[test]
    fn test_scan_abc123_then_clear() {
        let (mut screen, _, hw) = running_screen();

        screen.on_detections(DetectionBatch::new(screen.generation(), vec![barcode("ABC123")]));
        assert_eq!(screen.result().map(|r| r.text.as_str()), Some("ABC123"));
        assert!(!hw.running.load(Ordering::SeqCst));
        assert_eq!(screen.flash_label(), "Flash ON");

        screen.clear();
        assert!(screen.result().is_none());
        assert!(screen.hint_visible());
        assert!(hw.running.load(Ordering::SeqCst));
        assert_eq!(hw.starts.load(Ordering::SeqCst), 2);
    }
}
