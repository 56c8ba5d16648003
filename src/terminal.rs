// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanner
//!
//! Drives the same [`ScannerScreen`] as the desktop window, rendering the
//! camera feed with Unicode half-block characters and the scan result in a
//! status bar. Keys: `c` clears the result, `f` toggles the flash, `q` or
//! Ctrl+C quits.

use crate::backends::camera::{self, CameraDevice, CameraFrame, PreviewSurface};
use crate::config::Config;
use crate::constants::{pipeline, timing};
use crate::detector::DetectionBatch;
use crate::fl;
use crate::permission;
use crate::screen::{Effect, ScannerScreen};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Instant;
use tracing::{info, warn};

/// Run the terminal scanner
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Open a scanner screen on the configured camera
fn open_screen(config: &Config) -> (ScannerScreen, Vec<Effect>) {
    let backend = camera::get_backend(config.backend);
    let cameras = backend.enumerate_cameras();
    let device = camera::default_device(&cameras, config.last_camera_path.as_deref())
        .unwrap_or_else(CameraDevice::pipewire_default);
    info!(device = %device.name, "Terminal scanner using camera");

    let mut screen = ScannerScreen::new(permission::system_service(), backend, device);
    let effects = screen.start();
    (screen, effects)
}

/// What the loop should do after effects were applied
enum Flow {
    Continue,
    Quit,
}

/// Apply effects in place; permission prompts block until answered
fn apply_effects(screen: &mut ScannerScreen, effects: Vec<Effect>, status: &mut String) -> Flow {
    let mut pending = effects;
    let mut flow = Flow::Continue;

    while !pending.is_empty() {
        let mut next = Vec::new();
        for effect in pending {
            match effect {
                Effect::ShowNotice(notice) => *status = notice.message(),
                Effect::RequestPermission(token) => {
                    let response = pollster::block_on(screen.permission_service().request(token));
                    next.extend(screen.on_permission_result(response));
                }
                Effect::CloseScreen => flow = Flow::Quit,
            }
        }
        pending = next;
    }

    flow
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut status_message = fl!("terminal-keys");
    let (mut screen, effects) = open_screen(config);

    let (surface, mut frames) = PreviewSurface::channel(pipeline::FRAME_CHANNEL_CAPACITY);
    let mut frame_widget = FrameWidget::new();

    // Permission comes first so the notice can be shown before the camera opens
    if let Flow::Quit = apply_effects(&mut screen, effects, &mut status_message) {
        draw(terminal, &frame_widget, &screen, &status_message)?;
        std::thread::sleep(timing::TERMINAL_NOTICE_DELAY);
        return Ok(());
    }
    screen.surface_created(surface);

    let interval = config.detection_interval();
    let mut last_detection: Option<Instant> = None;

    loop {
        // Drain to the latest frame
        while let Ok(frame) = frames.try_recv() {
            if screen.is_scanning() {
                frame_widget.update_frame(frame);
            }
        }

        let due = last_detection.is_none_or(|last| last.elapsed() >= interval);
        if due
            && screen.is_scanning()
            && let Some(detector) = screen.detector()
            && let Some(frame) = frame_widget.take_unscanned()
        {
            last_detection = Some(Instant::now());
            let barcodes = detector.detect_sync(frame);
            if !barcodes.is_empty() {
                screen.on_detections(DetectionBatch::new(screen.generation(), barcodes));
                if let Some(result) = screen.result() {
                    status_message = fl!("terminal-result", value = result.text.clone());
                }
            }
        }

        draw(terminal, &frame_widget, &screen, &status_message)?;

        if event::poll(timing::TERMINAL_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('q') => break,
                KeyCode::Char('c') => {
                    frame_widget.restart();
                    let effects = screen.clear();
                    status_message = fl!("terminal-keys");
                    last_detection = None;
                    if let Flow::Quit = apply_effects(&mut screen, effects, &mut status_message) {
                        break;
                    }
                }
                KeyCode::Char('f') => {
                    screen.toggle_flash();
                    status_message = format!("{} | {}", screen.flash_label(), fl!("terminal-keys"));
                }
                _ => {}
            }
        }
    }

    screen.surface_destroyed();
    if let Some(result) = screen.result() {
        warn!(value = %result.text, "Exiting with an unconsumed scan result");
    }
    Ok(())
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    frame_widget: &FrameWidget,
    screen: &ScannerScreen,
    status_message: &str,
) -> io::Result<()> {
    terminal.draw(|f| {
        let area = f.area();

        // Reserve bottom line for status
        let camera_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height.saturating_sub(1),
        };

        // A result freezes the preview on the last scanned frame
        f.render_widget(frame_widget, camera_area);

        let status_area = Rect {
            x: area.x,
            y: area.height.saturating_sub(1),
            width: area.width,
            height: 1,
        };
        let status = StatusBar {
            message: status_message,
            highlight: screen.result().is_some(),
        };
        f.render_widget(status, status_area);
    })?;
    Ok(())
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
    /// The shown frame has not been through the detector yet
    unscanned: bool,
    /// Frames captured before this belong to an earlier session
    since: Instant,
}

impl FrameWidget {
    fn new() -> Self {
        Self {
            frame: None,
            unscanned: false,
            since: Instant::now(),
        }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        if frame.captured_at < self.since {
            return;
        }
        self.frame = Some(frame);
        self.unscanned = true;
    }

    /// Drop the shown frame and accept only frames captured from now on
    fn restart(&mut self) {
        self.frame = None;
        self.unscanned = false;
        self.since = Instant::now();
    }

    /// The latest frame, handed out once for detection
    fn take_unscanned(&mut self) -> Option<&CameraFrame> {
        if !std::mem::take(&mut self.unscanned) {
            return None;
        }
        self.frame.as_ref()
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_ref().filter(|f| f.width > 0 && f.height > 0) else {
            let msg = fl!("waiting-for-camera");
            let x = area.x + (area.width.saturating_sub(msg.chars().count() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        let (display_width, display_height) = fit_half_blocks(frame.width, frame.height, area);
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper pixel as foreground of '▀', lower pixel as background
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

/// Cells needed to show a `width`x`height` frame in `area`, keeping aspect ratio
///
/// Each cell carries two vertical pixels.
fn fit_half_blocks(width: u32, height: u32, area: Rect) -> (u16, u16) {
    let frame_aspect = width as f64 / height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;
    if term_height == 0.0 {
        return (0, 0);
    }

    if term_width / term_height > frame_aspect {
        let h = term_height;
        let w = h * frame_aspect;
        (w as u16, (h / 2.0) as u16)
    } else {
        let w = term_width;
        let h = w / frame_aspect;
        (w as u16, (h / 2.0) as u16)
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let idx = y as usize * frame.stride as usize + x as usize * 4;
    match frame.data.get(idx..idx + 3) {
        Some(&[r, g, b]) => Color::Rgb(r, g, b),
        _ => Color::Black,
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    /// Drawn in the accent color while a result is shown
    highlight: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = if self.highlight {
            Color::Green
        } else {
            Color::DarkGray
        };
        let fg = if self.highlight {
            Color::Black
        } else {
            Color::White
        };

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default().fg(fg).bg(bg),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(width: u16, height: u16) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_fit_half_blocks_wide_terminal() {
        // 4:3 frame in an 80x20 terminal: height-limited (40 pixel rows)
        let (w, h) = fit_half_blocks(640, 480, area(80, 20));
        assert_eq!(h, 20);
        assert_eq!(w, 53);
    }

    #[test]
    fn test_fit_half_blocks_tall_terminal() {
        let (w, h) = fit_half_blocks(640, 480, area(40, 100));
        assert_eq!(w, 40);
        assert_eq!(h, 15);
    }

    #[test]
    fn test_fit_half_blocks_empty_area() {
        assert_eq!(fit_half_blocks(640, 480, area(80, 0)), (0, 0));
    }

    #[test]
    fn test_sample_pixel_reads_rgba_with_stride() {
        let mut frame = CameraFrame::from_rgba(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 255]);
        assert_eq!(sample_pixel(&frame, 1, 0), Color::Rgb(40, 50, 60));
        // Coordinates clamp to the frame
        assert_eq!(sample_pixel(&frame, 9, 9), Color::Rgb(40, 50, 60));

        frame.data = vec![1, 2, 3].into();
        assert_eq!(sample_pixel(&frame, 1, 0), Color::Black);
    }

    fn gray_frame() -> CameraFrame {
        CameraFrame::from_rgba(2, 2, vec![128; 16])
    }

    #[test]
    fn test_frame_is_scanned_once() {
        let mut widget = FrameWidget::new();
        assert!(widget.take_unscanned().is_none());

        widget.update_frame(gray_frame());
        assert!(widget.take_unscanned().is_some());
        assert!(widget.take_unscanned().is_none());
        // Still on screen
        assert!(widget.frame.is_some());
    }

    #[test]
    fn test_restart_drops_frames_from_before() {
        let mut widget = FrameWidget::new();
        let before = gray_frame();
        widget.update_frame(gray_frame());

        // Clearing a result must not rescan the frozen frame
        std::thread::sleep(std::time::Duration::from_millis(2));
        widget.restart();
        assert!(widget.frame.is_none());
        assert!(widget.take_unscanned().is_none());

        // A frame still queued from the stopped session is ignored
        widget.update_frame(before);
        assert!(widget.frame.is_none());

        widget.update_frame(gray_frame());
        assert!(widget.take_unscanned().is_some());
    }

    #[test]
    fn test_status_bar_truncates_to_width() {
        let mut buf = Buffer::empty(area(5, 1));
        StatusBar {
            message: "Result: hello",
            highlight: true,
        }
        .render(area(5, 1), &mut buf);
        let line: String = (0..5)
            .map(|x| buf.cell((x, 0)).map(|c| c.symbol().to_string()).unwrap_or_default())
            .collect();
        assert_eq!(line, "Resul");
    }
}
