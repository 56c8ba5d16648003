// SPDX-License-Identifier: GPL-3.0-only

//! UI navigation, notice and window handlers

use crate::app::state::{AppModel, ContextPage, Message};
use crate::constants::timing;
use crate::screen::{Effect, Notice};
use cosmic::Task;
use cosmic::widget::toaster::{Toast, ToastId};
use tracing::{error, info, warn};

impl AppModel {
    pub(crate) fn handle_launch_url(&self, url: String) -> Task<cosmic::Action<Message>> {
        if let Err(err) = open::that_detached(&url) {
            error!(url = %url, error = %err, "Failed to open URL");
        }
        Task::none()
    }

    pub(crate) fn handle_toggle_context_page(
        &mut self,
        context_page: ContextPage,
    ) -> Task<cosmic::Action<Message>> {
        if self.context_page == context_page {
            self.core.window.show_context = !self.core.window.show_context;
        } else {
            self.context_page = context_page;
            self.core.window.show_context = true;
        }
        Task::none()
    }

    pub(crate) fn handle_close_toast(&mut self, id: ToastId) -> Task<cosmic::Action<Message>> {
        self.toasts.remove(id);
        Task::none()
    }

    pub(crate) fn handle_close_screen(&mut self) -> Task<cosmic::Action<Message>> {
        info!("Closing scanner");
        // Drops the session and switches the torch off
        self.screen = None;
        match self.core.main_window_id() {
            Some(id) => cosmic::iced::window::close(id),
            None => {
                warn!("No main window to close");
                Task::none()
            }
        }
    }

    pub(crate) fn show_notice(&mut self, notice: &Notice) -> Task<cosmic::Action<Message>> {
        self.toasts
            .push(Toast::new(notice.message()))
            .map(cosmic::Action::App)
    }

    /// Carry out the work a screen operation asked for
    pub(crate) fn apply_effects(&mut self, effects: Vec<Effect>) -> Task<cosmic::Action<Message>> {
        let mut tasks = Vec::with_capacity(effects.len());

        for effect in effects {
            match effect {
                Effect::ShowNotice(notice) => tasks.push(self.show_notice(&notice)),
                Effect::RequestPermission(token) => {
                    let Some(service) = self.screen.as_ref().map(|s| s.permission_service()) else {
                        continue;
                    };
                    info!(service = service.name(), %token, "Requesting camera permission");
                    tasks.push(Task::perform(service.request(token), |response| {
                        cosmic::Action::App(Message::PermissionResult(response))
                    }));
                }
                Effect::CloseScreen => {
                    // Leave the notice on screen long enough to be read
                    tasks.push(Task::perform(
                        tokio::time::sleep(timing::TERMINAL_NOTICE_DELAY),
                        |_| cosmic::Action::App(Message::CloseScreen),
                    ));
                }
            }
        }

        Task::batch(tasks)
    }
}
