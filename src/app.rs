use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cli::Args;
use crate::config::AppConfig;
use crate::core::bridge::EmbeddedView;
use crate::io::FsSource;
use crate::session::{Frame, SessionController, SessionEvent};
use crate::ui::viewdata::UiState;

pub struct App {
    controller: SessionController,
    embedded: EmbeddedView,
    ui_state: UiState,
    last_frame: Arc<Frame>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, args: Args, config: AppConfig) -> Self {
        cc.egui_ctx.set_pixels_per_point(config.ui.pixels_per_point);

        let ui_state = UiState::new(args.folder.clone(), config.spectrum.show_db);
        let (mut controller, embedded) =
            SessionController::new(FsSource::new(config.files.clone()), config);
        if let Some(folder) = &args.folder {
            info!(target: "rica", %folder, "loading folder from command line");
            controller.submit(SessionEvent::LoadFolder(PathBuf::from(folder)));
        }
        if let Some(query) = args.initial_query() {
            controller.submit(SessionEvent::UrlChanged(query));
        }
        let last_frame = controller.run_cycle();

        Self {
            controller,
            embedded,
            ui_state,
            last_frame,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.last_frame = self.controller.run_cycle();
        if let Some(scatter) = &self.last_frame.scatter {
            self.embedded.set_rows(scatter.row_ids());
        }
        self.embedded.receive_host();

        let events = crate::ui::windows::main_window(
            ctx,
            &self.last_frame,
            &mut self.ui_state,
            &mut self.embedded,
            self.controller.config(),
        );
        let busy = !events.is_empty();
        for event in events {
            self.controller.submit(event);
        }
        if busy {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
