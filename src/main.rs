// Entry point: parses arguments, installs logging and launches the viewer.
use clap::Parser;

use rica::app::App;
use rica::cli::Args;
use rica::config::AppConfig;
use rica::logging::{Verbosity, init_subscriber};

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_subscriber(Verbosity::from_flag(args.verbose));
    let config = AppConfig::load_or_default(&args.config);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 950.0])
            .with_title("Rica"),
        ..Default::default()
    };

    eframe::run_native(
        "Rica",
        native_options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, args, config)))),
    )
}
