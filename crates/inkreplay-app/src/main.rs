//! InkReplay command-line entry point (native).

mod replay;

use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting InkReplay");

    let args = replay::ReplayArgs::parse();
    match replay::run(&args) {
        Ok(summary) => log::info!(
            "Replayed {} points: {} preview frames, {} ribbon frames",
            summary.points,
            summary.preview_frames,
            summary.ribbon_frames
        ),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
