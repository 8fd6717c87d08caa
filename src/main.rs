use clap::Parser;
use gostalker::config::{Config, DefaultStep};
use gostalker::debugger::{Debugger, NopHook};
use gostalker::ui::console::AppBuilder;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address of a headless debugger backend
    #[arg(env = "GS_BACKEND")]
    addr: String,

    /// Path to configuration file, `~/.config/gostalker/config.toml` by default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop at breakpoints hit while next, step or stepout is in progress
    #[arg(long)]
    stop_on_next_breakpoint: bool,

    /// Behavior of `step` without arguments
    #[arg(long)]
    default_step: Option<DefaultStep>,

    /// Save command history in `~/.config/gostalker/history`
    #[arg(long)]
    save_history: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(args.config.as_deref()).unwrap_or_default();
    if args.stop_on_next_breakpoint {
        config.session.stop_on_next_breakpoint = true;
    }
    if let Some(step) = args.default_step {
        config.session.default_step = step;
    }
    if args.save_history {
        config.ui.save_history = true;
    }

    let debugger = Debugger::connect(args.addr.as_str(), config.session, NopHook)?;
    let app = AppBuilder::new(config.ui).build(debugger)?;
    app.run()
}
