use clap::Parser;

/// Portal demo: drives a tooltip window next to a simulated main window.
#[derive(Parser, Debug)]
#[command(name = "portal-demo", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Move the main window this far right after the tooltip settled, to
    /// push the tooltip off the display.
    #[arg(long, default_value_t = 1100)]
    pub drag_by: i32,
}

pub fn parse() -> Args {
    Args::parse()
}
