mod app;
mod cli;
mod glyphs;
mod noise;
mod pacing;
mod pipeline;
mod render;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Args::parse();
    app::run(args)
}
