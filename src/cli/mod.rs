// CLI module for imagefx-studio
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;

/// imagefx-studio - Session-based web backend for Google Labs ImageFX
#[derive(Parser, Debug)]
#[command(name = "imagefx-studio", version, about, long_about = None)]
pub struct Args {
    /// Validate the configured session token decodes, then exit
    #[arg(long)]
    pub check_token: bool,
}
