mod commands;
mod config;
mod live;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{App, Command};

#[derive(Parser, Debug)]
#[command(name = "dxf-desktop", about = "Preview and generate DXF text designs")]
struct Args {
    /// Base address of the design service.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Where previews, DXF files and exports are written.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    let app = App::connect(settings)?;

    match args.command {
        Command::Live => {
            live::run(&app).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Once(command) => {
            let notice = commands::execute(&app, command).await;
            if notice.is_error() {
                eprintln!("{notice}");
                Ok(ExitCode::FAILURE)
            } else {
                println!("{notice}");
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
