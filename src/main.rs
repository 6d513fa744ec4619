use anyhow::{Context, Result};
use clap::Parser;
use clscan::config::{Cli, Config};
use clscan::Rendered;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let output = cli.output.clone();
    let config: Config = cli.into();

    match clscan::run(&config)? {
        Rendered::Text(text) => match output {
            Some(path) => std::fs::write(&path, text)
                .with_context(|| format!("writing report to {}", path.display()))?,
            None => print!("{text}"),
        },
        Rendered::Html(pages) => {
            let dir = output.context("--output <dir> is required for --format html")?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            for page in pages {
                let path = dir.join(&page.file_name);
                std::fs::write(&path, page.content)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
    }

    Ok(())
}
