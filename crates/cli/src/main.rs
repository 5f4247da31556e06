use anyhow::Context;
use bookshelf_app::{build_registry, Collections};
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// In-N-Out Books API
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print the merged OpenAPI document
    Openapi {
        /// Emit single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Print the effective settings after layering config files and env vars
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            bookshelf_telemetry::init(&settings.telemetry);
            tracing::info!(env = ?settings.environment, "bookshelf CLI serving");
            bookshelf_app::run(settings).await
        }
        Command::Openapi { compact } => {
            let collections = Collections::in_memory(&settings);
            let registry = build_registry(&settings, &collections)?;
            let document = bookshelf_http::router::openapi_document(&registry);
            let rendered = if compact {
                serde_json::to_string(&document)?
            } else {
                serde_json::to_string_pretty(&document)?
            };
            println!("{rendered}");
            Ok(())
        }
        Command::Settings => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}
