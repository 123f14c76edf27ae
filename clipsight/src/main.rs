use clap::Parser;
use tracing::info;

use clipsight::app_state;
use clipsight::http::setup_http_server;
use clipsight::init_telemetry;

#[derive(Parser)]
#[command(name = "clipsight")]
#[command(about = "Video-analysis API with per-tier request quotas")]
#[clap(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser)]
enum Commands {
    /// Show current configuration and exit
    Config,
    /// Start the clipsight server (default)
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Config => {
            let app_state = app_state::AppState::new_for_config_only()?;
            println!("{:#?}", &app_state.settings);
            return Ok(());
        }
        Commands::Run => {
            // Continue with the normal server startup
        }
    }

    init_telemetry::init_telemetry_and_tracing()?;

    let app_state = app_state::AppState::new().await?;
    let bind_address = app_state.settings.api.bind_address.clone();

    let handle = setup_http_server(app_state, &bind_address).await?;
    handle.await??;

    info!("All tasks are done");
    Ok(())
}
