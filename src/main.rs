use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use edulife::state::init_app_state;
use edulife::{cli, db};
use edulife_config::DatabaseConfig;
use edulife_models::media::VideoJobStatus;

#[derive(Parser)]
#[command(name = "edulife")]
#[command(about = "EduLife backend - administrative and worker commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Create a super admin account
    CreateSuperadmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Run the video processing worker
    Worker,
    /// Distribute the subscription revenue pool for a billing period
    DistributePool {
        /// Billing period, e.g. 2026-08
        period: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => {
            let pool = db::init_db_pool(&DatabaseConfig::from_env()).await?;
            db::run_migrations(&pool).await?;
            info!("migrations applied");
        }
        Commands::CreateSuperadmin { email, password } => {
            let state = init_app_state().await?;
            let user = cli::create_superadmin(&state, email, password).await?;
            println!("Super admin created: {}", user.id);
        }
        Commands::Worker => {
            let state = init_app_state().await?;
            info!("video worker started");
            state
                .media
                .run_worker(|job, stage| async move {
                    // Passthrough stages; a transcoder integration plugs in
                    // here. The upload stage publishes the source URL.
                    info!(job_id = %job.id, stage = %stage, "stage done");
                    match stage {
                        VideoJobStatus::Uploading => Ok(Some(job.source_url.clone())),
                        _ => Ok(None),
                    }
                })
                .await?;
        }
        Commands::DistributePool { period } => {
            let state = init_app_state().await?;
            let earnings = state.payouts.distribute_subscription_pool(&period).await?;
            println!("Recorded {} pool earnings for {}", earnings.len(), period);
        }
    }
    Ok(())
}
