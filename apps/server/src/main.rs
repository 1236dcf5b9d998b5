use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use skillswap_auth::AccessTokenCodec;
use skillswap_config::{load as load_config, AppConfig};
use skillswap_database::{initialize_database, NewExchange, NewUser, Repositories, User};
use skillswap_realtime::{ExchangeStatus, UserId};
use skillswap_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "skillswap-backend")]
#[command(about = "SkillSwap realtime backend (serves by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and websocket server
    Serve,
    /// Seed the database with two demo users and an accepted exchange
    SeedData,
    /// Print an access token for an existing user
    IssueToken {
        /// Identifier of the user the token is issued for
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
        Commands::IssueToken { user_id } => issue_token(&user_id).await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting SkillSwap backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;
    let app = services.router(&config);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(skillswap_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    services.shutdown().await;
    info!("backend shut down");
    Ok(())
}

async fn open_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    let pool = initialize_database(&config.database)
        .await
        .context("failed to open database")?;
    Ok(Repositories::new(pool))
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("seeding database with demo data");

    let config = load_config().context("failed to load configuration")?;
    let repos = open_repositories(&config).await?;

    let seeded = repos
        .achievements
        .seed_catalogue()
        .await
        .context("failed to seed achievements")?;

    let (ada, ada_created) = demo_user(&repos, "ada", "Ada Lovelace").await?;
    let (alan, alan_created) = demo_user(&repos, "alan", "Alan Turing").await?;

    let rust = repos.skills.upsert_topic("Rust").await?;
    let guitar = repos.skills.upsert_topic("Guitar").await?;

    println!("Database seeded with demo data:");
    println!("- {seeded} achievements added to the catalogue");
    println!("- user {} ({})", ada.username, ada.id);
    println!("- user {} ({})", alan.username, alan.id);

    if ada_created || alan_created {
        let exchange = repos
            .exchanges
            .create(&NewExchange {
                initiator: ada.id.clone(),
                receiver: alan.id.clone(),
                topic_to_learn: guitar.id,
                topic_to_teach: rust.id,
                status: ExchangeStatus::Accepted,
            })
            .await
            .context("failed to create demo exchange")?;
        println!("- accepted exchange {}", exchange.id);
    }

    println!("Run 'issue-token <user-id>' to get an access token for a demo user");
    Ok(())
}

async fn demo_user(
    repos: &Repositories,
    username: &str,
    full_name: &str,
) -> anyhow::Result<(User, bool)> {
    if let Some(user) = repos.users.find_by_username(username).await? {
        return Ok((user, false));
    }

    let user = repos
        .users
        .create(&NewUser {
            full_name: full_name.to_string(),
            username: username.to_string(),
            email: Some(format!("{username}@skillswap.test")),
            avatar: None,
        })
        .await
        .with_context(|| format!("failed to create demo user {username}"))?;
    Ok((user, true))
}

async fn issue_token(raw_user_id: &str) -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let repos = open_repositories(&config).await?;

    let user_id = UserId::parse(raw_user_id).context("invalid user id")?;
    let Some(user) = repos.users.find_by_id(&user_id).await? else {
        bail!("no user with id {raw_user_id}");
    };

    let token = AccessTokenCodec::from_config(&config.auth)
        .issue(user.id.as_str(), user.email.as_deref(), Some(&user.username))
        .context("failed to issue access token")?;

    println!("{token}");
    Ok(())
}
