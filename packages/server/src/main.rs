use anyhow::bail;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;
use server::utils::jwt;
use server::{build_router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        None => serve(config).await,
        Some((command, rest)) if command == "issue-token" => issue_token(&config, rest),
        Some((command, _)) => bail!("unknown command '{command}', expected 'issue-token'"),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = init_db(&config.database.url).await?;
    info!("Database schema synced");
    seed::ensure_indexes(&db).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(AppState::new(db, config));

    let listener = TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// `issue-token <subject> [permission...]`
fn issue_token(config: &AppConfig, args: &[String]) -> anyhow::Result<()> {
    let Some((subject, permissions)) = args.split_first() else {
        bail!("usage: server issue-token <subject> [permission...]");
    };

    let permissions: Vec<String> = if permissions.is_empty() {
        jwt::ALL_PERMISSIONS.iter().map(|p| p.to_string()).collect()
    } else {
        for permission in permissions {
            if !jwt::ALL_PERMISSIONS.contains(&permission.as_str()) {
                bail!(
                    "unknown permission '{permission}', expected one of: {}",
                    jwt::ALL_PERMISSIONS.join(", ")
                );
            }
        }
        permissions.to_vec()
    };

    let token = jwt::sign(
        subject,
        &permissions,
        &config.auth.jwt_secret,
        config.auth.token_ttl_days,
    )?;
    println!("{token}");
    Ok(())
}
