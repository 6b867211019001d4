use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    init_tracing();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let options = mock_server::Options {
        token: std::env::var("MOCK_API_TOKEN").ok(),
        per_page: env_usize("MOCK_PER_PAGE", mock_server::DEFAULT_PER_PAGE),
        seed_users: env_usize("MOCK_SEED_USERS", 25),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        seed_users = options.seed_users,
        per_page = options.per_page,
        auth = options.token.is_some(),
        "mock users API listening"
    );
    mock_server::run_with(listener, options).await
}
