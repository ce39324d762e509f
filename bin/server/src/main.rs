#[tokio::main]
async fn main() {
    use budget_chat_accounts::JsonFileDirectory;
    use budget_chat_ai::LlmIntentClassifier;
    use budget_chat_dialog::{Collaborators, Orchestrator};
    use budget_chat_ledger::PlainTextRenderer;
    use budget_chat_pricing::{LlmPriceOracle, PriceResolver};
    use budget_chat_server::{
        config::ServerConfig,
        db::{PgLedgerStore, PgSessionStore},
        llm::OpenAiBackend,
        webhook::{self, AppState},
        whatsapp::WhatsAppGateway,
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let directory = Arc::new(
        JsonFileDirectory::load(&config.directory.path).expect("failed to load account directory"),
    );

    let http = reqwest::Client::new();
    let llm = Arc::new(OpenAiBackend::new(http.clone(), config.llm.clone()));
    let whatsapp = Arc::new(WhatsAppGateway::new(http, config.whatsapp.clone()));
    let ledger = Arc::new(PgLedgerStore::new(db_pool.clone()));
    let prices = Arc::new(PriceResolver::new(
        Arc::new(LlmPriceOracle::new(llm.clone())),
        &config.pricing,
    ));

    // Spawn periodic price cache purge
    let purge_prices = prices.clone();
    let purge_interval = config.pricing.purge_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_interval);
        loop {
            interval.tick().await;
            let purged = purge_prices.purge_stale();
            if purged > 0 {
                tracing::debug!(purged_prices = purged, "Periodic price cache purge");
            }
        }
    });

    let orchestrator = Orchestrator::new(
        Collaborators {
            classifier: Arc::new(LlmIntentClassifier::new(llm.clone())),
            sessions: Arc::new(PgSessionStore::new(db_pool)),
            ledger: ledger.clone(),
            prices,
            directory: directory.clone(),
            gateway: whatsapp.clone(),
            renderer: Arc::new(PlainTextRenderer::new(ledger)),
        },
        config.dialog,
    );

    let app_state = Arc::new(AppState {
        orchestrator,
        whatsapp,
        llm,
        directory,
        verify_token: config.whatsapp.verify_token,
        admin_token: config.admin_token,
    });
    let app = webhook::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
