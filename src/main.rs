use book_lending::{
    adapters::postgres::PostgresCatalogStore,
    api::{handlers::AppState, router::create_router},
    application::loan::{BookLockTable, LoanPolicy, ServiceDependencies},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "book_lending=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/book_lending".into());

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Loan policy from environment, defaulting to 14 days / 5 books
    let mut policy = LoanPolicy::default();
    if let Ok(days) = std::env::var("LOAN_PERIOD_DAYS") {
        policy.loan_period_days = days.parse().expect("LOAN_PERIOD_DAYS must be an integer");
    }
    if let Ok(max) = std::env::var("MAX_BORROWED_BOOKS") {
        policy.max_borrowed_books = max.parse().expect("MAX_BORROWED_BOOKS must be an integer");
    }

    let store = Arc::new(PostgresCatalogStore::new(pool));

    let service_deps = ServiceDependencies {
        book_store: store.clone(),
        member_store: store.clone(),
        loan_store: store,
        book_locks: Arc::new(BookLockTable::new()),
        policy,
    };

    let app_state = Arc::new(AppState { service_deps });
    let app = create_router(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
