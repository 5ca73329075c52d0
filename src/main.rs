use pairline::{
    app,
    handlers::admin::admin_router,
    utils::{
        constant::DB_MAX_CONNECTIONS, logger::setup_logger, secret::read_secret,
        static_object::BIND_ADDR,
    },
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    setup_logger("pairline=info,tower_http=info");

    let database_url = read_secret("DATABASE_URL").expect("Database URL should be configured");

    let db_pool = PgPoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let app = app(db_pool.clone()).merge(admin_router(db_pool));

    let listener = TcpListener::bind(BIND_ADDR.as_str())
        .await
        .expect("Failed to bind listen address");
    info!("Server starting at http://{}", BIND_ADDR.as_str());

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server exited with error");
}
