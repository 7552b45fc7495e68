use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use festival::clients::CatalogClient;
use festival::config::{get_optional_variable, get_variable_or, parse_variable_or};
use festival::db::{MemoryReviewDb, PgReviewDb, ReviewDb};
use festival::environment::{Config, Environment};
use festival::reviews::Reviews;
use festival::routes;
use festival::server::{self, Ports};
use festival::urls::Urls;
use log::{info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let ports = Ports {
        main: parse_variable_or("FESTIVAL_REVIEWS_PORT", 9090),
        admin: parse_variable_or("FESTIVAL_REVIEWS_ADMIN_PORT", 9091),
    };

    info!(logger, "Starting..."; "main_port" => ports.main, "admin_port" => ports.admin);
    let logger = Arc::new(logger);

    let db: Arc<dyn ReviewDb + Send + Sync> =
        match get_optional_variable("FESTIVAL_REVIEWS_DB_CONNECTION_STRING") {
            Some(connection_string) => {
                info!(logger, "Creating database pool...");
                let pool = sqlx::PgPool::connect(&connection_string).await?;

                Arc::new(PgReviewDb::new(pool))
            }
            None => {
                info!(logger, "No connection string, keeping reviews in memory");

                Arc::new(MemoryReviewDb::new())
            }
        };

    let deadline = Duration::from_millis(parse_variable_or(
        "FESTIVAL_SUBJECT_CHECK_TIMEOUT_MS",
        CatalogClient::DEFAULT_DEADLINE.as_millis() as u64,
    ));
    let directory = Arc::new(CatalogClient::new(
        logger.clone(),
        get_variable_or("FESTIVAL_CATALOG_URL", "http://localhost:8080"),
        deadline,
    ));
    let reviews = Reviews::new(logger.clone(), db, directory);

    let urls = Arc::new(Urls::new(get_variable_or(
        "FESTIVAL_REVIEWS_URL",
        "http://localhost:9090",
    )));
    let environment = Environment::new(logger, reviews, urls, Config::new("Review Service"));

    server::run(environment.clone(), routes::reviews_api(environment), ports).await;

    Ok(())
}
