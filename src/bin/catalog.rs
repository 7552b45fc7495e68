use std::error::Error;
use std::sync::Arc;

use festival::catalog::Catalog;
use festival::clients::ReviewsClient;
use festival::config::{get_optional_variable, get_variable_or, is_enabled, parse_variable_or};
use festival::db::{CatalogDb, MemoryCatalogDb, PgCatalogDb};
use festival::environment::{Config, Environment};
use festival::routes;
use festival::seed::seed_sample_data;
use festival::server::{self, Ports};
use festival::urls::Urls;
use log::{info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let ports = Ports {
        main: parse_variable_or("FESTIVAL_CATALOG_PORT", 8080),
        admin: parse_variable_or("FESTIVAL_CATALOG_ADMIN_PORT", 8081),
    };

    info!(logger, "Starting..."; "main_port" => ports.main, "admin_port" => ports.admin);
    let logger = Arc::new(logger);

    let db: Arc<dyn CatalogDb + Send + Sync> =
        match get_optional_variable("FESTIVAL_CATALOG_DB_CONNECTION_STRING") {
            Some(connection_string) => {
                info!(logger, "Creating database pool...");
                let pool = sqlx::PgPool::connect(&connection_string).await?;

                Arc::new(PgCatalogDb::new(pool))
            }
            None => {
                info!(logger, "No connection string, keeping the catalog in memory");

                Arc::new(MemoryCatalogDb::new())
            }
        };

    let reviews = Arc::new(ReviewsClient::new(
        logger.clone(),
        get_variable_or("FESTIVAL_REVIEWS_URL", "http://localhost:9090"),
    ));
    let catalog = Catalog::new(logger.clone(), db, reviews);

    if is_enabled("FESTIVAL_SEED_SAMPLE_DATA") {
        seed_sample_data(&catalog).await?;
    }

    let urls = Arc::new(Urls::new(get_variable_or(
        "FESTIVAL_CATALOG_URL",
        "http://localhost:8080",
    )));
    let environment = Environment::new(logger, catalog, urls, Config::new("Catalog Service"));

    server::run(environment.clone(), routes::catalog_api(environment), ports).await;

    Ok(())
}
