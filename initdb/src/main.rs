//! A helper program to create the catalog and review tables.

use std::env;

use movine::Movine;
use postgres::{Client, NoTls};

use log::{debug, info, initialize_logger, Logger};

const DATABASES: &[(&str, &str)] = &[
    ("FESTIVAL_CATALOG_DB_CONNECTION_STRING", "./migrations/catalog"),
    ("FESTIVAL_REVIEWS_DB_CONNECTION_STRING", "./migrations/reviews"),
];

fn main() {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    for (variable, migrations) in DATABASES {
        match env::var(variable) {
            Ok(connection_string) => migrate(&logger, &connection_string, migrations),
            Err(_) => info!(logger, "Skipping database without connection string"; "variable" => *variable),
        }
    }

    debug!(logger, "Completed initialization.");
}

fn migrate(logger: &Logger, connection_string: &str, migrations: &str) {
    debug!(logger, "Connecting to database..."; "migrations" => migrations);

    let client = Client::connect(connection_string, NoTls).expect("could not connect to database");

    let mut movine = Movine::new(client);
    movine.set_migration_dir(migrations);

    if movine.status().is_err() {
        debug!(logger, "Initializing movine...");
        movine.initialize().expect("failed to initialize movine")
    }

    debug!(logger, "Running migrations..."; "migrations" => migrations);
    movine.up().expect("failed to run migrations");
}
