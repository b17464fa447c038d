use crate::config::Config;
use crate::errors::{Result, Step, StepContext};
use bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

const DUPLICATE_KEY: i32 = 11000;
const USER_ALREADY_EXISTS: i32 = 51003;

pub async fn connect(config: &Config) -> Result<Client> {
    info!("Connecting to MongoDB at {}", config.redacted_url());

    let mut options = ClientOptions::parse(&config.mongodb_url)
        .await
        .during(Step::Connect)?;
    options.app_name = Some(format!("iot-provisioner-{}", uuid::Uuid::new_v4()));
    options.server_selection_timeout = Some(config.server_selection_timeout());

    let client = Client::with_options(options).during(Step::Connect)?;

    // The driver connects lazily; ping so a bad URL fails here and not mid-provisioning
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .during(Step::Connect)?;

    info!("MongoDB connection established");
    Ok(client)
}

pub async fn user_exists(db: &Database, user: &str) -> mongodb::error::Result<bool> {
    let reply = db.run_command(doc! { "usersInfo": user }).await?;
    Ok(reply
        .get_array("users")
        .map(|users| !users.is_empty())
        .unwrap_or(false))
}

/// Collection names in `db`, excluding `system.*`
pub async fn user_collections(db: &Database) -> mongodb::error::Result<Vec<String>> {
    let mut names: Vec<String> = db
        .list_collection_names()
        .await?
        .into_iter()
        .filter(|name| !name.starts_with("system."))
        .collect();
    names.sort();
    Ok(names)
}

/// True for duplicate-key write errors and "user already exists" command errors
pub fn is_duplicate_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == DUPLICATE_KEY,
        ErrorKind::InsertMany(insert_err) => insert_err
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        ErrorKind::Command(cmd_err) => {
            cmd_err.code == DUPLICATE_KEY || cmd_err.code == USER_ALREADY_EXISTS
        }
        _ => false,
    }
}
