use clap::Parser;
use provisioner::config::Config;
use provisioner::errors::Result;
use provisioner::provision::Provisioner;
use provisioner::{db, verify};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Logs go to stderr; stdout carries only the status lines
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting IoT database provisioner");
    info!("Database: {}", config.database);
    info!("Application user: {}", config.app_user);

    match run(&config).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            error!("Provisioning failed: {}", e);
            match e.step() {
                Some(step) => eprintln!("provisioning failed at {}: {}", step, e),
                None => eprintln!("provisioning failed: {}", e),
            }
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(config: &Config) -> Result<Vec<String>> {
    config.validate()?;

    let client = db::connect(config).await?;
    let database = client.database(&config.database);

    if config.check_only {
        verify::verify(&database).await?;
        return Ok(vec![format!(
            "Verified provisioning of database {}",
            config.database
        )]);
    }

    let provisioner = Provisioner::new(
        database.clone(),
        config.app_user.as_str(),
        config.app_password.as_str(),
    );
    let summary = provisioner.run().await?;

    if config.skip_verify {
        info!("Skipping verification");
    } else {
        verify::verify(&database).await?;
    }

    Ok(summary.completion_lines())
}

