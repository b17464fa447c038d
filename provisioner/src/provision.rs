use crate::db::{is_duplicate_error, user_collections, user_exists};
use crate::errors::{Error, Result, Step, StepContext};
use crate::model::{Device, SensorReading};
use crate::schema::{index_specs, APP_ROLE, COLLECTIONS, DEVICES, SENSOR_DATA};
use crate::seed::{seed_devices, seed_readings};
use crate::validate::{validate_device, validate_reading};
use bson::doc;
use chrono::Utc;
use mongodb::Database;
use tracing::{debug, info, warn};

/// What a completed run created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub database: String,
    pub user: String,
    pub collections: Vec<String>,
    pub indexes_created: usize,
    pub devices_inserted: usize,
    pub readings_inserted: usize,
}

impl ProvisionSummary {
    /// Status lines printed on success
    pub fn completion_lines(&self) -> Vec<String> {
        vec![
            format!("MongoDB provisioning complete: database {}", self.database),
            format!(
                "Created user: {} ({} on {})",
                self.user, APP_ROLE, self.database
            ),
            format!("Created collections: {}", self.collections.join(", ")),
            format!(
                "Inserted sample data: {} devices, {} sensor readings",
                self.devices_inserted, self.readings_inserted
            ),
        ]
    }
}

pub struct Provisioner {
    db: Database,
    user: String,
    password: String,
}

impl Provisioner {
    pub fn new(db: Database, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            db,
            user: user.into(),
            password: password.into(),
        }
    }

    /// Runs every step in order, stopping at the first failure.
    pub async fn run(&self) -> Result<ProvisionSummary> {
        info!("Provisioning database {}", self.db.name());

        self.preflight().await?;
        self.create_user().await?;
        self.create_collections().await?;
        let indexes_created = self.create_indexes().await?;

        let now = Utc::now();
        let devices_inserted = self.insert_devices(&seed_devices(now)).await?;
        let readings_inserted = self.insert_readings(&seed_readings(now)).await?;

        info!("Provisioning of {} finished", self.db.name());

        Ok(ProvisionSummary {
            database: self.db.name().to_string(),
            user: self.user.clone(),
            collections: COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            indexes_created,
            devices_inserted,
            readings_inserted,
        })
    }

    /// Rejects a database that already holds the user or any collection.
    pub async fn preflight(&self) -> Result<()> {
        let mut found = Vec::new();

        if user_exists(&self.db, &self.user)
            .await
            .during(Step::PreflightCheck)?
        {
            found.push(format!("user {} exists", self.user));
        }

        let existing = user_collections(&self.db)
            .await
            .during(Step::PreflightCheck)?;
        for name in COLLECTIONS {
            if existing.iter().any(|c| c == name) {
                found.push(format!("collection {} exists", name));
            }
        }

        if found.is_empty() {
            debug!("Pre-flight check passed for {}", self.db.name());
            return Ok(());
        }

        warn!(
            "Database {} is not pristine: {}",
            self.db.name(),
            found.join(", ")
        );
        Err(Error::AlreadyProvisioned(found.join(", ")))
    }

    async fn create_user(&self) -> Result<()> {
        info!(
            "Creating user {} with role {} on {}",
            self.user,
            APP_ROLE,
            self.db.name()
        );

        let command = doc! {
            "createUser": self.user.as_str(),
            "pwd": self.password.as_str(),
            "roles": [ { "role": APP_ROLE, "db": self.db.name() } ],
        };

        match self.db.run_command(command).await {
            Ok(_) => Ok(()),
            // Lost a race with another provisioner between pre-flight and here
            Err(e) if is_duplicate_error(&e) => Err(Error::AlreadyProvisioned(format!(
                "user {} exists",
                self.user
            ))),
            Err(e) => Err(Error::Step {
                step: Step::CreateUser,
                source: e,
            }),
        }
    }

    async fn create_collections(&self) -> Result<()> {
        for name in COLLECTIONS {
            info!("Creating collection {}", name);
            self.db
                .create_collection(name)
                .await
                .during(Step::CreateCollections)?;
        }
        Ok(())
    }

    async fn create_indexes(&self) -> Result<usize> {
        let specs = index_specs();
        for spec in &specs {
            let result = self
                .db
                .collection::<bson::Document>(spec.collection)
                .create_index(spec.to_model())
                .await
                .during(Step::CreateIndexes)?;
            debug!(
                "Created index {} on {} (unique={})",
                result.index_name, spec.collection, spec.unique
            );
        }
        info!("Created {} indexes", specs.len());
        Ok(specs.len())
    }

    async fn insert_devices(&self, devices: &[Device]) -> Result<usize> {
        for device in devices {
            validate_device(device)?;
        }

        let result = self
            .db
            .collection::<Device>(DEVICES)
            .insert_many(devices)
            .await
            .during(Step::InsertDevices)?;
        info!("Inserted {} devices", result.inserted_ids.len());
        Ok(result.inserted_ids.len())
    }

    async fn insert_readings(&self, readings: &[SensorReading]) -> Result<usize> {
        for reading in readings {
            validate_reading(reading)?;
        }

        let result = self
            .db
            .collection::<SensorReading>(SENSOR_DATA)
            .insert_many(readings)
            .await
            .during(Step::InsertReadings)?;
        info!("Inserted {} sensor readings", result.inserted_ids.len());
        Ok(result.inserted_ids.len())
    }
}
