use crate::db::user_collections;
use crate::errors::{Error, Result, Step, StepContext};
use crate::schema::{
    index_specs_for, is_id_index, key_directions, COLLECTIONS, DEVICES, SENSOR_DATA,
};
use crate::seed::{seed_devices, seed_readings};
use bson::{doc, Document};
use chrono::Utc;
use mongodb::{Database, IndexModel};
use tracing::{debug, info, warn};

/// Checks a provisioned database against the expected layout and seed data.
pub async fn verify(db: &Database) -> Result<()> {
    info!("Verifying database {}", db.name());
    let mut failures = Vec::new();

    let mut expected: Vec<String> = COLLECTIONS.iter().map(|c| c.to_string()).collect();
    expected.sort();
    let actual = user_collections(db).await.during(Step::Verify)?;
    if actual != expected {
        failures.push(format!(
            "collections are [{}], expected [{}]",
            actual.join(", "),
            expected.join(", ")
        ));
    }

    // listIndexes fails on a missing collection; the mismatch above already covers it
    for collection in COLLECTIONS.into_iter().filter(|c| actual.iter().any(|a| a == c)) {
        let indexes = list_indexes(db, collection).await?;
        failures.extend(check_indexes(collection, &indexes));
    }

    let devices = db.collection::<Document>(DEVICES);
    for device in seed_devices(Utc::now()) {
        let found = devices
            .count_documents(doc! { "device_id": device.device_id.as_str() })
            .await
            .during(Step::Verify)?;
        if found == 0 {
            failures.push(format!("device {} missing", device.device_id));
        }
    }

    let readings = db.collection::<Document>(SENSOR_DATA);
    for reading in seed_readings(Utc::now()) {
        let found = readings
            .count_documents(doc! {
                "device_id": reading.device_id.as_str(),
                "sensor_type": reading.sensor_type.as_str(),
                "unit": reading.unit.as_str(),
                "value": reading.value,
            })
            .await
            .during(Step::Verify)?;
        if found == 0 {
            failures.push(format!(
                "{} reading for {} missing",
                reading.sensor_type, reading.device_id
            ));
        }
    }

    if failures.is_empty() {
        info!("Database {} verified", db.name());
        Ok(())
    } else {
        for failure in &failures {
            warn!("Verification: {}", failure);
        }
        Err(Error::Verification(failures))
    }
}

async fn list_indexes(db: &Database, collection: &str) -> Result<Vec<IndexModel>> {
    let mut cursor = db
        .collection::<Document>(collection)
        .list_indexes()
        .await
        .during(Step::Verify)?;

    let mut indexes = Vec::new();
    while cursor.advance().await.during(Step::Verify)? {
        indexes.push(cursor.deserialize_current().during(Step::Verify)?);
    }
    debug!("{} has {} indexes", collection, indexes.len());
    Ok(indexes)
}

/// Compares the indexes present on `collection` (excluding `_id`) with the declared ones.
/// Returns one message per mismatch.
pub fn check_indexes(collection: &str, indexes: &[IndexModel]) -> Vec<String> {
    let expected = index_specs_for(collection);
    let actual: Vec<&IndexModel> = indexes.iter().filter(|i| !is_id_index(&i.keys)).collect();
    let mut failures = Vec::new();

    for spec in &expected {
        let matching = actual
            .iter()
            .find(|index| key_directions(&index.keys) == spec.directions());
        match matching {
            None => failures.push(format!("{} index {} missing", collection, spec.keys)),
            Some(index) => {
                let unique = index
                    .options
                    .as_ref()
                    .and_then(|o| o.unique)
                    .unwrap_or(false);
                if unique != spec.unique {
                    failures.push(format!(
                        "{} index {} has unique={}, expected {}",
                        collection, spec.keys, unique, spec.unique
                    ));
                }
            }
        }
    }

    if actual.len() != expected.len() {
        failures.push(format!(
            "{} has {} secondary indexes, expected {}",
            collection,
            actual.len(),
            expected.len()
        ));
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::index_specs;
    use mongodb::options::IndexOptions;

    fn index(keys: Document, unique: bool) -> IndexModel {
        let options = IndexOptions::builder().unique(unique).build();
        IndexModel::builder().keys(keys).options(options).build()
    }

    fn declared(collection: &str) -> Vec<IndexModel> {
        let mut indexes = vec![index(doc! { "_id": 1 }, false)];
        indexes.extend(
            index_specs()
                .iter()
                .filter(|s| s.collection == collection)
                .map(|s| s.to_model()),
        );
        indexes
    }

    #[test]
    fn test_declared_indexes_pass() {
        assert!(check_indexes(SENSOR_DATA, &declared(SENSOR_DATA)).is_empty());
        assert!(check_indexes(DEVICES, &declared(DEVICES)).is_empty());
    }

    #[test]
    fn test_missing_compound_index() {
        let mut indexes = declared(SENSOR_DATA);
        indexes.retain(|i| i.keys.len() != 2);

        let failures = check_indexes(SENSOR_DATA, &indexes);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("missing"));
    }

    #[test]
    fn test_extra_index_reported() {
        let mut indexes = declared(SENSOR_DATA);
        indexes.push(index(doc! { "location": 1 }, false));

        let failures = check_indexes(SENSOR_DATA, &indexes);
        assert_eq!(
            failures,
            vec!["sensor_data has 4 secondary indexes, expected 3".to_string()]
        );
    }

    #[test]
    fn test_device_index_must_be_unique() {
        let indexes = vec![
            index(doc! { "_id": 1 }, false),
            index(doc! { "device_id": 1 }, false),
        ];

        let failures = check_indexes(DEVICES, &indexes);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("unique=false"));
    }

    #[test]
    fn test_server_reported_int64_keys_match() {
        let indexes = vec![
            index(doc! { "_id": 1_i64 }, false),
            index(doc! { "device_id": 1_i64 }, true),
        ];
        assert!(check_indexes(DEVICES, &indexes).is_empty());
    }
}
