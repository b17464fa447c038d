use bson::{doc, Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

pub const SENSOR_DATA: &str = "sensor_data";
pub const DEVICES: &str = "devices";

/// Collections in creation order
pub const COLLECTIONS: [&str; 2] = [SENSOR_DATA, DEVICES];

/// Role granted to the application user on the target database
pub const APP_ROLE: &str = "readWrite";

/// An index the provisioner declares on one collection
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub keys: Document,
    pub unique: bool,
}

impl IndexSpec {
    fn new(collection: &'static str, keys: Document, unique: bool) -> Self {
        Self {
            collection,
            keys,
            unique,
        }
    }

    pub fn to_model(&self) -> IndexModel {
        let model = IndexModel::builder().keys(self.keys.clone());
        if self.unique {
            model
                .options(IndexOptions::builder().unique(true).build())
                .build()
        } else {
            model.build()
        }
    }

    /// Key pattern with numeric directions normalized to i64
    pub fn directions(&self) -> Vec<(String, i64)> {
        key_directions(&self.keys)
    }
}

/// Every index declared by the provisioner, in creation order
pub fn index_specs() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new(SENSOR_DATA, doc! { "device_id": 1 }, false),
        IndexSpec::new(SENSOR_DATA, doc! { "timestamp": -1 }, false),
        IndexSpec::new(
            SENSOR_DATA,
            doc! { "device_id": 1, "timestamp": -1 },
            false,
        ),
        IndexSpec::new(DEVICES, doc! { "device_id": 1 }, true),
    ]
}

pub fn index_specs_for(collection: &str) -> Vec<IndexSpec> {
    index_specs()
        .into_iter()
        .filter(|spec| spec.collection == collection)
        .collect()
}

/// Flattens a key pattern so `{a: 1}` stored as Int32, Int64 or Double compares equal.
/// Non-numeric directions (text, hashed, 2dsphere) map to 0.
pub fn key_directions(keys: &Document) -> Vec<(String, i64)> {
    keys.iter()
        .map(|(field, direction)| {
            let direction = match direction {
                Bson::Int32(v) => i64::from(*v),
                Bson::Int64(v) => *v,
                Bson::Double(v) => *v as i64,
                _ => 0,
            };
            (field.clone(), direction)
        })
        .collect()
}

/// True for the implicit `_id` index every collection carries
pub fn is_id_index(keys: &Document) -> bool {
    key_directions(keys) == vec![("_id".to_string(), 1)]
}
