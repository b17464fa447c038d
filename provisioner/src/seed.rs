use crate::model::{Device, DeviceStatus, SensorReading};
use chrono::{DateTime, Utc};

const DEVICE_TYPE: &str = "pico_w";

/// Sample devices inserted on first provisioning
pub fn seed_devices(now: DateTime<Utc>) -> Vec<Device> {
    [
        ("pico_001", "Temperature Sensor 1", "classroom_a"),
        ("pico_002", "Temperature Sensor 2", "classroom_b"),
    ]
    .into_iter()
    .map(|(device_id, device_name, location)| Device {
        device_id: device_id.to_string(),
        device_name: device_name.to_string(),
        device_type: DEVICE_TYPE.to_string(),
        location: location.to_string(),
        status: DeviceStatus::Active,
        created_at: now,
        last_seen: now,
    })
    .collect()
}

/// Sample temperature readings, one per seed device
pub fn seed_readings(now: DateTime<Utc>) -> Vec<SensorReading> {
    [
        ("pico_001", 25.5, "classroom_a"),
        ("pico_002", 26.2, "classroom_b"),
    ]
    .into_iter()
    .map(|(device_id, value, location)| SensorReading {
        device_id: device_id.to_string(),
        device_type: DEVICE_TYPE.to_string(),
        timestamp: now,
        sensor_type: "temperature".to_string(),
        value,
        unit: "celsius".to_string(),
        location: location.to_string(),
    })
    .collect()
}
