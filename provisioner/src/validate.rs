use crate::errors::{Error, Result};
use crate::model::{Device, SensorReading};

const TEMP_MIN: f64 = -50.0;
const TEMP_MAX: f64 = 100.0;

/// Validates a device document before insertion
pub fn validate_device(device: &Device) -> Result<()> {
    if device.device_id.is_empty() {
        return Err(Error::Validation("Device ID cannot be empty".to_string()));
    }

    if device.device_name.is_empty() {
        return Err(Error::Validation(format!(
            "Device {} has an empty name",
            device.device_id
        )));
    }

    Ok(())
}

/// Validates a sensor reading before insertion
pub fn validate_reading(reading: &SensorReading) -> Result<()> {
    if reading.device_id.is_empty() {
        return Err(Error::Validation("Device ID cannot be empty".to_string()));
    }

    if !reading.value.is_finite() {
        return Err(Error::Validation(format!(
            "Reading from {} has non-finite value {}",
            reading.device_id, reading.value
        )));
    }

    // Only temperature has a known physical range
    if reading.sensor_type == "temperature"
        && (reading.value < TEMP_MIN || reading.value > TEMP_MAX)
    {
        return Err(Error::Validation(format!(
            "Temperature {} out of range [{}, {}]",
            reading.value, TEMP_MIN, TEMP_MAX
        )));
    }

    Ok(())
}
