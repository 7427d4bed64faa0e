//! Fixed calibration table used to fit the congestion model at startup.

use super::model::Sample;

/// `(speed km/h, distance m, observed congestion %)` triples.
pub const CALIBRATION_TABLE: [(f64, f64, f64); 8] = [
    (10.0, 50.0, 10.0),
    (20.0, 40.0, 20.0),
    (30.0, 35.0, 35.0),
    (40.0, 30.0, 50.0),
    (50.0, 25.0, 65.0),
    (60.0, 20.0, 80.0),
    (70.0, 15.0, 90.0),
    (80.0, 10.0, 100.0),
];

/// The calibration table as model samples.
pub fn calibration_samples() -> Vec<Sample> {
    CALIBRATION_TABLE
        .iter()
        .map(|&(speed, distance, congestion)| Sample::new(speed, distance, congestion))
        .collect()
}
