//! Recorded sensor datasets
//!
//! A [`SensorLog`] holds ground truth, both sensor streams and the noise
//! parameters of one run. It persists as a single JSON document so that a
//! generated scenario can be replayed later or by another tool.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use trackfuse_core::{FusionError, Point2, SensorStreams};

use crate::error::SimResult;

/// Ground truth, both sensor streams, and their noise parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorLog {
    /// True position per step (scoring only)
    pub ground_truth: Vec<Point2>,
    /// Sensor 1 readings
    pub z1: Vec<Point2>,
    /// Sensor 2 readings
    pub z2: Vec<Point2>,
    /// Sensor 1 noise standard deviation
    pub sigma_1: f64,
    /// Sensor 2 noise standard deviation
    pub sigma_2: f64,
    /// Sampling interval in seconds
    pub dt: f64,
    /// Step of the heading change, if any
    #[serde(default)]
    pub turn_step: Option<usize>,
}

impl SensorLog {
    /// Number of steps
    pub fn len(&self) -> usize {
        self.ground_truth.len()
    }

    /// True when the log holds no steps
    pub fn is_empty(&self) -> bool {
        self.ground_truth.is_empty()
    }

    /// Every stream must have one entry per ground-truth step
    pub fn validate(&self) -> SimResult<()> {
        let expected = self.ground_truth.len();
        for (stream, found) in [("z1", self.z1.len()), ("z2", self.z2.len())] {
            if found != expected {
                return Err(FusionError::LengthMismatch {
                    stream,
                    expected,
                    found,
                }
                .into());
            }
        }
        if expected == 0 {
            return Err(FusionError::EmptyInput.into());
        }
        Ok(())
    }

    /// Borrow the sensor side as estimator input
    pub fn streams(&self) -> SensorStreams<'_> {
        SensorStreams::new(&self.z1, &self.z2, self.sigma_1, self.sigma_2, self.dt)
    }

    /// Write the log as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;

        log::info!("Saved {} steps to {}", self.len(), path.display());
        Ok(())
    }

    /// Read and validate a log written by [`SensorLog::save`]
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let loaded: Self = serde_json::from_reader(reader)?;
        loaded.validate()?;

        log::debug!("Loaded {} steps from {}", loaded.len(), path.display());
        Ok(loaded)
    }
}
