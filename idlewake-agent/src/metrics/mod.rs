//! Load average sampling
//!
//! Reads the OS 1/5/15 minute load averages through sysinfo. On platforms
//! without load averages (Windows) the sample is all zeros.

use serde::Serialize;
use sysinfo::System;
use tracing::debug;

/// One reading of the 1, 5 and 15 minute load averages
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoadSample {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl LoadSample {
    /// Read the current load averages from the OS
    pub fn read() -> Self {
        let sample = if cfg!(unix) {
            let load = System::load_average();
            LoadSample {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            }
        } else {
            LoadSample::default()
        };

        debug!("Read load averages: {}", sample);
        sample
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.one, self.five, self.fifteen]
    }
}

impl From<[f64; 3]> for LoadSample {
    fn from(values: [f64; 3]) -> Self {
        let [one, five, fifteen] = values;
        LoadSample { one, five, fifteen }
    }
}

impl std::fmt::Display for LoadSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.one, self.five, self.fifteen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_load_averages() {
        let sample = LoadSample::read();
        assert!(sample.as_array().iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_display_matches_log_format() {
        let sample = LoadSample::from([0.5, 0.25, 1.0]);
        assert_eq!(sample.to_string(), "(0.50, 0.25, 1.00)");
    }
}
