use super::constants::{UNDEFINED, UTEM_TAG};
use super::descriptor::{WaveformDescriptor, WaveformPoint};
use super::error::WaveformError;
use super::header::HeaderRecord;

const TEM_FREQUENCY_LABEL: &str = "BaseFrequency";
const TEM_TIME_PRECISION: usize = 4;
const HALF_DUTY: f64 = 50.0;
const DUTY_TOLERANCE: f64 = 1.0e-3;

const BIPOLAR_POINTS: [(f64, f64); 3] = [(0.0, -1.0), (0.0001, 1.0), (0.5, 1.0)];
const HALF_DUTY_POINTS: [(f64, f64); 5] = [
    (0.0, 0.0),
    (0.0001, 1.0),
    (0.25, 1.0),
    (0.2501, 0.0),
    (0.5, 0.0),
];

/// The canonical waveform families a TEM header can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformFamily {
    Utem,
    HalfDutySquare,
    Square,
}

impl WaveformFamily {
    /// Pick the family from the transmitter tag and duty cycle.
    ///
    /// UTEM always wins. Otherwise only an undefined transmitter tag is supported,
    /// and the duty cycle decides between the 50% and 100% square waves. An
    /// unparsable duty cycle counts as 100%.
    pub fn classify(tx_waveform: &str, duty_cycle: &str) -> Result<Self, WaveformError> {
        if tx_waveform == UTEM_TAG {
            return Ok(Self::Utem);
        }
        if tx_waveform != UNDEFINED {
            return Err(WaveformError::UnsupportedConfiguration {
                tx_waveform: tx_waveform.to_string(),
                duty_cycle: duty_cycle.to_string(),
            });
        }
        match duty_cycle.trim().parse::<f64>() {
            Ok(duty) if (duty - HALF_DUTY).abs() < DUTY_TOLERANCE => Ok(Self::HalfDutySquare),
            _ => Ok(Self::Square),
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Utem => "UTEM",
            Self::HalfDutySquare => "50_Square",
            Self::Square => "Square",
        }
    }

    pub fn zero_time(&self) -> &'static str {
        match self {
            Self::HalfDutySquare => "0.2501",
            Self::Utem | Self::Square => "0.0000",
        }
    }

    pub fn points(&self) -> &'static [(f64, f64)] {
        match self {
            Self::HalfDutySquare => &HALF_DUTY_POINTS,
            Self::Utem | Self::Square => &BIPOLAR_POINTS,
        }
    }
}

/// Build the waveform table for a scanned TEM header.
///
/// Returns `Ok(None)` when the header has no base frequency: there is nothing to
/// name the waveform after, and that is not an error.
pub fn build_waveform(record: &HeaderRecord) -> Result<Option<WaveformDescriptor>, WaveformError> {
    let Some(base_frequency) = record.base_frequency.as_ref() else {
        return Ok(None);
    };
    let family = WaveformFamily::classify(&record.tx_waveform, &record.duty_cycle)?;
    Ok(Some(WaveformDescriptor {
        name: format!("{}_{}", family.prefix(), base_frequency),
        frequency_label: TEM_FREQUENCY_LABEL,
        base_frequency: base_frequency.clone(),
        time_units: None,
        zero_time: family.zero_time().to_string(),
        points: family
            .points()
            .iter()
            .map(|(time, current)| WaveformPoint::new(*time, *current))
            .collect(),
        time_precision: TEM_TIME_PRECISION,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, WriteOutcome};

    fn record(base_frequency: Option<&str>, tx_waveform: &str, duty_cycle: &str) -> HeaderRecord {
        let mut record = HeaderRecord::parse("");
        record.base_frequency = base_frequency.map(String::from);
        record.tx_waveform = tx_waveform.to_string();
        record.duty_cycle = duty_cycle.to_string();
        record
    }

    #[test]
    fn test_naming() {
        let half = build_waveform(&record(Some("5.000"), "Undefined", "50.000"))
            .unwrap()
            .unwrap();
        assert_eq!(half.name, "50_Square_5.000");
        let full = build_waveform(&record(Some("5.000"), "Undefined", "100"))
            .unwrap()
            .unwrap();
        assert_eq!(full.name, "Square_5.000");
        let utem = build_waveform(&record(Some("30.000"), "UTEM", "50"))
            .unwrap()
            .unwrap();
        assert_eq!(utem.name, "UTEM_30.000");
        let undefined_duty = build_waveform(&record(Some("5.000"), "Undefined", "Undefined"))
            .unwrap()
            .unwrap();
        assert_eq!(undefined_duty.name, "Square_5.000");
    }

    #[test]
    fn test_half_duty_shape() {
        let half = build_waveform(&record(Some("5.000"), "Undefined", "50"))
            .unwrap()
            .unwrap();
        assert_eq!(half.zero_time, "0.2501");
        assert_eq!(half.points.len(), 5);
        let rows = half.rows();
        assert_eq!(rows[1], vec!["BaseFrequency", "5.000"]);
        assert_eq!(rows[7], vec!["0.2501", "0.000000"]);
    }

    #[test]
    fn test_missing_frequency_is_not_an_error() {
        assert!(build_waveform(&record(None, "Undefined", "50"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unsupported_waveform() {
        let result = build_waveform(&record(Some("5.000"), "Triangle", "50"));
        assert!(matches!(
            result,
            Err(WaveformError::UnsupportedConfiguration { .. })
        ));
    }

    #[test]
    fn test_idempotent_write() {
        let dir = tempfile::tempdir().unwrap();
        let source = record(Some("5.000"), "Undefined", "50");
        let first = build_waveform(&source).unwrap().unwrap();
        let second = build_waveform(&source).unwrap().unwrap();
        assert_eq!(first.encode().unwrap(), second.encode().unwrap());
        let (_, outcome) = first.write_to(dir.path()).unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        let (_, outcome) = second.write_to(dir.path()).unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
    }
}
