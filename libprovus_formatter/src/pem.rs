use super::constants::{MS_PER_S, US_PER_S};
use super::error::PemError;

pub const SURVEY_FIELD_COUNT: usize = 7;
const SURVEY_MARKERS: [&str; 2] = ["Metric", "Cable"];
const SECTION_END_MARKER: char = '$';
/// Gates in the time window list which are not channels (primary gate start/end plus the final boundary)
const NON_CHANNEL_WINDOWS: usize = 3;

/// The positional survey parameters line of a PEM file
#[derive(Debug, Clone, PartialEq)]
pub struct PemSurveyParams {
    pub survey_mode: String,
    pub units: String,
    pub sync_type: String,
    /// Milliseconds
    pub time_base: f64,
    /// Microseconds
    pub ramp_time: i64,
    pub n_gates: i64,
    pub n_readings: i64,
}

impl PemSurveyParams {
    fn from_line(line: &str) -> Result<Self, PemError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != SURVEY_FIELD_COUNT {
            return Err(PemError::BadSurveyLine(fields.len()));
        }
        Ok(Self {
            survey_mode: fields[0].to_string(),
            units: fields[1].to_string(),
            sync_type: fields[2].to_string(),
            time_base: fields[3].parse()?,
            ramp_time: fields[4].parse()?,
            n_gates: fields[5].parse()?,
            n_readings: fields[6].parse()?,
        })
    }
}

/// The parts of a PEM file we need to synthesize the Provus descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct PemHeader {
    pub survey: PemSurveyParams,
    /// Gate boundaries in seconds, in file order
    pub time_windows: Vec<f64>,
}

impl PemHeader {
    /// Parse the full text of a PEM file.
    ///
    /// The survey parameters line is required; everything else is derived from it.
    pub fn parse(contents: &str) -> Result<Self, PemError> {
        let mut survey: Option<PemSurveyParams> = None;
        let mut time_windows: Vec<f64> = Vec::new();
        let mut in_window_section = false;

        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if survey.is_none() {
                if SURVEY_MARKERS.iter().all(|m| line.contains(m)) {
                    survey = Some(PemSurveyParams::from_line(line)?);
                }
                continue;
            }

            if !in_window_section && line.starts_with('-') && line.to_lowercase().contains('e') {
                in_window_section = true;
            }
            if !in_window_section {
                continue;
            }
            if line.contains(SECTION_END_MARKER) {
                break;
            }

            // A line with any unreadable value contributes nothing
            let values: Result<Vec<f64>, _> = line
                .split_whitespace()
                .filter(|token| token.to_lowercase().contains('e'))
                .map(str::parse::<f64>)
                .collect();
            match values {
                Ok(values) => time_windows.extend(values),
                Err(_) => spdlog::warn!("Skipping unreadable PEM time window line: {line:?}"),
            }
        }

        let survey = survey.ok_or(PemError::MissingSurveyLine)?;
        Ok(Self {
            survey,
            time_windows,
        })
    }

    /// The time base is a quarter period
    pub fn base_frequency(&self) -> f64 {
        1.0 / (4.0 * self.survey.time_base / MS_PER_S)
    }

    pub fn ramp_time_s(&self) -> f64 {
        self.survey.ramp_time as f64 / US_PER_S
    }

    pub fn n_channels(&self) -> usize {
        self.time_windows.len().saturating_sub(NON_CHANNEL_WINDOWS)
    }

    pub fn waveform_name(&self) -> String {
        format!("Crone_{:.0}Hz", self.base_frequency())
    }

    pub fn sampling_name(&self) -> String {
        format!("{}_{}ch", self.waveform_name(), self.n_channels())
    }
}
