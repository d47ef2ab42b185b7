use std::path::PathBuf;
use thiserror::Error;

use super::batch_status::BatchStatus;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DirectiveError {
    #[error("Directive {0} has no values")]
    MissingValues(&'static str),
    #[error("Directive {0} contains a value which is not a number: {1:?}")]
    BadValue(&'static str, String),
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Descriptor failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Descriptor failed to encode CSV: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Descriptor name {0:?} is not a plain file name")]
    BadName(String),
}

#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("Unhandled waveform configuration -- TX: {tx_waveform}, Duty: {duty_cycle}")]
    UnsupportedConfiguration {
        tx_waveform: String,
        duty_cycle: String,
    },
}

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Sampling scheme requires at least one time window")]
    EmptyTimeWindows,
    #[error("Sampling scheme was given {0} start times but {1} end times")]
    MismatchedTimeWindows(usize, usize),
    #[error("Sampling scheme could not read a frequency from waveform name {0}")]
    BadWaveformName(String),
}

#[derive(Debug, Error)]
pub enum PemError {
    #[error("Could not find the PEM survey parameters line (Metric ... Cable)")]
    MissingSurveyLine,
    #[error("PEM survey parameters line has {0} fields; expected {exp}", exp=crate::pem::SURVEY_FIELD_COUNT)]
    BadSurveyLine(usize),
    #[error("PEM failed to parse an integer survey parameter: {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error("PEM failed to parse a decimal survey parameter: {0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("PEM time window section holds {0} values; at least 2 are needed for the primary time gate")]
    TooFewTimeWindows(usize),
}

#[derive(Debug, Error)]
pub enum McgError {
    #[error("MCG file is missing the {0} block")]
    MissingBlock(&'static str),
    #[error("MCG file is missing the {0} directive")]
    MissingDirective(&'static str),
    #[error("MCG {0} block has a row with fewer than 3 columns: {1:?}")]
    BadRow(&'static str, String),
    #[error("MCG {0} block has no data rows")]
    EmptyBlock(&'static str),
    #[error("MCG Unit Types has a malformed entry: {0:?}")]
    BadUnitType(String),
    #[error("MCG Units index {0} is not listed in Unit Types")]
    UnknownUnitIndex(i32),
    #[error("MCG failed to parse an integer: {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error("MCG failed to parse a number: {0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),
}

#[derive(Debug, Error)]
pub enum HeaderRewriteError {
    #[error("HeaderRewrite failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not find a base frequency line in {0:?}")]
    NoFrequencyLine(PathBuf),
}

#[derive(Debug, Error)]
pub enum ProjectFileError {
    #[error("ProjectFile failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Data file {0:?} is not inside the project root directory")]
    OutsideRoot(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor does not know how to handle file {0:?}")]
    UnknownFileType(PathBuf),
    #[error("Processor failed due to Descriptor error: {0}")]
    DescriptorError(#[from] DescriptorError),
    #[error("Processor failed due to PEM error: {0}")]
    PemError(#[from] PemError),
    #[error("Processor failed due to MCG error: {0}")]
    McgError(#[from] McgError),
    #[error("Processor failed due to HeaderRewrite error: {0}")]
    HeaderRewriteError(#[from] HeaderRewriteError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<BatchStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
