use csv::{Terminator, WriterBuilder};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use super::constants::{B_FIELD_UNITS, CSV_EXTENSION, DBDT_UNITS, LINE_WEIGHT};
use super::error::DescriptorError;

const CHANNEL_HEADER: [&str; 7] = [
    "Channel Name",
    "ChStart",
    "ChEnd",
    "Red",
    "Green",
    "Blue",
    "LineWt",
];
const TIME_PRECISION_MS: usize = 3;
const CURRENT_PRECISION: usize = 6;

/// RGB triple used for channel plotting. Components are intentionally not clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// Classification of the measured quantity of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    B,
    Dbdt,
}

impl FieldType {
    /// Classify a TEM units string. Unknown (or missing) units are treated as B.
    pub fn from_units(units: Option<&str>) -> Self {
        match units {
            Some(u) if DBDT_UNITS.contains(&u) => Self::Dbdt,
            Some(u) if B_FIELD_UNITS.contains(&u) => Self::B,
            _ => Self::B,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B => "b",
            Self::Dbdt => "dbdt",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of writing a descriptor to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Unchanged,
}

/// Anything that can be rendered as one of the Provus option tables.
///
/// Implementors only describe their rows; encoding and the content-match
/// short-circuit on write are shared.
pub trait Descriptor {
    /// Name of the descriptor, which is also the file stem
    fn name(&self) -> &str;

    /// The rows of the table, in output order
    fn rows(&self) -> Vec<Vec<String>>;

    fn file_name(&self) -> String {
        format!("{}.{}", self.name(), CSV_EXTENSION)
    }

    fn terminator(&self) -> Terminator {
        Terminator::CRLF
    }

    /// Encode the rows as CSV. Rows have varying widths, so the writer is flexible.
    fn encode(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .terminator(self.terminator())
            .from_writer(vec![]);
        for row in self.rows() {
            writer.write_record(&row)?;
        }
        writer
            .into_inner()
            .map_err(|e| DescriptorError::IOError(e.into_error()))
    }

    /// Write the descriptor into a directory, creating it if needed.
    ///
    /// The name must be a plain file name so the file lands directly in `directory`.
    /// If a file with byte-identical content already exists nothing is written.
    fn write_to(&self, directory: &Path) -> Result<(PathBuf, WriteOutcome), DescriptorError> {
        check_name(self.name())?;
        let contents = self.encode()?;
        std::fs::create_dir_all(directory)?;
        write_if_changed(&directory.join(self.file_name()), &contents)
    }
}

/// Reject names that would resolve outside of the output directory
pub fn check_name(name: &str) -> Result<(), DescriptorError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(DescriptorError::BadName(name.to_string()));
    }
    Ok(())
}

/// Write contents to path unless the file already holds exactly these bytes.
/// The parent directory must exist.
pub fn write_if_changed(
    path: &Path,
    contents: &[u8],
) -> Result<(PathBuf, WriteOutcome), DescriptorError> {
    if path.exists() && std::fs::read(path)? == contents {
        spdlog::info!("{} is up to date, skipping write", path.display());
        return Ok((path.to_path_buf(), WriteOutcome::Unchanged));
    }
    std::fs::write(path, contents)?;
    spdlog::info!("Wrote {}", path.display());
    Ok((path.to_path_buf(), WriteOutcome::Created))
}

/// A single control point of the half-cycle waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformPoint {
    pub time: f64,
    pub current: f64,
}

impl WaveformPoint {
    pub fn new(time: f64, current: f64) -> Self {
        Self { time, current }
    }
}

/// Half-cycle waveform table over the scaled time domain [0, 0.5]
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformDescriptor {
    pub name: String,
    /// Row label for the frequency. TEM tables historically use "BaseFrequency".
    pub frequency_label: &'static str,
    pub base_frequency: String,
    pub time_units: Option<&'static str>,
    pub zero_time: String,
    pub points: Vec<WaveformPoint>,
    pub time_precision: usize,
}

impl WaveformDescriptor {
    /// Mirror the half cycle into a full cycle: point(t + 0.5) = -point(t)
    pub fn full_cycle(&self) -> Vec<WaveformPoint> {
        let mut cycle = self.points.clone();
        cycle.extend(
            self.points
                .iter()
                .map(|p| WaveformPoint::new(p.time + 0.5, -p.current)),
        );
        cycle
    }
}

impl Descriptor for WaveformDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![vec![String::from("Waveform Name"), self.name.clone()]];
        if let Some(units) = self.time_units {
            rows.push(vec![String::from("Time Units"), units.to_string()]);
        }
        rows.push(vec![
            self.frequency_label.to_string(),
            self.base_frequency.clone(),
        ]);
        rows.push(vec![
            String::from("Waveform Zero Time"),
            self.zero_time.clone(),
        ]);
        rows.push(vec![String::from("Scaled Time"), String::from("Current")]);
        for point in self.points.iter() {
            rows.push(vec![
                format!("{:.*}", self.time_precision, point.time),
                format!("{:.*}", CURRENT_PRECISION, point.current),
            ]);
        }
        rows
    }
}

/// One row of a sampling scheme
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRow {
    pub name: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub color: Color,
    /// Written in place of the formatted color when set
    pub color_text: Option<[&'static str; 3]>,
}

impl ChannelRow {
    pub fn new(name: String, start_ms: f64, end_ms: f64, color: Color) -> Self {
        Self {
            name,
            start_ms,
            end_ms,
            color,
            color_text: None,
        }
    }

    pub fn with_color_text(mut self, text: [&'static str; 3]) -> Self {
        self.color_text = Some(text);
        self
    }

    fn color_fields(&self, precision: usize) -> [String; 3] {
        match self.color_text {
            Some(text) => text.map(String::from),
            None => [self.color.red, self.color.green, self.color.blue]
                .map(|c| format!("{:.*}", precision, c)),
        }
    }
}

/// Channel sampling scheme table. All times are in milliseconds.
#[derive(Debug, Clone)]
pub struct SamplingDescriptor {
    pub name: String,
    pub primary_time_gate: (f64, f64),
    pub field_type: FieldType,
    pub channels: Vec<ChannelRow>,
    pub color_precision: usize,
    pub terminator: Terminator,
}

impl Descriptor for SamplingDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminator(&self) -> Terminator {
        self.terminator
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let (gate_start, gate_end) = self.primary_time_gate;
        let mut rows = vec![
            vec![String::from("Sampling Name"), self.name.clone()],
            vec![
                String::from("Primary Time Gate"),
                format!("{:.*}", TIME_PRECISION_MS, gate_start),
                format!("{:.*}", TIME_PRECISION_MS, gate_end),
            ],
            vec![String::from("Field Type"), self.field_type.to_string()],
            CHANNEL_HEADER.iter().map(|s| s.to_string()).collect(),
        ];
        for channel in self.channels.iter() {
            let mut row = vec![
                channel.name.clone(),
                format!("{:.*}", TIME_PRECISION_MS, channel.start_ms),
                format!("{:.*}", TIME_PRECISION_MS, channel.end_ms),
            ];
            row.extend(channel.color_fields(self.color_precision));
            row.push(LINE_WEIGHT.to_string());
            rows.push(row);
        }
        rows
    }
}
