use csv::Terminator;
use fxhash::FxHashMap;

use super::constants::{MCG_DBDT_UNITS, MS_PER_S};
use super::descriptor::{
    ChannelRow, FieldType, SamplingDescriptor, WaveformDescriptor, WaveformPoint,
};
use super::error::McgError;
use super::sampling::channel_color;

const WAVEFORM_BLOCK: (&str, &str) = (
    "START OF STANDARD WAVEFORM",
    "END OF STANDARD WAVEFORM",
);
const CHANNEL_BLOCK: (&str, &str) = ("START OF CHANNEL TIMES", "END OF CHANNEL TIMES");
const BASE_FREQUENCY_DIRECTIVE: &str = "Base Frequency (Hz)";
const TIMING_MARK_DIRECTIVE: &str = "Waveform Timing Mark (s)";
const UNITS_DIRECTIVE: &str = "Units";
const UNIT_TYPES_DIRECTIVE: &str = "Unit Types";

const MCG_FREQUENCY_LABEL: &str = "Base Frequency";
const MCG_TIME_PRECISION: usize = 6;
const MCG_COLOR_PRECISION: usize = 2;
const HALF_CYCLE: f64 = 0.5;

/// Everything read out of an MCG export, before it is turned into descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct McgExport {
    /// Lowercased file stem, used to name both descriptors
    pub name: String,
    pub base_frequency: String,
    pub timing_mark: String,
    /// (time, current) in file units
    pub waveform: Vec<(f64, f64)>,
    /// (start, end) in seconds
    pub channel_times: Vec<(f64, f64)>,
    pub units: i32,
    pub unit_types: FxHashMap<i32, String>,
}

impl McgExport {
    /// Parse an MCG export. Every block and directive is required.
    pub fn parse(stem: &str, contents: &str) -> Result<Self, McgError> {
        let waveform = block_pairs(contents, WAVEFORM_BLOCK)?;
        let channel_times = block_pairs(contents, CHANNEL_BLOCK)?;
        let base_frequency = leading_number(directive_value(contents, BASE_FREQUENCY_DIRECTIVE)?)
            .ok_or(McgError::MissingDirective(BASE_FREQUENCY_DIRECTIVE))?
            .to_string();
        let timing_mark = leading_number(directive_value(contents, TIMING_MARK_DIRECTIVE)?)
            .ok_or(McgError::MissingDirective(TIMING_MARK_DIRECTIVE))?
            .to_string();
        let units = directive_value(contents, UNITS_DIRECTIVE)?
            .split_whitespace()
            .next()
            .ok_or(McgError::MissingDirective(UNITS_DIRECTIVE))?
            .parse::<i32>()?;
        let unit_types = parse_unit_types(directive_value(contents, UNIT_TYPES_DIRECTIVE)?)?;

        Ok(Self {
            name: stem.to_lowercase(),
            base_frequency,
            timing_mark,
            waveform,
            channel_times,
            units,
            unit_types,
        })
    }

    pub fn field_type(&self) -> Result<FieldType, McgError> {
        let unit = self
            .unit_types
            .get(&self.units)
            .ok_or(McgError::UnknownUnitIndex(self.units))?;
        if MCG_DBDT_UNITS.contains(&unit.as_str()) {
            Ok(FieldType::Dbdt)
        } else {
            Ok(FieldType::B)
        }
    }

    /// Waveform with time rescaled so the latest point lands on half a cycle
    pub fn waveform(&self) -> WaveformDescriptor {
        let max_time = self
            .waveform
            .iter()
            .map(|(time, _)| *time)
            .fold(f64::MIN, f64::max);
        let points = self
            .waveform
            .iter()
            .map(|(time, current)| {
                let scaled = if *time == 0.0 {
                    0.0
                } else {
                    HALF_CYCLE * time / max_time
                };
                WaveformPoint::new(scaled, *current)
            })
            .collect();

        WaveformDescriptor {
            name: self.name.clone(),
            frequency_label: MCG_FREQUENCY_LABEL,
            base_frequency: self.base_frequency.clone(),
            time_units: None,
            zero_time: self.timing_mark.clone(),
            points,
            time_precision: MCG_TIME_PRECISION,
        }
    }

    pub fn sampling(&self) -> Result<SamplingDescriptor, McgError> {
        let channels: Vec<ChannelRow> = self
            .channel_times
            .iter()
            .enumerate()
            .map(|(idx, (start, end))| {
                ChannelRow::new(
                    format!("Ch{}", idx + 1),
                    start * MS_PER_S,
                    end * MS_PER_S,
                    channel_color(idx),
                )
            })
            .collect();
        let primary_time_gate = channels
            .first()
            .map(|ch| (ch.start_ms, ch.end_ms))
            .ok_or(McgError::EmptyBlock(CHANNEL_BLOCK.0))?;

        Ok(SamplingDescriptor {
            name: format!("{}_{}ch", self.name, channels.len()),
            primary_time_gate,
            field_type: self.field_type()?,
            channels,
            color_precision: MCG_COLOR_PRECISION,
            terminator: Terminator::CRLF,
        })
    }
}

/// Data rows of a START/END block. The first line in the block is a column header.
fn block_lines<'a>(
    contents: &'a str,
    markers: (&'static str, &'static str),
) -> Result<Vec<&'a str>, McgError> {
    let (start_marker, end_marker) = markers;
    let start = contents
        .find(start_marker)
        .ok_or(McgError::MissingBlock(start_marker))?;
    let body = &contents[start + start_marker.len()..];
    let end = body.find(end_marker).ok_or(McgError::MissingBlock(end_marker))?;
    // Skip the remainder of the marker line, then the column header
    Ok(body[..end]
        .lines()
        .skip(2)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect())
}

/// The 2nd and 3rd columns of every row of a block
fn block_pairs(
    contents: &str,
    markers: (&'static str, &'static str),
) -> Result<Vec<(f64, f64)>, McgError> {
    let pairs = block_lines(contents, markers)?
        .into_iter()
        .map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                return Err(McgError::BadRow(markers.0, line.to_string()));
            }
            Ok((tokens[1].parse::<f64>()?, tokens[2].parse::<f64>()?))
        })
        .collect::<Result<Vec<_>, McgError>>()?;
    if pairs.is_empty() {
        return Err(McgError::EmptyBlock(markers.0));
    }
    Ok(pairs)
}

/// Text following `<label> :` on the first line carrying that directive
fn directive_value<'a>(contents: &'a str, label: &'static str) -> Result<&'a str, McgError> {
    contents
        .lines()
        .find_map(|line| {
            let (_, rest) = line.split_once(label)?;
            rest.trim_start().strip_prefix(':').map(str::trim)
        })
        .ok_or(McgError::MissingDirective(label))
}

fn leading_number(value: &str) -> Option<&str> {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

/// Parse `1=nT, 2=pT/s, ...`. Anything before the first `<digits>=` is ignored.
fn parse_unit_types(value: &str) -> Result<FxHashMap<i32, String>, McgError> {
    let start = value
        .char_indices()
        .find(|(idx, c)| {
            c.is_ascii_digit()
                && value[*idx..]
                    .trim_start_matches(|d: char| d.is_ascii_digit())
                    .starts_with('=')
        })
        .map(|(idx, _)| idx)
        .ok_or_else(|| McgError::BadUnitType(value.to_string()))?;

    let mut map = FxHashMap::default();
    for entry in value[start..].split(',') {
        let (index, unit) = entry
            .trim()
            .split_once('=')
            .ok_or_else(|| McgError::BadUnitType(entry.to_string()))?;
        map.insert(index.trim().parse::<i32>()?, unit.trim().to_string());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    const MCG_SAMPLE: &str = "\
Survey export
Base Frequency (Hz) : 30.000
Waveform Timing Mark (s) : 0.0051
Units : 2
Unit Types : 1=nT, 2=pT/s, 3=uV
START OF STANDARD WAVEFORM
Index Time Current
1 0 0.0
2 0.005 1.0

3 0.01 0.0
END OF STANDARD WAVEFORM
START OF CHANNEL TIMES
Channel Start End
1 0.0001 0.0002
2 0.0002 0.0004
END OF CHANNEL TIMES
";

    #[test]
    fn test_parse() {
        let export = McgExport::parse("Line_100N", MCG_SAMPLE).unwrap();
        assert_eq!(export.name, "line_100n");
        assert_eq!(export.base_frequency, "30.000");
        assert_eq!(export.timing_mark, "0.0051");
        assert_eq!(export.units, 2);
        assert_eq!(export.unit_types.get(&1).map(String::as_str), Some("nT"));
        assert_eq!(export.unit_types.get(&3).map(String::as_str), Some("uV"));
        assert_eq!(export.waveform.len(), 3);
        assert_eq!(export.channel_times, vec![(0.0001, 0.0002), (0.0002, 0.0004)]);
        assert_eq!(export.field_type().unwrap(), FieldType::Dbdt);
    }

    #[test]
    fn test_waveform_scaling() {
        let export = McgExport::parse("Line_100N", MCG_SAMPLE).unwrap();
        let waveform = export.waveform();
        assert_eq!(waveform.points[0].time, 0.0);
        assert_eq!(waveform.points[1].time, 0.25);
        assert_eq!(waveform.points[2].time, 0.5);
        let rows = waveform.rows();
        assert_eq!(rows[0], vec!["Waveform Name", "line_100n"]);
        assert_eq!(rows[1], vec!["Base Frequency", "30.000"]);
        assert_eq!(rows[2], vec!["Waveform Zero Time", "0.0051"]);
        assert_eq!(rows[6], vec!["0.500000", "0.000000"]);
    }

    #[test]
    fn test_sampling() {
        let export = McgExport::parse("Line_100N", MCG_SAMPLE).unwrap();
        let sampling = export.sampling().unwrap();
        assert_eq!(sampling.name, "line_100n_2ch");
        let rows = sampling.rows();
        assert_eq!(rows[1], vec!["Primary Time Gate", "0.100", "0.200"]);
        assert_eq!(rows[2], vec!["Field Type", "dbdt"]);
        assert_eq!(rows[4], vec!["Ch1", "0.100", "0.200", "0.25", "0.75", "0.50", "2"]);
        assert_eq!(rows[5], vec!["Ch2", "0.200", "0.400", "0.30", "0.70", "0.50", "2"]);
    }

    #[test]
    fn test_b_field_units() {
        let contents = MCG_SAMPLE.replace("Units : 2", "Units : 1");
        let export = McgExport::parse("a", &contents).unwrap();
        assert_eq!(export.field_type().unwrap(), FieldType::B);
        let contents = MCG_SAMPLE.replace("Units : 2", "Units : 9");
        let export = McgExport::parse("a", &contents).unwrap();
        assert!(matches!(
            export.sampling(),
            Err(McgError::UnknownUnitIndex(9))
        ));
    }

    #[test]
    fn test_missing_pieces_are_fatal() {
        let cases = [
            ("END OF STANDARD WAVEFORM", McgError::MissingBlock("END OF STANDARD WAVEFORM")),
            ("START OF CHANNEL TIMES", McgError::MissingBlock("START OF CHANNEL TIMES")),
            ("Base Frequency (Hz)", McgError::MissingDirective("Base Frequency (Hz)")),
            ("Waveform Timing Mark (s)", McgError::MissingDirective("Waveform Timing Mark (s)")),
            ("Units : 2", McgError::MissingDirective("Units")),
            ("Unit Types", McgError::MissingDirective("Unit Types")),
        ];
        for (removed, expected) in cases {
            let contents = MCG_SAMPLE.replace(removed, "");
            let err = McgExport::parse("a", &contents).unwrap_err();
            assert_eq!(err.to_string(), expected.to_string(), "removing {removed:?}");
        }
    }

    #[test]
    fn test_short_row() {
        let contents = MCG_SAMPLE.replace("2 0.0002 0.0004", "2 0.0002");
        assert!(matches!(
            McgExport::parse("a", &contents),
            Err(McgError::BadRow(_, _))
        ));
    }
}
