use csv::Terminator;

use super::constants::{
    TEM_BLUE, TEM_COLOR_STEP, TEM_GREEN_START, TEM_RED_START, US_PER_MS, UTEM_TAG,
};
use super::descriptor::{ChannelRow, Color, FieldType, SamplingDescriptor};
use super::error::SamplingError;
use super::header::HeaderRecord;

const TEM_COLOR_PRECISION: usize = 6;
const MICROSECOND_MARKERS: [&str; 3] = ["TIMESSTART(us)", "TIMES(us)", "TIMESEND(us)"];

/// Gradient color for a zero-based channel index. Not clamped: with enough channels
/// green goes negative and red exceeds 1.
pub fn channel_color(index: usize) -> Color {
    let step = index as f64 * TEM_COLOR_STEP;
    Color::new(TEM_RED_START + step, TEM_GREEN_START - step, TEM_BLUE)
}

/// Check the raw header for microsecond time directives.
///
/// This is evaluated independently of the unit handling done while resolving
/// TIMES/TIMESWIDTH, so a `/TIMES(us)=` header gets divided by 1000 twice.
pub fn has_microsecond_times(lines: &[String]) -> bool {
    lines
        .iter()
        .any(|line| MICROSECOND_MARKERS.iter().any(|m| line.contains(m)))
}

/// Derive the sampling name from the waveform name, normalizing the frequency to 3 decimals
pub fn sampling_name(waveform_name: &str, n_channels: usize) -> Result<String, SamplingError> {
    let base = if waveform_name.contains(UTEM_TAG) {
        waveform_name.to_string()
    } else {
        let parts: Vec<&str> = waveform_name.split('_').collect();
        let (prefix, freq_part) = if parts[0] == "50" {
            ("50_Square", parts.get(2))
        } else {
            ("Square", parts.get(1))
        };
        let freq = freq_part
            .and_then(|f| f.parse::<f64>().ok())
            .ok_or_else(|| SamplingError::BadWaveformName(waveform_name.to_string()))?;
        format!("{prefix}_{freq:.3}")
    };
    Ok(format!("{base}_{n_channels}ch"))
}

/// Build the channel sampling scheme for a TEM header whose waveform was named `waveform_name`
pub fn build_sampling(
    record: &HeaderRecord,
    waveform_name: &str,
) -> Result<SamplingDescriptor, SamplingError> {
    let n_channels = record.num_channels();
    if n_channels == 0 {
        return Err(SamplingError::EmptyTimeWindows);
    }
    if record.times_start.len() != n_channels {
        return Err(SamplingError::MismatchedTimeWindows(
            record.times_start.len(),
            n_channels,
        ));
    }

    let (mut starts, mut ends) = (record.times_start.clone(), record.times_end.clone());
    if has_microsecond_times(&record.raw_header_lines) {
        spdlog::info!("Detected microsecond time units; converting to milliseconds");
        starts.iter_mut().for_each(|t| *t /= US_PER_MS);
        ends.iter_mut().for_each(|t| *t /= US_PER_MS);
    }

    let channels = starts
        .iter()
        .zip(ends.iter())
        .enumerate()
        .map(|(idx, (start, end))| {
            ChannelRow::new(format!("Ch{}", idx + 1), *start, *end, channel_color(idx))
        })
        .collect();

    Ok(SamplingDescriptor {
        name: sampling_name(waveform_name, n_channels)?,
        primary_time_gate: (starts[0], ends[0]),
        field_type: FieldType::from_units(record.units.as_deref()),
        channels,
        color_precision: TEM_COLOR_PRECISION,
        terminator: Terminator::Any(b'\n'),
    })
}
