use csv::Terminator;

use super::constants::MS_PER_S;
use super::descriptor::{
    ChannelRow, Color, FieldType, SamplingDescriptor, WaveformDescriptor, WaveformPoint,
};
use super::error::PemError;
use super::pem::PemHeader;

const PEM_FREQUENCY_LABEL: &str = "Base Frequency";
const PEM_TIME_UNITS: &str = "scaled";
const PEM_PRECISION: usize = 6;
const DEFAULT_ZERO_TIME: f64 = 0.25;
const RAMP_END: f64 = 0.25;

// Normalized transmitter turn-on curve for Crone systems
const TURN_ON_CURVE: [(f64, f64); 9] = [
    (0.0, 0.0),
    (0.02, 0.550671036),
    (0.04, 0.798103482),
    (0.06, 0.909282047),
    (0.08, 0.959237796),
    (0.1, 0.981684361),
    (0.14, 0.996302136),
    (0.16, 0.998338443),
    (0.20, 1.0),
];

const FULL_SCALE: f64 = 0.996094;
const PRIMARY_PULSE_NAME: &str = "PP";
const PRIMARY_PULSE_COLOR: Color = Color {
    red: 0.0,
    green: 0.299774,
    blue: FULL_SCALE,
};
// Written as is, not at channel precision
const PRIMARY_PULSE_COLOR_TEXT: [&str; 3] = ["0", "0.299774", "0.996094"];

/// Synthesize the Crone waveform: the fixed turn-on curve, flat top, then a linear
/// ramp-off of `ramp_time` ending at a quarter period.
pub fn synthesize_waveform(header: &PemHeader) -> WaveformDescriptor {
    let mut points: Vec<WaveformPoint> = TURN_ON_CURVE
        .iter()
        .map(|(time, current)| WaveformPoint::new(*time, *current))
        .collect();
    points.push(WaveformPoint::new(RAMP_END - header.ramp_time_s(), 1.0));
    points.push(WaveformPoint::new(RAMP_END, 0.0));
    points.push(WaveformPoint::new(0.5, 0.0));

    let zero_time = points
        .iter()
        .find(|p| p.current == 0.0)
        .map(|p| p.time)
        .unwrap_or(DEFAULT_ZERO_TIME);

    WaveformDescriptor {
        name: header.waveform_name(),
        frequency_label: PEM_FREQUENCY_LABEL,
        base_frequency: format!("{:.3}", header.base_frequency()),
        time_units: Some(PEM_TIME_UNITS),
        zero_time: format!("{:.*}", PEM_PRECISION, zero_time),
        points,
        time_precision: PEM_PRECISION,
    }
}

/// Color of a 1-indexed PEM channel. Channels fall into three linear bands.
pub fn band_color(channel: usize) -> Color {
    let c = channel as f64;
    if channel <= 12 {
        Color::new(FULL_SCALE, 0.144533 + (c - 1.0) * 0.0708, 0.652326 - (c - 1.0) * 0.0545)
    } else if channel <= 15 {
        Color::new(0.697813 - (c - 13.0) * 0.2988, FULL_SCALE, 0.0)
    } else {
        Color::new(0.0, FULL_SCALE - (c - 16.0) * 0.0988, 0.198521 + (c - 16.0) * 0.2988)
    }
}

/// Synthesize the channel sampling scheme from the PEM gate list.
///
/// The first two entries are the primary gate. Channels then read consecutive
/// boundaries: channel 1 uses entries 2 and 3, and every later channel starts at the
/// previous channel's end entry. A trailing "PP" row repeats the primary gate.
pub fn synthesize_sampling(header: &PemHeader) -> Result<SamplingDescriptor, PemError> {
    let windows = &header.time_windows;
    if windows.len() < 2 {
        return Err(PemError::TooFewTimeWindows(windows.len()));
    }
    let primary_time_gate = (windows[0] * MS_PER_S, windows[1] * MS_PER_S);

    let mut channels: Vec<ChannelRow> = (0..header.n_channels())
        .map(|i| {
            let start = if i == 0 { windows[2] } else { windows[i + 2] };
            let end = windows[i + 3];
            ChannelRow::new(
                format!("Ch{}", i + 1),
                start * MS_PER_S,
                end * MS_PER_S,
                band_color(i + 1),
            )
        })
        .collect();
    channels.push(
        ChannelRow::new(
            PRIMARY_PULSE_NAME.to_string(),
            primary_time_gate.0,
            primary_time_gate.1,
            PRIMARY_PULSE_COLOR,
        )
        .with_color_text(PRIMARY_PULSE_COLOR_TEXT),
    );

    Ok(SamplingDescriptor {
        name: header.sampling_name(),
        primary_time_gate,
        field_type: FieldType::Dbdt,
        channels,
        color_precision: PEM_PRECISION,
        terminator: Terminator::CRLF,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    fn header(time_windows: Vec<f64>) -> PemHeader {
        let mut header =
            PemHeader::parse("Surface Metric Cable 16.6667 1500 21 60\n").unwrap();
        header.time_windows = time_windows;
        header
    }

    #[test]
    fn test_waveform_shape() {
        let waveform = synthesize_waveform(&header(vec![]));
        assert_eq!(waveform.name, "Crone_15Hz");
        assert_eq!(waveform.base_frequency, "15.000");
        assert_eq!(waveform.points.len(), 12);
        assert!((waveform.points[9].time - 0.2485).abs() < 1.0e-12);
        // The curve starts at zero current, so that is the zero time
        assert_eq!(waveform.zero_time, "0.000000");

        let rows = waveform.rows();
        assert_eq!(rows[0], vec!["Waveform Name", "Crone_15Hz"]);
        assert_eq!(rows[1], vec!["Time Units", "scaled"]);
        assert_eq!(rows[2], vec!["Base Frequency", "15.000"]);
        assert_eq!(rows[3], vec!["Waveform Zero Time", "0.000000"]);
        assert_eq!(rows[4], vec!["Scaled Time", "Current"]);
        assert_eq!(rows[6], vec!["0.020000", "0.550671"]);
        assert_eq!(rows.len(), 17);
    }

    #[test]
    fn test_channel_pairing() {
        let sampling =
            synthesize_sampling(&header(vec![-2.0e-4, -1.0e-4, 1.0e-4, 2.0e-4, 4.0e-4, 8.0e-4]))
                .unwrap();
        assert_eq!(sampling.name, "Crone_15Hz_3ch");
        assert_eq!(sampling.field_type, FieldType::Dbdt);
        let rows = sampling.rows();
        assert_eq!(rows[1], vec!["Primary Time Gate", "-0.200", "-0.100"]);
        assert_eq!(
            rows[4],
            vec!["Ch1", "0.100", "0.200", "0.996094", "0.144533", "0.652326", "2"]
        );
        assert_eq!(rows[5][..3], ["Ch2", "0.200", "0.400"]);
        assert_eq!(rows[6][..3], ["Ch3", "0.400", "0.800"]);
        assert_eq!(
            rows[7],
            vec!["PP", "-0.200", "-0.100", "0", "0.299774", "0.996094", "2"]
        );
    }

    #[test]
    fn test_band_colors() {
        let first = band_color(1);
        assert_eq!(first, Color::new(0.996094, 0.144533, 0.652326));
        let thirteen = band_color(13);
        assert_eq!(thirteen, Color::new(0.697813, 0.996094, 0.0));
        let sixteen = band_color(16);
        assert_eq!(sixteen, Color::new(0.0, 0.996094, 0.198521));
        assert!((band_color(12).green - (0.144533 + 11.0 * 0.0708)).abs() < 1.0e-12);
    }

    #[test]
    fn test_too_few_windows() {
        assert!(matches!(
            synthesize_sampling(&header(vec![1.0e-4])),
            Err(PemError::TooFewTimeWindows(1))
        ));
        let primary_only = synthesize_sampling(&header(vec![-2.0e-4, -1.0e-4])).unwrap();
        assert_eq!(primary_only.channels.len(), 1);
        assert_eq!(primary_only.channels[0].name, "PP");
    }
}
