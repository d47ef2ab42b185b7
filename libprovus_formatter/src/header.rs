use super::constants::{UNDEFINED, UTEM_TAG};
use super::error::DirectiveError;
use super::time_window::{TimeUnit, TimeWindowResolver};

/// Multi-value time directives. These are matched before any generic key=value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    TimesStart,
    TimesEnd,
    Times(TimeUnit),
    TimesWidth(TimeUnit),
}

impl Directive {
    fn label(&self) -> &'static str {
        match self {
            Self::TimesStart => "TIMESSTART",
            Self::TimesEnd => "TIMESEND",
            Self::Times(_) => "TIMES",
            Self::TimesWidth(_) => "TIMESWIDTH",
        }
    }
}

/// Directive markers in priority order, upper-case (matching is case-insensitive)
const DIRECTIVES: [(&str, Directive); 6] = [
    ("/TIMESSTART", Directive::TimesStart),
    ("/TIMESEND", Directive::TimesEnd),
    ("/TIMES(MS)=", Directive::Times(TimeUnit::Milliseconds)),
    ("/TIMES(US)=", Directive::Times(TimeUnit::Microseconds)),
    ("/TIMESWIDTH(MS)=", Directive::TimesWidth(TimeUnit::Milliseconds)),
    ("/TIMESWIDTH(US)=", Directive::TimesWidth(TimeUnit::Microseconds)),
];

/// Scalar header fields recognized in generic tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    BaseFrequency,
    Units,
    DutyCycle,
    TxWaveform,
    SystemInfo,
    SurveyConfig,
    DataType,
    Offtime,
}

const FIELD_SYNONYMS: [(&str, HeaderField); 14] = [
    ("BFREQ", HeaderField::BaseFrequency),
    ("BASEFREQ", HeaderField::BaseFrequency),
    ("BASEFREQUENCY", HeaderField::BaseFrequency),
    ("UNITS", HeaderField::Units),
    ("DUTYCYCLE", HeaderField::DutyCycle),
    ("DUTY", HeaderField::DutyCycle),
    ("TXWAVEFORM", HeaderField::TxWaveform),
    ("INSTRUMENT", HeaderField::SystemInfo),
    ("SYSTEM", HeaderField::SystemInfo),
    ("PRIMARYREMOVED", HeaderField::SystemInfo),
    ("CONFIG", HeaderField::SurveyConfig),
    ("CONFIGURATION", HeaderField::SurveyConfig),
    ("DATATYPE", HeaderField::DataType),
    ("OFFTIME", HeaderField::Offtime),
];

fn lookup_field(key: &str) -> Option<HeaderField> {
    FIELD_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, field)| *field)
}

/// Everything we know about a TEM file after scanning its header.
///
/// Scalar values are kept as display strings: numeric values are normalized
/// (frequency to 3 decimals, duty cycle to a whole percent) and anything that
/// does not parse is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub base_frequency: Option<String>,
    pub units: Option<String>,
    pub duty_cycle: String,
    pub tx_waveform: String,
    pub system_info: Option<String>,
    pub survey_config: Option<String>,
    pub data_type: Option<String>,
    pub offtime: Option<String>,
    /// Window starts in ms
    pub times_start: Vec<f64>,
    /// Window ends in ms
    pub times_end: Vec<f64>,
    /// Non-blank lines of the source, trimmed, in original order
    pub raw_header_lines: Vec<String>,
    /// Recoverable problems found while scanning
    pub warnings: Vec<String>,
}

impl HeaderRecord {
    /// Scan the full text of a TEM file
    pub fn parse(contents: &str) -> Self {
        let mut scanner = HeaderScanner::default();
        for line in contents.lines() {
            scanner.scan_line(line);
        }
        scanner.finish()
    }

    pub fn num_channels(&self) -> usize {
        self.times_end.len()
    }
}

/// Line-by-line state of a TEM header scan
#[derive(Debug, Default)]
pub struct HeaderScanner {
    base_frequency: Option<String>,
    units: Option<String>,
    duty_cycle: Option<String>,
    tx_waveform: Option<String>,
    system_info: Option<String>,
    survey_config: Option<String>,
    data_type: Option<String>,
    offtime: Option<String>,
    windows: TimeWindowResolver,
    raw_header_lines: Vec<String>,
    warnings: Vec<String>,
}

impl HeaderScanner {
    pub fn scan_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.raw_header_lines.push(line.to_string());

        if let Some((directive, values)) = match_directive(line) {
            match parse_directive_values(directive, values) {
                Ok(parsed) => self.apply_directive(directive, parsed),
                Err(e) => self.warn(format!("Could not parse line {line:?}: {e}")),
            }
        } else {
            self.scan_tokens(line);
        }
    }

    fn apply_directive(&mut self, directive: Directive, values: Vec<f64>) {
        spdlog::info!("Found {}: {:?}", directive.label(), values);
        match directive {
            Directive::TimesStart => self.windows.set_times_start(values),
            Directive::TimesEnd => self.windows.set_times_end(values),
            Directive::Times(unit) => self.windows.set_times(values, unit),
            Directive::TimesWidth(_) => self.windows.set_times_width(values),
        }
    }

    fn scan_tokens(&mut self, line: &str) {
        for token in line.split_whitespace() {
            if token == "&" {
                continue;
            }
            let Some((key, value)) = token.split_once('=').or_else(|| token.split_once(':'))
            else {
                continue;
            };
            let Some(field) = lookup_field(&key.to_ascii_uppercase()) else {
                continue;
            };
            let value = clean_value(value).to_string();
            match field {
                HeaderField::BaseFrequency => {
                    let freq = value
                        .parse::<f64>()
                        .map(|f| format!("{f:.3}"))
                        .unwrap_or(value);
                    spdlog::info!("Base Frequency: {freq}");
                    self.base_frequency = Some(freq);
                }
                HeaderField::Units => {
                    spdlog::info!("Units: {value}");
                    self.units = Some(value);
                }
                HeaderField::DutyCycle => {
                    let duty = value
                        .parse::<f64>()
                        .map(|d| format!("{d:.0}"))
                        .unwrap_or(value);
                    spdlog::info!("Duty Cycle: {duty}");
                    self.duty_cycle = Some(duty);
                }
                HeaderField::TxWaveform => {
                    spdlog::info!("Tx Waveform: {value}");
                    self.tx_waveform = Some(value);
                }
                HeaderField::SystemInfo => self.system_info = Some(value),
                HeaderField::SurveyConfig => self.survey_config = Some(value),
                HeaderField::DataType => self.data_type = Some(value),
                HeaderField::Offtime => self.offtime = Some(value),
            }
        }
    }

    fn warn(&mut self, message: String) {
        spdlog::warn!("{message}");
        self.warnings.push(message);
    }

    /// Resolve the time windows and apply the duty cycle fallback
    pub fn finish(mut self) -> HeaderRecord {
        let windows = self.windows.resolve(&mut self.warnings);
        let tx_waveform = self.tx_waveform.unwrap_or_else(|| UNDEFINED.to_string());
        let duty_cycle = match self.duty_cycle {
            Some(duty) if !duty.is_empty() => duty,
            _ if tx_waveform == UTEM_TAG => String::from("100"),
            _ => UNDEFINED.to_string(),
        };
        HeaderRecord {
            base_frequency: self.base_frequency,
            units: self.units,
            duty_cycle,
            tx_waveform,
            system_info: self.system_info,
            survey_config: self.survey_config,
            data_type: self.data_type,
            offtime: self.offtime,
            times_start: windows.start,
            times_end: windows.end,
            raw_header_lines: self.raw_header_lines,
            warnings: self.warnings,
        }
    }
}

fn clean_value(value: &str) -> &str {
    value.trim_matches(|c: char| matches!(c, ',' | '"' | '\'' | '&' | ' ' | '(' | ')'))
}

/// Find the first directive whose marker appears in the line and return the raw value text
fn match_directive(line: &str) -> Option<(Directive, &str)> {
    // ASCII upper-casing keeps byte offsets valid for the original line
    let upper = line.to_ascii_uppercase();
    DIRECTIVES.iter().find_map(|(marker, directive)| {
        let position = upper.find(marker)?;
        let values = match line.split('=').nth(1) {
            Some(after_equals) => after_equals,
            None => &line[position + marker.len()..],
        };
        Some((*directive, values))
    })
}

fn parse_directive_values(directive: Directive, values: &str) -> Result<Vec<f64>, DirectiveError> {
    let values = values
        .trim()
        .trim_matches(|c: char| matches!(c, '(' | 'm' | 's' | ')'))
        .trim_matches(|c: char| matches!(c, '(' | 'u' | 's' | ')'))
        .trim();
    let parsed = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| DirectiveError::BadValue(directive.label(), v.to_string()))
        })
        .collect::<Result<Vec<f64>, DirectiveError>>()?;
    if parsed.is_empty() {
        return Err(DirectiveError::MissingValues(directive.label()));
    }
    Ok(parsed)
}
