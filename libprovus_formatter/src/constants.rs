// Output layout expected by Provus
pub const OPTIONS_DIR_NAME: &str = "Provus_Options";
pub const WAVEFORM_DIR_NAME: &str = "Waveforms";
pub const SAMPLING_DIR_NAME: &str = "Channel_Sampling_Schemes";
pub const CSV_EXTENSION: &str = "csv";

// Source file extensions (compared case-insensitively)
pub const TEM_EXTENSION: &str = "tem";
pub const PEM_EXTENSION: &str = "pem";
pub const MCG_EXTENSION: &str = "mcg";

pub const UNDEFINED: &str = "Undefined";
pub const UTEM_TAG: &str = "UTEM";
pub const LINE_WEIGHT: &str = "2";

/// Units reported as a time derivative of the field
pub const DBDT_UNITS: [&str; 17] = [
    "uV", "uV/A", "uV/Am2", "uV/m2", "nV", "nV/A", "nV/Am2", "nV/m2", "pV", "pV/A", "pV/Am2",
    "pV/m2", "nT/As", "nT/Asm2", "pT/s", "pT/As", "pT/Asm2",
];

/// Units reported as an absolute field, a ratio, or a derived resistivity/conductivity
pub const B_FIELD_UNITS: [&str; 26] = [
    "nT", "nT/A", "nT/Am2", "nT/m2", "pT", "pT/A", "pT/Am2", "pT/m2", "fT", "fT/A", "fT/Am2",
    "fT/m2", "ppm", "ppmHp", "ppt", "pptHp", "%Ht", "%", "ppmHz", "pptHz", "ppmHx", "pptHx",
    "ppmHt", "pptHt", "Ohm-m", "S/m",
];

/// The MCG exporter only ever uses this short list for rate-of-change units
pub const MCG_DBDT_UNITS: [&str; 5] = ["uV", "nV", "pV", "nT/s", "pT/s"];

// TEM channel gradient
pub const TEM_RED_START: f64 = 0.25;
pub const TEM_GREEN_START: f64 = 0.75;
pub const TEM_BLUE: f64 = 0.5;
pub const TEM_COLOR_STEP: f64 = 0.05;

pub const US_PER_MS: f64 = 1000.0;
pub const MS_PER_S: f64 = 1000.0;
pub const US_PER_S: f64 = 1.0e6;
