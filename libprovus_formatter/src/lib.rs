//! # provus_formatter
//!
//! provus_formatter prepares time-domain electromagnetic survey data for Provus. It reads
//! the headers of survey files in three legacy formats and writes the waveform and channel
//! sampling descriptors Provus needs to interpret them, optionally tagging the source files
//! and registering them in a Provus project file.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see the
//! [Rust docs](https://www.rust-lang.org/tools/install) for installing the tool chain.
//!
//! To build and install the CLI use `cargo install --path ./provus_formatter_cli` from the
//! top level repository. To use the CLI see the `provus_formatter_cli` documentation.
//!
//! ## Supported Formats
//!
//! - `.tem`: free-form headers of `KEY=value` (or `KEY:value`) tokens plus the
//! `/TIMESSTART`, `/TIMESEND`, `/TIMES(ms|us)=` and `/TIMESWIDTH(ms|us)=` time window
//! directives. The waveform is picked from the `TXWAVEFORM` and `DUTYCYCLE` values:
//! `UTEM`, a 50% duty square wave, or a full square wave.
//! - `.pem`: Crone files. The survey parameters line (`<mode> Metric Cable <time base>
//! <ramp> <gates> <readings>`) gives the base frequency and ramp time, and the gate table
//! following it gives the channels.
//! - `.mcg`: exports with `START/END OF STANDARD WAVEFORM` and `START/END OF CHANNEL TIMES`
//! blocks plus `Base Frequency (Hz)`, `Waveform Timing Mark (s)`, `Units` and `Unit Types`
//! directives.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! root_path: /path/to/project
//! data_path: null
//! files: []
//! mcg_files: []
//! update_headers: false
//! update_project_file: false
//! ```
//!
//! - `root_path`: the Provus project directory. Descriptors are written below it.
//! - `data_path`: optional directory scanned recursively for `.tem` and `.pem` files.
//! - `files`: explicit list of `.tem`/`.pem` files. Files sharing a name with an earlier
//! file in the batch are skipped.
//! - `mcg_files`: list of `.mcg` exports.
//! - `update_headers`: tag each TEM file's base-frequency line with `WAVEFORM:` and
//! `SAMPLING:` entries naming its descriptors.
//! - `update_project_file`: list the TEM/PEM files in the first `.ppf` of the root (or a
//! new `project.ppf`).
//!
//! ## Output
//!
//! ```text
//! <root_path>
//! |---- Provus_Options
//! |    |---- Waveforms
//! |    |    |---- <waveform name>.csv
//! |    |---- Channel_Sampling_Schemes
//! |    |    |---- <sampling name>.csv
//! ```
//!
//! Descriptor files are only rewritten if their content changes. A file which fails to
//! parse is reported and never stops the rest of the batch.
pub mod batch_status;
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod header;
pub mod header_rewrite;
pub mod mcg;
pub mod pem;
pub mod pem_descriptor;
pub mod process;
pub mod project_file;
pub mod sampling;
pub mod time_window;
pub mod waveform;
