use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use super::batch_status::{BatchStage, BatchStatus};
use super::config::Config;
use super::constants::{MCG_EXTENSION, PEM_EXTENSION, TEM_EXTENSION, UTEM_TAG};
use super::descriptor::{check_name, Descriptor, WriteOutcome};
use super::error::{ProcessorError, ProjectFileError, WaveformError};
use super::header::HeaderRecord;
use super::header_rewrite::rewrite_header_tags;
use super::mcg::McgExport;
use super::pem::PemHeader;
use super::pem_descriptor::{synthesize_sampling, synthesize_waveform};
use super::project_file::{update_project_file, DataStyle};
use super::sampling::build_sampling;
use super::waveform::build_waveform;

/// The survey file formats we know how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Tem,
    Pem,
    Mcg,
}

impl SourceFormat {
    /// Pick the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, ProcessorError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            TEM_EXTENSION => Ok(Self::Tem),
            PEM_EXTENSION => Ok(Self::Pem),
            MCG_EXTENSION => Ok(Self::Mcg),
            _ => Err(ProcessorError::UnknownFileType(path.to_path_buf())),
        }
    }
}

/// A descriptor that made it to disk
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

impl WrittenDescriptor {
    fn write<D: Descriptor>(descriptor: &D, directory: &Path) -> Result<Self, ProcessorError> {
        let (path, outcome) = descriptor.write_to(directory)?;
        Ok(Self {
            name: descriptor.name().to_string(),
            path,
            outcome,
        })
    }
}

/// What processing a single source file produced
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub base_frequency: Option<String>,
    pub units: Option<String>,
    pub n_channels: usize,
    /// Transmitter waveform tag: the TEM header value, "Crone" for PEM, "MCG" for MCG
    pub tx_waveform: String,
    pub waveform: Option<WrittenDescriptor>,
    pub sampling: Option<WrittenDescriptor>,
    pub warnings: Vec<String>,
}

impl FileOutcome {
    fn empty(path: &Path, format: SourceFormat, tx_waveform: String) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            base_frequency: None,
            units: None,
            n_channels: 0,
            tx_waveform,
            waveform: None,
            sampling: None,
            warnings: Vec::new(),
        }
    }

    pub fn data_style(&self) -> DataStyle {
        match self.format {
            SourceFormat::Pem => DataStyle::Crone,
            _ if self.tx_waveform == UTEM_TAG => DataStyle::BoreholeUtem,
            _ => DataStyle::BoreholeSjv,
        }
    }

    /// Both descriptor names, if both were written
    pub fn descriptor_names(&self) -> Option<(&str, &str)> {
        match (&self.waveform, &self.sampling) {
            (Some(waveform), Some(sampling)) => Some((&waveform.name, &sampling.name)),
            _ => None,
        }
    }
}

/// Per-file results of a whole batch, plus the aggregate steps
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<(PathBuf, Result<FileOutcome, ProcessorError>)>,
    pub header_failures: Vec<(PathBuf, ProcessorError)>,
    pub project_file: Option<Result<PathBuf, ProjectFileError>>,
}

impl BatchReport {
    pub fn n_succeeded(&self) -> usize {
        self.files.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.files.len() - self.n_succeeded()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter_map(|(_, r)| r.as_ref().ok())
    }
}

/// Generate the descriptors for a TEM file.
///
/// A header without a base frequency, with a transmitter configuration we have
/// no waveform for, or with a frequency that cannot be used as a file name,
/// produces no files. Windows that cannot make a sampling scheme
/// leave only the waveform. Either case is reported on the outcome, not as an error.
pub fn process_tem(
    path: &Path,
    contents: &str,
    config: &Config,
) -> Result<FileOutcome, ProcessorError> {
    let record = HeaderRecord::parse(contents);
    let mut outcome = FileOutcome::empty(path, SourceFormat::Tem, record.tx_waveform.clone());
    outcome.base_frequency = record.base_frequency.clone();
    outcome.units = record.units.clone();
    outcome.n_channels = record.num_channels();
    outcome.warnings.extend(record.warnings.iter().cloned());

    let waveform = match build_waveform(&record) {
        Ok(Some(waveform)) => waveform,
        Ok(None) => {
            let message = String::from("No base frequency found; no descriptors generated");
            spdlog::warn!("{}: {message}", path.display());
            outcome.warnings.push(message);
            return Ok(outcome);
        }
        Err(e @ WaveformError::UnsupportedConfiguration { .. }) => {
            spdlog::warn!("{}: {e}", path.display());
            outcome.warnings.push(e.to_string());
            return Ok(outcome);
        }
    };
    // The frequency text goes into the name unchanged when it is not a number
    if let Err(e) = check_name(&waveform.name) {
        spdlog::warn!("{}: {e}", path.display());
        outcome.warnings.push(e.to_string());
        return Ok(outcome);
    }
    spdlog::info!(
        "Base Frequency: {} Units: {} Channels: {} Tx Waveform: {}",
        waveform.base_frequency,
        record.units.as_deref().unwrap_or("Unknown"),
        record.num_channels(),
        record.tx_waveform
    );

    outcome.waveform = Some(WrittenDescriptor::write(
        &waveform,
        &config.get_waveform_directory(),
    )?);
    let sampling = match build_sampling(&record, &waveform.name) {
        Ok(sampling) => sampling,
        Err(e) => {
            spdlog::warn!("{}: no sampling scheme generated: {e}", path.display());
            outcome.warnings.push(e.to_string());
            return Ok(outcome);
        }
    };
    outcome.sampling = Some(WrittenDescriptor::write(
        &sampling,
        &config.get_sampling_directory(),
    )?);
    Ok(outcome)
}

/// Generate the descriptors for a PEM file.
/// Nothing is written unless both descriptors can be built.
pub fn process_pem(
    path: &Path,
    contents: &str,
    config: &Config,
) -> Result<FileOutcome, ProcessorError> {
    let header = PemHeader::parse(contents)?;
    spdlog::info!(
        "Time base: {} ms Ramp: {} us Base Frequency: {:.3} Channels: {}",
        header.survey.time_base,
        header.survey.ramp_time,
        header.base_frequency(),
        header.n_channels()
    );
    let waveform = synthesize_waveform(&header);
    let sampling = synthesize_sampling(&header)?;

    let mut outcome = FileOutcome::empty(path, SourceFormat::Pem, String::from("Crone"));
    outcome.base_frequency = Some(format!("{:.3}", header.base_frequency()));
    outcome.units = Some(header.survey.units.clone());
    outcome.n_channels = header.n_channels();
    outcome.waveform = Some(WrittenDescriptor::write(
        &waveform,
        &config.get_waveform_directory(),
    )?);
    outcome.sampling = Some(WrittenDescriptor::write(
        &sampling,
        &config.get_sampling_directory(),
    )?);
    Ok(outcome)
}

/// Generate the descriptors for an MCG export.
/// Nothing is written unless both descriptors can be built.
pub fn process_mcg(
    path: &Path,
    contents: &str,
    config: &Config,
) -> Result<FileOutcome, ProcessorError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let export = McgExport::parse(&stem, contents)?;
    let waveform = export.waveform();
    let sampling = export.sampling()?;
    spdlog::info!(
        "Base Frequency: {} Field Type: {} Channels: {}",
        export.base_frequency,
        sampling.field_type,
        sampling.channels.len()
    );

    let mut outcome = FileOutcome::empty(path, SourceFormat::Mcg, String::from("MCG"));
    outcome.base_frequency = Some(export.base_frequency.clone());
    outcome.units = export.unit_types.get(&export.units).cloned();
    outcome.n_channels = export.channel_times.len();
    outcome.waveform = Some(WrittenDescriptor::write(
        &waveform,
        &config.get_waveform_directory(),
    )?);
    outcome.sampling = Some(WrittenDescriptor::write(
        &sampling,
        &config.get_sampling_directory(),
    )?);
    Ok(outcome)
}

/// Read a source file and dispatch it to the pipeline for its format
pub fn process_file(path: &Path, config: &Config) -> Result<FileOutcome, ProcessorError> {
    let format = SourceFormat::from_path(path)?;
    let size = std::fs::metadata(path)?.len();
    spdlog::info!(
        "Processing {} ({})",
        path.display(),
        human_bytes::human_bytes(size as f64)
    );
    let contents = std::fs::read_to_string(path)?;
    match format {
        SourceFormat::Tem => process_tem(path, &contents, config),
        SourceFormat::Pem => process_pem(path, &contents, config),
        SourceFormat::Mcg => process_mcg(path, &contents, config),
    }
}

/// Tag the TEM source headers with the names of their descriptors
fn tag_headers(report: &mut BatchReport, tx: &Sender<BatchStatus>) -> Result<(), ProcessorError> {
    let targets: Vec<(PathBuf, String, String)> = report
        .outcomes()
        .filter(|outcome| outcome.format == SourceFormat::Tem)
        .filter_map(|outcome| {
            outcome
                .descriptor_names()
                .map(|(w, s)| (outcome.path.clone(), w.to_string(), s.to_string()))
        })
        .collect();

    for (idx, (path, waveform, sampling)) in targets.iter().enumerate() {
        tx.send(BatchStatus::new(idx, targets.len(), BatchStage::Headers))?;
        if let Err(e) = rewrite_header_tags(path, waveform, sampling) {
            spdlog::error!("Could not tag header of {}: {e}", path.display());
            report.header_failures.push((path.clone(), e.into()));
        }
    }
    Ok(())
}

/// The function to be called by a separate thread (typically the CLI).
///
/// Processes every file of the batch, never stopping on a file that fails, then
/// runs the optional header tagging and project file steps over the successes.
pub fn process(config: Config, tx: Sender<BatchStatus>) -> Result<BatchReport, ProcessorError> {
    let root = config.get_root_directory()?.to_path_buf();
    let files = config.collect_data_files()?;
    spdlog::info!("Found {} files to process", files.len());

    let mut report = BatchReport::default();
    for (idx, path) in files.iter().enumerate() {
        tx.send(BatchStatus::new(idx, files.len(), BatchStage::Descriptors))?;
        let result = process_file(path, &config);
        match &result {
            Ok(outcome) => spdlog::info!(
                "Finished {}: waveform {} sampling {}",
                path.display(),
                outcome.waveform.as_ref().map_or("N/A", |w| &w.name),
                outcome.sampling.as_ref().map_or("N/A", |s| &s.name)
            ),
            Err(e) => spdlog::error!("Failed to process {}: {e}", path.display()),
        }
        report.files.push((path.clone(), result));
    }

    if config.update_headers {
        spdlog::info!("Updating TEM headers...");
        tag_headers(&mut report, &tx)?;
    }

    if config.update_project_file {
        tx.send(BatchStatus::new(0, 1, BatchStage::ProjectFile))?;
        let entries: Vec<(PathBuf, DataStyle)> = report
            .outcomes()
            .filter(|outcome| outcome.format != SourceFormat::Mcg && outcome.waveform.is_some())
            .map(|outcome| (outcome.path.clone(), outcome.data_style()))
            .collect();
        let result = update_project_file(&root, &entries);
        if let Err(e) = &result {
            spdlog::error!("Could not update project file: {e}");
        }
        report.project_file = Some(result);
    }

    tx.send(BatchStatus::new(files.len(), files.len(), BatchStage::Descriptors))?;
    spdlog::info!(
        "Batch complete: {} succeeded, {} failed",
        report.n_succeeded(),
        report.n_failed()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a/LINE.TEM")).unwrap(),
            SourceFormat::Tem
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("hole.Pem")).unwrap(),
            SourceFormat::Pem
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("export.mcg")).unwrap(),
            SourceFormat::Mcg
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("notes.txt")),
            Err(ProcessorError::UnknownFileType(_))
        ));
    }

    #[test]
    fn test_unsupported_tem_produces_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            root_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let outcome = process_tem(
            Path::new("line.tem"),
            "BFREQ=5 TXWAVEFORM=Triangle\n/TIMESSTART(ms)=1\n/TIMESEND(ms)=2\n",
            &config,
        )
        .unwrap();
        assert!(outcome.waveform.is_none());
        assert!(outcome.sampling.is_none());
        assert!(outcome
            .warnings
            .last()
            .is_some_and(|w| w.starts_with("Unhandled waveform configuration")));
        assert!(!config.get_waveform_directory().exists());
    }

    #[test]
    fn test_tem_without_windows_keeps_waveform() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            root_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let outcome = process_tem(Path::new("line.tem"), "BFREQ=30 UNITS=pT\n", &config).unwrap();
        assert_eq!(outcome.base_frequency.as_deref(), Some("30.000"));
        assert_eq!(outcome.n_channels, 0);
        assert_eq!(outcome.waveform.as_ref().unwrap().name, "Square_30.000");
        assert!(outcome.sampling.is_none());
        assert!(outcome.descriptor_names().is_none());
        assert!(config
            .get_waveform_directory()
            .join("Square_30.000.csv")
            .exists());
    }

    #[test]
    fn test_path_like_frequency_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let config = Config {
            root_path: root.clone(),
            ..Default::default()
        };
        for header in ["BFREQ=1/../../../../escaped\n", "BFREQ=5/2\n"] {
            let outcome = process_tem(Path::new("line.tem"), header, &config).unwrap();
            assert!(outcome.waveform.is_none());
            assert!(outcome.sampling.is_none());
            assert!(outcome
                .warnings
                .last()
                .is_some_and(|w| w.contains("not a plain file name")));
        }
        assert!(!root.exists());
        assert!(!dir.path().join("escaped.csv").exists());
    }

    #[test]
    fn test_data_style() {
        let mut outcome =
            FileOutcome::empty(Path::new("a.tem"), SourceFormat::Tem, String::from("UTEM"));
        assert_eq!(outcome.data_style(), DataStyle::BoreholeUtem);
        outcome.tx_waveform = String::from("Undefined");
        assert_eq!(outcome.data_style(), DataStyle::BoreholeSjv);
        outcome.format = SourceFormat::Pem;
        assert_eq!(outcome.data_style(), DataStyle::Crone);
    }
}
