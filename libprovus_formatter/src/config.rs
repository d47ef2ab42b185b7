use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{
    MCG_EXTENSION, OPTIONS_DIR_NAME, PEM_EXTENSION, SAMPLING_DIR_NAME, TEM_EXTENSION,
    WAVEFORM_DIR_NAME,
};
use super::error::ConfigError;

/// Structure representing the application configuration. Contains pathing and batch information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Project root. Descriptors are written under `<root>/Provus_Options`
    pub root_path: PathBuf,
    /// Optional directory scanned recursively for TEM/PEM files
    pub data_path: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    pub mcg_files: Vec<PathBuf>,
    pub update_headers: bool,
    pub update_project_file: bool,
}

impl Default for Config {
    /// Generate a new Config object. All paths will be empty/invalid
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("None"),
            data_path: None,
            files: Vec::new(),
            mcg_files: Vec::new(),
            update_headers: false,
            update_project_file: false,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Get the path to the project root, which must exist
    pub fn get_root_directory(&self) -> Result<&Path, ConfigError> {
        if self.root_path.is_dir() {
            Ok(&self.root_path)
        } else {
            Err(ConfigError::BadFilePath(self.root_path.clone()))
        }
    }

    /// Get the path to the waveform descriptor directory
    pub fn get_waveform_directory(&self) -> PathBuf {
        self.root_path.join(OPTIONS_DIR_NAME).join(WAVEFORM_DIR_NAME)
    }

    /// Get the path to the sampling descriptor directory
    pub fn get_sampling_directory(&self) -> PathBuf {
        self.root_path.join(OPTIONS_DIR_NAME).join(SAMPLING_DIR_NAME)
    }

    /// All source files of the batch, in processing order.
    ///
    /// Explicit files come first, then TEM/PEM files found under the data path
    /// (sorted), then the MCG exports. Files sharing a file name are only processed
    /// once; the first occurrence wins.
    pub fn collect_data_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut candidates: Vec<PathBuf> = self.files.clone();
        if let Some(data_path) = &self.data_path {
            if !data_path.is_dir() {
                return Err(ConfigError::BadFilePath(data_path.clone()));
            }
            let mut scanned = Vec::new();
            scan_directory(data_path, &mut scanned)?;
            scanned.sort();
            candidates.extend(scanned);
        }
        candidates.extend(self.mcg_files.iter().cloned());

        let mut seen = FxHashSet::default();
        let mut files = Vec::with_capacity(candidates.len());
        for path in candidates {
            let name = path.file_name().map(|n| n.to_os_string());
            if seen.insert(name) {
                files.push(path);
            } else {
                spdlog::warn!(
                    "Skipping {} as a file with the same name is already in the batch",
                    path.display()
                );
            }
        }
        Ok(files)
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Recursively collect TEM and PEM files under a directory
fn scan_directory(directory: &Path, found: &mut Vec<PathBuf>) -> Result<(), ConfigError> {
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_dir() {
            scan_directory(&path, found)?;
        } else if has_extension(&path, TEM_EXTENSION) || has_extension(&path, PEM_EXTENSION) {
            found.push(path);
        } else if has_extension(&path, MCG_EXTENSION) {
            spdlog::info!(
                "Ignoring {} found in the data path; list MCG exports under mcg_files",
                path.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let config = Config {
            root_path: dir.path().to_path_buf(),
            data_path: None,
            files: vec![PathBuf::from("line1.tem")],
            mcg_files: vec![],
            update_headers: true,
            update_project_file: false,
        };
        config.write_config_file(&path).unwrap();
        assert_eq!(Config::read_config_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::read_config_file(Path::new("/definitely/not/here.yml"));
        assert!(matches!(result, Err(ConfigError::BadFilePath(_))));
    }

    #[test]
    fn test_output_directories() {
        let config = Config {
            root_path: PathBuf::from("/survey"),
            ..Default::default()
        };
        assert_eq!(
            config.get_waveform_directory(),
            PathBuf::from("/survey/Provus_Options/Waveforms")
        );
        assert_eq!(
            config.get_sampling_directory(),
            PathBuf::from("/survey/Provus_Options/Channel_Sampling_Schemes")
        );
    }

    #[test]
    fn test_collect_data_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(data.join("holes")).unwrap();
        std::fs::write(data.join("b.TEM"), "").unwrap();
        std::fs::write(data.join("holes").join("a.pem"), "").unwrap();
        std::fs::write(data.join("holes").join("c.tem"), "").unwrap();
        std::fs::write(data.join("notes.txt"), "").unwrap();

        let explicit = dir.path().join("c.tem");
        let mcg = dir.path().join("export.mcg");
        let config = Config {
            root_path: dir.path().to_path_buf(),
            data_path: Some(data.clone()),
            files: vec![explicit.clone()],
            mcg_files: vec![mcg.clone()],
            ..Default::default()
        };
        let files = config.collect_data_files().unwrap();
        assert_eq!(
            files,
            vec![
                explicit,
                data.join("b.TEM"),
                data.join("holes").join("a.pem"),
                mcg
            ]
        );
    }
}
