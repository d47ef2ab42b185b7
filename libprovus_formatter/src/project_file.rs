use std::fmt::Display;
use std::path::{Path, PathBuf};

use super::error::ProjectFileError;

const PROJECT_EXTENSION: &str = "ppf";
const DEFAULT_PROJECT_NAME: &str = "project.ppf";
const DATA_FILES_SECTION: &str = "[Project Data Files]";
const NEW_PROJECT_PREAMBLE: &str = "[Project Settings]\nProject Name=\"Default\"\n\n";

/// How Provus should read a data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStyle {
    BoreholeUtem,
    BoreholeSjv,
    Crone,
    Sem,
    DigiAtlantis,
}

impl DataStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BoreholeUtem => "DataFileStyleBoreholeUTEM",
            Self::BoreholeSjv => "DataFileStyleBoreholeSJV",
            Self::Crone => "DataFileStyleCrone",
            Self::Sem => "DataFileStyleSEM",
            Self::DigiAtlantis => "DataFileStyleDigiAtlantis",
        }
    }
}

impl Display for DataStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The project file of a root directory: the first `.ppf` by name, or a default path
pub fn find_project_file(root: &Path) -> Result<PathBuf, ProjectFileError> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION))
        })
        .collect();
    candidates.sort();
    Ok(candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| root.join(DEFAULT_PROJECT_NAME)))
}

/// Render the data file entries, relative to the root
fn render_entries(root: &Path, entries: &[(PathBuf, DataStyle)]) -> Result<String, ProjectFileError> {
    let mut rendered = String::new();
    for (path, style) in entries {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| ProjectFileError::OutsideRoot(path.clone()))?;
        rendered.push_str(&format!("{},{}\n", relative.display(), style));
    }
    Ok(rendered)
}

/// Replace everything after the data files section of an existing project with the entries.
/// The section is appended if the project does not have one yet.
pub fn merge_project_contents(existing: &str, entries: &str) -> String {
    let mut merged = String::with_capacity(existing.len() + entries.len());
    let mut has_section = false;
    for line in existing.split_inclusive('\n') {
        merged.push_str(line);
        if line.contains(DATA_FILES_SECTION) {
            has_section = true;
            if !line.ends_with('\n') {
                merged.push('\n');
            }
            break;
        }
    }
    if !has_section {
        merged.push('\n');
        merged.push_str(DATA_FILES_SECTION);
        merged.push('\n');
    }
    merged.push_str(entries);
    merged
}

/// Create or update the project file under `root` so it lists exactly `entries`
pub fn update_project_file(
    root: &Path,
    entries: &[(PathBuf, DataStyle)],
) -> Result<PathBuf, ProjectFileError> {
    let project = find_project_file(root)?;
    let rendered = render_entries(root, entries)?;
    let contents = if project.exists() {
        merge_project_contents(&std::fs::read_to_string(&project)?, &rendered)
    } else {
        format!("{NEW_PROJECT_PREAMBLE}{DATA_FILES_SECTION}\n{rendered}")
    };
    std::fs::write(&project, contents)?;
    spdlog::info!(
        "Wrote {} data file entries to project file {}",
        entries.len(),
        project.display()
    );
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            (dir.path().join("line1.tem"), DataStyle::BoreholeSjv),
            (dir.path().join("holes").join("bh2.pem"), DataStyle::Crone),
        ];
        let project = update_project_file(dir.path(), &entries).unwrap();
        assert_eq!(project, dir.path().join("project.ppf"));
        let expected = format!(
            "[Project Settings]\nProject Name=\"Default\"\n\n[Project Data Files]\n\
             line1.tem,DataFileStyleBoreholeSJV\n{},DataFileStyleCrone\n",
            Path::new("holes").join("bh2.pem").display()
        );
        assert_eq!(std::fs::read_to_string(project).unwrap(), expected);
    }

    #[test]
    fn test_existing_project_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("b_survey.ppf");
        std::fs::write(
            &existing,
            "[Project Settings]\nProject Name=\"Survey\"\n\n[Project Data Files]\nold.tem,DataFileStyleSEM\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("z_other.ppf"), "").unwrap();

        let entries = vec![(dir.path().join("new.tem"), DataStyle::BoreholeUtem)];
        let project = update_project_file(dir.path(), &entries).unwrap();
        assert_eq!(project, existing);
        assert_eq!(
            std::fs::read_to_string(project).unwrap(),
            "[Project Settings]\nProject Name=\"Survey\"\n\n[Project Data Files]\nnew.tem,DataFileStyleBoreholeUTEM\n"
        );
    }

    #[test]
    fn test_missing_section_is_appended() {
        assert_eq!(
            merge_project_contents("[Project Settings]\n", "a.tem,DataFileStyleCrone\n"),
            "[Project Settings]\n\n[Project Data Files]\na.tem,DataFileStyleCrone\n"
        );
        assert_eq!(
            merge_project_contents("[Project Data Files]", "a.tem,DataFileStyleCrone\n"),
            "[Project Data Files]\na.tem,DataFileStyleCrone\n"
        );
    }

    #[test]
    fn test_entry_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![(PathBuf::from("/elsewhere/line.tem"), DataStyle::Sem)];
        assert!(matches!(
            update_project_file(dir.path(), &entries),
            Err(ProjectFileError::OutsideRoot(_))
        ));
    }
}
