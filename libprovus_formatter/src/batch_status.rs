/// Which part of the batch a status message refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchStage {
    #[default]
    Descriptors,
    Headers,
    ProjectFile,
}

/// Progress message sent from the batch driver to whoever is watching (typically the CLI)
#[derive(Debug, Clone, Default)]
pub struct BatchStatus {
    pub progress: f32,
    pub file_index: usize,
    pub n_files: usize,
    pub stage: BatchStage,
}

impl BatchStatus {
    pub fn new(file_index: usize, n_files: usize, stage: BatchStage) -> Self {
        let progress = if n_files == 0 {
            1.0
        } else {
            file_index as f32 / n_files as f32
        };
        Self {
            progress,
            file_index,
            n_files,
            stage,
        }
    }
}
