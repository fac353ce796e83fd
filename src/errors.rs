use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanoramaError {
    #[error("Layout configuration was considered invalid due to error: {0}")]
    InvalidLayout(#[from] anyhow::Error),
    #[error("Could not load the {source_name} table: {error}")]
    FailureInLoading {
        source_name: &'static str,
        #[source]
        error: LoadError,
    },
    #[error("Error while writing dashboard output: {0}")]
    ErrorInOutput(OutputError),
}

impl PanoramaError {
    pub(crate) fn loading(source_name: &'static str) -> impl FnOnce(LoadError) -> Self {
        move |error| Self::FailureInLoading { source_name, error }
    }
}

/// Structural problems found while turning a raw grid into a table. These are all fatal, as the
/// row and column offsets are assumptions about one specific file layout.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("No header row found after skipping {skipped} rows")]
    MissingHeaderRow { skipped: usize },
    #[error("Expected at least {expected} data rows but found {found}")]
    TooFewRows { expected: usize, found: usize },
    #[error("Expected at least {expected} data columns but found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("Row window {window} selects no rows from a grid of {rows} rows")]
    EmptyWindow { window: String, rows: usize },
    #[error("No row labelled '{0}' was found")]
    MissingLabel(String),
    #[error("Entity '{0}' appears more than once")]
    DuplicateEntity(String),
    #[error("No column header could be read as a year")]
    NoYearColumns,
    #[error("Year {0} heads more than one column")]
    DuplicateYear(i32),
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

impl From<OutputError> for PanoramaError {
    fn from(error: OutputError) -> Self {
        Self::ErrorInOutput(error)
    }
}
