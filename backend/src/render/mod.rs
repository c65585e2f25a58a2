//! # Document Renderer
//!
//! Turns a docx template plus JSON data into a PDF in two steps: an external
//! merge tool fills the template placeholders, then a headless office
//! converter turns the merged docx into PDF. Both tools sit behind the
//! [`DocumentRenderer`] trait so they can be replaced by an in-process library
//! or a network service without touching callers.

pub mod protocol;
pub mod subprocess;
pub mod template_check;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to save rendered template as docx: {0}")]
    SaveDocx(String),

    #[error("failed to load template: {0}")]
    LoadTemplate(String),

    #[error("bad template syntax: {0}")]
    BadTemplate(String),

    #[error("renderer failed with code {code}: {message}")]
    Renderer { code: i64, message: String },

    #[error("{program} exited with status {exit_code:?}: {output}")]
    Process {
        program: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF conversion produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("render data could not be serialized: {0}")]
    Data(#[from] serde_json::Error),

    #[error("renderer IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Merges `data` into the docx template, writing a docx to `output_path`.
    ///
    /// Panics when either path is empty.
    async fn render(
        &self,
        data: &serde_json::Value,
        template_path: &Path,
        output_path: &Path,
    ) -> Result<(), RenderError>;

    /// Merges `data` into the template and converts the result to PDF at
    /// `output_path`. Intermediate files are removed on every exit path.
    ///
    /// Panics when either path is empty.
    async fn render_as_pdf(
        &self,
        data: &serde_json::Value,
        template_path: &Path,
        output_path: &Path,
    ) -> Result<(), RenderError>;
}

pub(crate) fn assert_paths(template_path: &Path, output_path: &Path) {
    assert!(
        !template_path.as_os_str().is_empty(),
        "render called with an empty template path"
    );
    assert!(
        !output_path.as_os_str().is_empty(),
        "render called with an empty output path"
    );
}
