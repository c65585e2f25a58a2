//! Renderer backed by two external programs.
//!
//! - merge: `<docx-cmd> --json <payload> [args] <template> <output>`
//! - convert: `<soffice-cmd> --convert-to pdf --headless --outdir <dir> [args] <input>`
//!
//! Children are spawned with `kill_on_drop`, so dropping the render future
//! (for example when the request deadline elapses) stops them. Scratch files
//! are `tempfile` guards and are removed however the call ends.

use crate::render::protocol::{combined_output, interpret};
use crate::render::template_check::check_template;
use crate::render::{assert_paths, DocumentRenderer, RenderError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct SubprocessRenderer {
    pub docx_cmd: String,
    pub docx_args: Vec<String>,
    pub soffice_cmd: String,
    pub soffice_args: Vec<String>,
    /// Directory for merged documents and conversion output.
    pub scratch_dir: PathBuf,
}

impl SubprocessRenderer {
    async fn run(&self, program: &str, args: Vec<OsString>) -> Result<Output, RenderError> {
        log::debug!("running {} with {} arguments", program, args.len());
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    async fn convert_to_pdf(&self, input: &Path, output_path: &Path) -> Result<(), RenderError> {
        let outdir = tempfile::Builder::new()
            .prefix("convert-")
            .tempdir_in(&self.scratch_dir)?;

        let mut args: Vec<OsString> = vec![
            "--convert-to".into(),
            "pdf".into(),
            "--headless".into(),
            "--outdir".into(),
            outdir.path().into(),
        ];
        args.extend(self.soffice_args.iter().map(OsString::from));
        args.push(input.into());

        let output = self.run(&self.soffice_cmd, args).await?;
        if !output.status.success() {
            return Err(RenderError::Process {
                program: self.soffice_cmd.clone(),
                exit_code: output.status.code(),
                output: combined_output(&output.stdout, &output.stderr),
            });
        }

        let stem = input
            .file_stem()
            .ok_or_else(|| RenderError::MissingOutput(input.to_path_buf()))?;
        let mut converted = outdir.path().join(stem);
        converted.set_extension("pdf");
        if !converted.is_file() {
            return Err(RenderError::MissingOutput(converted));
        }
        move_file(&converted, output_path).await
    }
}

#[async_trait]
impl DocumentRenderer for SubprocessRenderer {
    async fn render(
        &self,
        data: &serde_json::Value,
        template_path: &Path,
        output_path: &Path,
    ) -> Result<(), RenderError> {
        assert_paths(template_path, output_path);

        let template = template_path.to_path_buf();
        tokio::task::spawn_blocking(move || check_template(&template))
            .await
            .map_err(|e| RenderError::Io(std::io::Error::other(e)))??;

        let mut args: Vec<OsString> = vec!["--json".into(), serde_json::to_string(data)?.into()];
        args.extend(self.docx_args.iter().map(OsString::from));
        args.push(template_path.into());
        args.push(output_path.into());

        let output = self.run(&self.docx_cmd, args).await?;
        interpret(
            &self.docx_cmd,
            output.status.success(),
            output.status.code(),
            &output.stdout,
            &output.stderr,
        )
    }

    async fn render_as_pdf(
        &self,
        data: &serde_json::Value,
        template_path: &Path,
        output_path: &Path,
    ) -> Result<(), RenderError> {
        assert_paths(template_path, output_path);

        let merged = tempfile::Builder::new()
            .prefix("merged-")
            .suffix(".docx")
            .tempfile_in(&self.scratch_dir)?;
        self.render(data, template_path, merged.path()).await?;
        self.convert_to_pdf(merged.path(), output_path).await
    }
}

/// Renames `from` to `to`, falling back to copy and delete when the rename
/// crosses filesystems.
async fn move_file(from: &Path, to: &Path) -> Result<(), RenderError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    let bytes = tokio::fs::read(from).await?;
    tokio::fs::write(to, bytes).await?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{write_docx, write_script};
    use serde_json::json;
    use std::time::Duration;

    const MERGE_OK: &str = "#!/bin/sh\nprintf '%s' \"$2\" > \"$4\"\n";
    const CONVERT_OK: &str = "#!/bin/sh\nbase=$(basename \"$6\" .docx)\nprintf '%%PDF-1.4 %s' \"$(cat \"$6\")\" > \"$5/$base.pdf\"\n";

    struct Fixture {
        dir: tempfile::TempDir,
        scratch: PathBuf,
        template: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir(&scratch).unwrap();
        let template = dir.path().join("certificate.docx");
        write_docx(&template, "<w:t>{{nama}} {{ nip }}</w:t>");
        Fixture {
            dir,
            scratch,
            template,
        }
    }

    fn renderer(fx: &Fixture, merge: &str, convert: &str) -> SubprocessRenderer {
        SubprocessRenderer {
            docx_cmd: write_script(fx.dir.path(), "merge.sh", merge),
            docx_args: Vec::new(),
            soffice_cmd: write_script(fx.dir.path(), "convert.sh", convert),
            soffice_args: Vec::new(),
            scratch_dir: fx.scratch.clone(),
        }
    }

    fn scratch_is_empty(fx: &Fixture) -> bool {
        std::fs::read_dir(&fx.scratch).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn renders_pdf_and_cleans_scratch() {
        let fx = fixture();
        let renderer = renderer(&fx, MERGE_OK, CONVERT_OK);
        let output = fx.dir.path().join("out.pdf");

        renderer
            .render_as_pdf(&json!({"nama": "Rina", "nip": "1990"}), &fx.template, &output)
            .await
            .unwrap();

        let pdf = std::fs::read_to_string(&output).unwrap();
        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.contains("\"nama\":\"Rina\""));
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn merge_tool_code_five_is_bad_template() {
        let fx = fixture();
        let merge = "#!/bin/sh\necho '{\"code\":5,\"message\":\"unexpected token\"}'\nexit 1\n";
        let renderer = renderer(&fx, merge, CONVERT_OK);
        let err = renderer
            .render_as_pdf(&json!({}), &fx.template, &fx.dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::BadTemplate(m) if m == "unexpected token"));
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn template_with_spaced_identifier_never_reaches_the_merge_tool() {
        let fx = fixture();
        write_docx(&fx.template, "<w:t>{{ nama instansi }}</w:t>");
        let marker = fx.dir.path().join("merge-ran");
        let merge = format!("#!/bin/sh\ntouch '{}'\n", marker.display());
        let renderer = renderer(&fx, &merge, CONVERT_OK);
        let err = renderer
            .render_as_pdf(&json!({}), &fx.template, &fx.dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::BadTemplate(_)));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn crash_without_payload_is_a_process_error() {
        let fx = fixture();
        let merge = "#!/bin/sh\necho 'boom' >&2\nexit 3\n";
        let renderer = renderer(&fx, merge, CONVERT_OK);
        let err = renderer
            .render_as_pdf(&json!({}), &fx.template, &fx.dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Process { exit_code: Some(3), ref output, .. } if output == "boom"));
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn converter_without_output_is_reported() {
        let fx = fixture();
        let renderer = renderer(&fx, MERGE_OK, "#!/bin/sh\nexit 0\n");
        let err = renderer
            .render_as_pdf(&json!({}), &fx.template, &fx.dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingOutput(_)));
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn cancelled_render_leaves_no_scratch_files() {
        let fx = fixture();
        let merge = "#!/bin/sh\nsleep 5\n";
        let renderer = renderer(&fx, merge, CONVERT_OK);
        let output = fx.dir.path().join("out.pdf");
        let result = tokio::time::timeout(
            Duration::from_millis(300),
            renderer.render_as_pdf(&json!({}), &fx.template, &output),
        )
        .await;
        assert!(result.is_err());
        assert!(scratch_is_empty(&fx));
        assert!(!output.exists());
    }

    #[tokio::test]
    #[should_panic(expected = "empty output path")]
    async fn empty_output_path_is_a_programming_error() {
        let fx = fixture();
        let renderer = renderer(&fx, MERGE_OK, CONVERT_OK);
        let _ = renderer
            .render(&json!({}), &fx.template, Path::new(""))
            .await;
    }
}
