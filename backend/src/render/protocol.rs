//! Error protocol of the docx merge tool.
//!
//! On failure the tool prints `{"code": <int>, "message": <string>}` to
//! stdout, or to stderr when stdout is empty.

use crate::render::RenderError;
use serde::Deserialize;

pub const CODE_SAVE_DOCX: i64 = 3;
pub const CODE_LOAD_TEMPLATE: i64 = 4;
pub const CODE_BAD_TEMPLATE: i64 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorPayload {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Extracts the error payload from captured output. The whole stream is tried
/// first, then its last non-empty line, since tools may log before failing.
pub fn parse_payload(stdout: &[u8], stderr: &[u8]) -> Option<ErrorPayload> {
    let stdout = String::from_utf8_lossy(stdout);
    let stream = if stdout.trim().is_empty() {
        String::from_utf8_lossy(stderr)
    } else {
        stdout
    };
    let trimmed = stream.trim();
    serde_json::from_str(trimmed).ok().or_else(|| {
        trimmed
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| serde_json::from_str(line.trim()).ok())
    })
}

pub fn classify(payload: ErrorPayload) -> RenderError {
    match payload.code {
        CODE_SAVE_DOCX => RenderError::SaveDocx(payload.message),
        CODE_LOAD_TEMPLATE => RenderError::LoadTemplate(payload.message),
        CODE_BAD_TEMPLATE => RenderError::BadTemplate(payload.message),
        code => RenderError::Renderer {
            code,
            message: payload.message,
        },
    }
}

/// Maps the outcome of one merge invocation to a result.
pub fn interpret(
    program: &str,
    success: bool,
    exit_code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<(), RenderError> {
    match parse_payload(stdout, stderr) {
        Some(payload) if payload.code != 0 => Err(classify(payload)),
        _ if success => Ok(()),
        Some(payload) => Err(RenderError::Process {
            program: program.to_string(),
            exit_code,
            output: payload.message,
        }),
        None => Err(RenderError::Process {
            program: program.to_string(),
            exit_code,
            output: combined_output(stdout, stderr),
        }),
    }
}

pub fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
        (false, true) => stdout.trim().to_string(),
        (true, false) => stderr.trim().to_string(),
        (true, true) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_are_classified() {
        let err = interpret("docx", false, Some(1), br#"{"code":5,"message":"tag"}"#, b"").unwrap_err();
        assert!(matches!(err, RenderError::BadTemplate(m) if m == "tag"));

        let err = interpret("docx", false, Some(1), br#"{"code":4,"message":"open"}"#, b"").unwrap_err();
        assert!(matches!(err, RenderError::LoadTemplate(_)));

        let err = interpret("docx", false, Some(1), br#"{"code":3,"message":"disk"}"#, b"").unwrap_err();
        assert!(matches!(err, RenderError::SaveDocx(_)));
    }

    #[test]
    fn unknown_code_keeps_code_and_message() {
        let err = interpret("docx", false, Some(2), b"", br#"{"code":9,"message":"odd"}"#).unwrap_err();
        assert!(matches!(err, RenderError::Renderer { code: 9, ref message } if message == "odd"));
    }

    #[test]
    fn unparsable_failure_carries_exit_code_and_output() {
        let err = interpret("docx", false, Some(139), b"", b"Segmentation fault").unwrap_err();
        match err {
            RenderError::Process { exit_code, output, .. } => {
                assert_eq!(exit_code, Some(139));
                assert_eq!(output, "Segmentation fault");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_with_an_error_payload_is_still_an_error() {
        let out = b"loading template\n{\"code\":5,\"message\":\"bad placeholder\"}\n";
        assert!(matches!(
            interpret("docx", true, Some(0), out, b""),
            Err(RenderError::BadTemplate(_))
        ));
        assert!(interpret("docx", true, Some(0), b"done", b"").is_ok());
        assert!(interpret("docx", true, Some(0), br#"{"code":0,"message":"ok"}"#, b"").is_ok());
    }
}
