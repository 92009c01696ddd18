//! JSON envelope written to stdout for every command.

use std::io::{self, Write};

use arthur_ops::error::Hint;
use arthur_ops::{Error, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct Envelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    details: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hints: Vec<Hint>,
}

impl Envelope {
    fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    code: err.code.as_str(),
                    message: err.message,
                    details: err.details,
                    hints: err.hints,
                }),
            },
        }
    }
}

/// Serialize a command's output and pick the process exit status.
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(e) => (
                Err(Error::internal_json(e.to_string(), Some("serialize response".to_string()))),
                1,
            ),
        },
        Err(err) => {
            let exit_code = err.code.exit_code();
            (Err(err), exit_code)
        }
    }
}

pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::from_result(result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize response".to_string())))?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Ok(()) => Ok(()),
        // Reader went away (`| head`); nothing left to report to.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(Error::internal_io(e.to_string(), Some("write stdout".to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arthur_ops::ErrorCode;

    #[test]
    fn interrupted_maps_to_130() {
        let (_, exit_code) = map_cmd_result_to_json::<()>(Err(Error::interrupted(2)));
        assert_eq!(exit_code, 130);
    }

    #[test]
    fn usage_and_command_failures_map_to_1() {
        for code in [
            ErrorCode::ValidationMissingArgument,
            ErrorCode::PreflightConfigDirMissing,
            ErrorCode::CommandFailed,
            ErrorCode::PipelineMissingId,
        ] {
            assert_eq!(code.exit_code(), 1);
        }
    }

    #[test]
    fn error_envelope_carries_code_and_hints() {
        let err = Error::preflight_config_dir_missing("/tmp/missing");
        let (json, exit_code) = map_cmd_result_to_json::<()>(Err(err));
        assert_eq!(exit_code, 1);

        let response = serde_json::to_value(Envelope::from_result(json)).unwrap();
        assert_eq!(response["success"], false);
        assert_eq!(response["error"]["code"], "preflight.config_dir_missing");
        assert!(response["error"]["hints"].is_array());
        assert!(response.get("data").is_none());
    }

    #[test]
    fn success_envelope_carries_exit_code_through() {
        let (json, exit_code) = map_cmd_result_to_json(Ok((serde_json::json!({"exitCode": 3}), 3)));
        assert_eq!(exit_code, 3);

        let response = serde_json::to_value(Envelope::from_result(json)).unwrap();
        assert_eq!(response["success"], true);
        assert_eq!(response["data"]["exitCode"], 3);
        assert!(response.get("error").is_none());
    }
}
