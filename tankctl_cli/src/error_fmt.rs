//! Human-readable error descriptions and structured JSON error formatting.

use crate::drive::Abort;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use tankctl_core::error::{BuildError, ControlError};

    // Typed matches first
    if let Some(abort) = err.downcast_ref::<Abort>() {
        return match abort {
            Abort::Interrupted => {
                "What happened: The move was interrupted (Ctrl-C).\nThe chassis was stopped and both sides were released.".to_string()
            }
            Abort::MaxRuntime { max_run_ms } => format!(
                "What happened: max run time of {max_run_ms} ms was exceeded before the chassis settled.\nLikely causes: Settle thresholds too tight, a slow simulated slew rate, or an unreachable target.\nHow to fix: Raise --max-run-ms, or loosen [settle] at_target_error / at_target_derivative."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingInput => {
                "What happened: No controller input was provided.\nHow to fix: Pass an encoder or sensor via input(...).".to_string()
            }
            BuildError::MissingOutput => {
                "What happened: No controller output was provided.\nHow to fix: Pass a motor via output(...).".to_string()
            }
            BuildError::MissingController => {
                "What happened: The control pipeline has no controller stage.\nHow to fix: Add pos_pid(...), vel_pid(...) or lambda(...) before building.".to_string()
            }
        };
    }

    if let Some(ControlError::InvalidConfiguration(msg)) = err.downcast_ref::<ControlError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in [chassis] or [gearset].\nHow to fix: Edit the config file, then rerun `tankctl self-check`."
        );
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        let mut cause = String::new();
        if let Some(src) = err.source() {
            cause = format!(" ({src})");
        }
        return format!(
            "What happened: Configuration is invalid or incomplete{cause}.\nLikely causes: Missing [chassis] table, unknown keys, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 interrupted, 4 max run time, 1 everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<Abort>() {
        Some(Abort::Interrupted) => 2,
        Some(Abort::MaxRuntime { .. }) => 4,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(abort) = err.downcast_ref::<Abort>() {
        let msg = humanize(err);
        let obj = match abort {
            Abort::MaxRuntime { max_run_ms } => json!({
                "reason": abort.name(),
                "details": { "max_run_ms": max_run_ms },
                "message": msg,
            }),
            Abort::Interrupted => json!({ "reason": abort.name(), "message": msg }),
        };
        return obj.to_string();
    }

    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
