//! User-Friendly Error Formatting
//!
//! Turns a technical error chain into a boxed message with the likely
//! causes and what to try next.

use std::fmt::Write;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Format error for user consumption
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // Match against the whole chain, context included
    let error_msg = format!("{:#}", error);

    if error_msg.contains("Trace parse error") {
        format_trace_error(&mut output);
    } else if error_msg.contains("Invalid target rect") || error_msg.contains("Target id") {
        format_target_error(&mut output);
    } else if error_msg.contains("config") || error_msg.contains("configuration") {
        format_config_error(&mut output);
    } else if error_msg.contains("trace file") || error_msg.contains("IO error") {
        format_io_error(&mut output);
    } else {
        format_generic_error(&mut output);
    }

    writeln!(&mut output).ok();
    writeln!(&mut output, "{}", RULE).ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{}", RULE).ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: lamco-head-pointer -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Report issues: https://github.com/lamco-admin/lamco-head-pointer/issues"
    )
    .ok();

    output
}

fn format_trace_error(output: &mut String) {
    writeln!(output, "Trace Format Error").ok();
    writeln!(output).ok();
    writeln!(output, "A line of the input trace could not be decoded.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Not one JSON object per line").ok();
    writeln!(output, "     → Each record must sit on its own line (JSONL)").ok();
    writeln!(output, "     → Blank lines and lines starting with # are skipped").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Unknown or missing \"type\"").ok();
    writeln!(
        output,
        "     → One of: sample, register, unregister, clear, reset,"
    )
    .ok();
    writeln!(output, "       secondary_confirm, sensitivity").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Missing sample fields").ok();
    writeln!(
        output,
        "     → Samples need x, y, confidence and timestamp_ms"
    )
    .ok();
}

fn format_target_error(output: &mut String) {
    writeln!(output, "Target Registration Error").ok();
    writeln!(output).ok();
    writeln!(output, "A target was registered with an unusable rectangle.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Element measured before layout").ok();
    writeln!(output, "     → Width and height must be greater than zero").ok();
    writeln!(output, "     → Re-register after the first layout pass").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Empty target id").ok();
    writeln!(output, "     → Every selectable element needs a stable id").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Value out of range").ok();
    writeln!(output, "     → signal.alpha must be in (0, 1]").ok();
    writeln!(output, "     → dwell.inner_margin must be in [0, 0.5)").ok();
    writeln!(
        output,
        "     → dwell.duration_ms and watchdog.tick_ms must be > 0"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  3. Unknown confirm mode").ok();
    writeln!(output, "     → Use \"dwell\" or \"dwell_gesture\"").ok();
    writeln!(output, "     → See engine.example.toml for reference").ok();
}

fn format_io_error(output: &mut String) {
    writeln!(output, "Input Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not read the input trace.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Check the path passed to --trace").ok();
    writeln!(output, "  2. Use --trace - to read from stdin").ok();
}

fn format_generic_error(output: &mut String) {
    writeln!(output, "Engine Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while running the engine.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Re-run with -vv and check the last transitions").ok();
    writeln!(output, "  2. Validate the config with the defaults first").ok();
}
