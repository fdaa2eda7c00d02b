//! Azure CLI command execution.
//!
//! Runs `az` commands and hands back their stdout.

use colored::Colorize;
use regex::Regex;
use std::error::Error;
use std::process::Command;
use std::sync::OnceLock;

/// Largest stdout accepted from a single command.
const MAX_STDOUT_BYTES: usize = 2_000_000;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Run a command line, splitting on spaces but keeping quoted parts together.
pub fn run(cmd: &str) -> Result<String, Box<dyn Error>> {
    let cmds: Vec<String> = split_and_strip(cmd)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    run_args(&cmds)
}

/// Run a program with already separated arguments and return stdout.
///
/// Arguments are passed as-is, so JSON bodies need no quoting.
pub fn run_args(args: &[String]) -> Result<String, Box<dyn Error>> {
    let (program, rest) = args.split_first().ok_or("Empty command")?;
    let shown = shown_args(args);
    log::debug!("run({cmd})", cmd = shown.on_blue());

    let output = Command::new(program).args(rest).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        format!("Failed to execute {program}: {e}")
    })?;

    if output.status.success() {
        log::debug!("Success output.stdout.len(): {}", output.stdout.len());
        if output.stdout.len() > MAX_STDOUT_BYTES {
            return Err(format!(
                "Response too large: {} bytes for command: {program}",
                output.stdout.len()
            )
            .into());
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!("{failed} to run {program}", failed = "failed".on_red());
        return Err(format!("ERROR running: {stderr}").into());
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| format!("Invalid UTF-8: {}", e))?;
    Ok(stdout)
}

/// Command line for logs, with any `--body` value left out.
fn shown_args(args: &[String]) -> String {
    let mut shown = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        shown.push(if hide_next { "<body>" } else { arg.as_str() });
        hide_next = arg == "--body";
    }
    shown.join(" ")
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .collect()
}
