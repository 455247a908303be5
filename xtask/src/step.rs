//! One `cargo` invocation with timing and coloured status lines.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// Core crates that must stay `no_std`.
pub const CORE_CRATES: [&str; 4] = ["platform", "input", "sound", "power"];

/// Embedded target triple.
pub const TARGET: &str = "thumbv7em-none-eabihf";

/// What a failed step does to the overall run.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Abort,
    Warn,
}

/// Run `cargo <args>`, print a ✓/✗ line and return its output.
pub fn cargo(label: &str, args: &[&str], on_failure: OnFailure) -> Result<Output> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
    } else if on_failure == OnFailure::Abort {
        eprintln!("{}", format!("  ✗ {label} failed").red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            eprintln!("  {line}");
        }
        anyhow::bail!("{label} failed");
    } else {
        eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
    }
    println!();
    Ok(output)
}

/// Sum of the `test result:` lines in cargo test output.
pub fn test_summary(output: &str) -> String {
    let (mut passed, mut failed, mut ignored) = (0u32, 0u32, 0u32);
    let mut found = false;
    for line in output.lines() {
        let Some(rest) = line.split("test result:").nth(1) else {
            continue;
        };
        found = true;
        for part in rest.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let count: u32 = count.parse().unwrap_or(0);
            match kind {
                "passed" => passed += count,
                "failed" => failed += count,
                "ignored" => ignored += count,
                _ => {}
            }
        }
    }
    if found {
        format!("({passed} passed, {failed} failed, {ignored} ignored)")
    } else {
        "(summary not available)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_every_result_line() {
        let out = "\
test result: ok. 5 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out; finished in 0.01s
test result: ok. 3 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.20s
";
        assert_eq!(test_summary(out), "(8 passed, 0 failed, 1 ignored)");
    }

    #[test]
    fn missing_summary() {
        assert_eq!(test_summary("error: no tests"), "(summary not available)");
    }
}
