use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{cargo, OnFailure, CORE_CRATES, TARGET};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // Check 1: Hardware binary
    cargo(
        "Hardware target (STM32H7)",
        &["check", "-p", "firmware", "--target", TARGET, "--features", "hardware"],
        OnFailure::Abort,
    )?;

    // Check 2: Core crates stay no_std
    for krate in CORE_CRATES {
        cargo(
            &format!("{krate} (no_std)"),
            &["check", "-p", krate, "--target", TARGET, "--no-default-features"],
            OnFailure::Abort,
        )?;
    }

    // Check 3: Host build with tracing
    cargo(
        "Host build (tracing)",
        &["check", "-p", "firmware", "--features", "tracing,std"],
        OnFailure::Abort,
    )?;

    // Check 4: Clippy lints (reported, not fatal)
    cargo(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;

    // Check 5: Formatting (reported, not fatal)
    let fmt = cargo("Formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?;
    if !fmt.status.success() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
