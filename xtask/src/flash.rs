use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::step::{cargo, OnFailure, TARGET};

/// probe-rs chip name for the board.
const CHIP: &str = "STM32H743ZITx";

fn binary_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{TARGET}/{profile}/firmware")
}

pub fn run(release: bool) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({mode} mode)...").cyan().bold()
    );
    println!();

    let mut args = vec!["build", "-p", "firmware", "--target", TARGET, "--features", "hardware"];
    if release {
        args.push("--release");
    }
    cargo("Firmware build", &args, OnFailure::Abort)?;

    show_binary_size(&binary_path(release));
    println!();

    // Flash with probe-rs; `run` keeps the RTT (defmt) log attached.
    println!("{}", "📡 Flashing to STM32H7...".cyan().bold());
    println!("   {}", "Connecting to probe...".dimmed());

    let flash_start = Instant::now();
    let status = Command::new("probe-rs")
        .args(["run", &binary_path(release), "--chip", CHIP, "--probe-index", "0"])
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !status.success() {
        eprintln!("{}", "✗ Flash failed".red().bold());
        anyhow::bail!("Flash failed - check that the probe is connected and the device is powered");
    }

    println!(
        "{}",
        format!(
            "✓ Flash session ended after {:.2}s",
            flash_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();

    Ok(())
}

fn show_binary_size(binary: &str) {
    let Ok(out) = Command::new("rust-size").args([binary, "-A"]).output() else {
        println!("   {}", "rust-size not found (cargo install cargo-binutils)".dimmed());
        return;
    };
    if out.status.success() {
        println!("{}", "📊 Binary size:".cyan());
        for line in String::from_utf8_lossy(&out.stdout).lines() {
            println!("   {}", line.dimmed());
        }
    }
}
