//! Thin filesystem and process helpers behind `clean`, `open` and `kill`.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Remove a directory or file if it exists.
pub fn rm(path: &Path) -> Result<bool> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
        Ok(true)
    } else if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Open a path with the OS file browser.
pub fn open(path: &Path) -> Result<()> {
    let opener = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    Command::new(opener)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run '{opener}'"))?;
    Ok(())
}

/// Parse a comma-separated port list, skipping anything that is not a port.
pub fn parse_ports(value: &str) -> Vec<u16> {
    value
        .split(',')
        .filter_map(|p| {
            let port = p.trim().parse::<u16>().ok();
            if port.is_none() && !p.trim().is_empty() {
                tracing::warn!("Ignoring invalid port '{}'", p.trim());
            }
            port
        })
        .collect()
}

/// Kill every process listening on `port`. Returns the killed pids.
pub fn kill_port(port: u16) -> Result<Vec<String>> {
    let pids = listening_pids(port)?;
    for pid in &pids {
        let mut command = if cfg!(target_os = "windows") {
            let mut c = Command::new("taskkill");
            c.args(["/F", "/PID", pid.as_str()]);
            c
        } else {
            let mut c = Command::new("kill");
            c.args(["-9", pid.as_str()]);
            c
        };
        let status = command
            .status()
            .with_context(|| format!("Failed to kill process {pid}"))?;
        if !status.success() {
            tracing::warn!("Killing process {pid} on port {port} exited with {status}");
        }
    }
    Ok(pids)
}

fn listening_pids(port: u16) -> Result<Vec<String>> {
    if cfg!(target_os = "windows") {
        let output = Command::new("netstat")
            .args(["-ano", "-p", "tcp"])
            .output()
            .context("Failed to run netstat")?;
        let needle = format!(":{port} ");
        let mut pids: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| line.contains(&needle) && line.contains("LISTENING"))
            .filter_map(|line| line.split_whitespace().last().map(str::to_string))
            .collect();
        pids.sort();
        pids.dedup();
        Ok(pids)
    } else {
        let output = Command::new("lsof")
            .args(["-t".to_string(), format!("-iTCP:{port}"), "-sTCP:LISTEN".to_string()])
            .output()
            .context("Failed to run lsof")?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|pid| !pid.is_empty())
            .map(str::to_string)
            .collect())
    }
}
