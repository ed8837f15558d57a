use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::ClusterReport;

/// Writes the report as pretty JSON next to its final path, then renames it into place.
pub fn save(report: &ClusterReport, path: &Path) -> Result<()> {
    let buf = serde_json::to_vec_pretty(report).context("failed to serialize report")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cluster-config.json".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let write = || -> Result<()> {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("failed to create file: {}", tmp.display()))?;
        f.write_all(&buf)?;
        f.write_all(b"\n")?;
        f.sync_all()?;
        Ok(())
    };
    if let Err(err) = write() {
        let _ = std::fs::remove_file(&tmp);
        return Err(err.context(format!("failed to write report: {}", path.display())));
    }

    std::fs::rename(&tmp, path).with_context(|| {
        let _ = std::fs::remove_file(&tmp);
        format!("failed to move report into place: {}", path.display())
    })
}

#[cfg(test)]
pub(crate) fn load(path: &Path) -> Result<ClusterReport> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report: {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("failed to parse report: {}", path.display()))
}

/// Prints the report document to stdout. A closed pipe is not an error.
pub fn write_json(report: &ClusterReport) -> Result<()> {
    let buf = serde_json::to_vec_pretty(report)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}
