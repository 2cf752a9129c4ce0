use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tracing::{info, warn};

use super::error::StorageResult;
use super::StorageOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    /// No file yet; a fresh one will be created.
    Missing,
    Healthy,
    /// Check failed and auto-repair is off.
    Damaged,
    /// The damaged file was moved aside (or removed when `backup` is `None`).
    Repaired { backup: Option<PathBuf> },
}

/// Runs `PRAGMA quick_check` against an existing database file and, when it
/// fails and auto-repair is enabled, moves the file out of the way so a fresh
/// schema can be created in its place.
pub async fn check_integrity(options: &StorageOptions) -> StorageResult<Integrity> {
    let path = options.path.as_path();
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Integrity::Missing);
    }

    match quick_check(path).await {
        Ok(true) => {
            info!(path = %path.display(), "Database integrity check passed");
            return Ok(Integrity::Healthy);
        }
        Ok(false) => warn!(path = %path.display(), "Database integrity check reported problems"),
        Err(e) => warn!(path = %path.display(), error = %e, "Database integrity check could not run"),
    }

    if !options.autorepair {
        warn!("Auto-repair disabled; continuing with the existing database file");
        return Ok(Integrity::Damaged);
    }

    let backup = backup_path(path, Utc::now());
    let outcome = match tokio::fs::rename(path, &backup).await {
        Ok(()) => {
            warn!(backup = %backup.display(), "Damaged database moved aside");
            Integrity::Repaired {
                backup: Some(backup),
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not back up damaged database; removing it");
            tokio::fs::remove_file(path).await?;
            Integrity::Repaired { backup: None }
        }
    };

    for suffix in ["-wal", "-shm"] {
        let sidecar = sidecar_path(path, suffix);
        if tokio::fs::remove_file(&sidecar).await.is_ok() {
            info!(path = %sidecar.display(), "Removed stale journal file");
        }
    }

    Ok(outcome)
}

async fn quick_check(path: &Path) -> Result<bool, sqlx::Error> {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(false)
        .connect()
        .await?;
    let result: String = sqlx::query_scalar("PRAGMA quick_check")
        .fetch_one(&mut conn)
        .await?;
    conn.close().await?;
    Ok(result.trim().eq_ignore_ascii_case("ok"))
}

fn backup_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    sidecar_path(path, &format!(".bak-{}", now.format("%Y%m%d%H%M%S")))
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}
