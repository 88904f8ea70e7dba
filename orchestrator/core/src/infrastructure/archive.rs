// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Gzip-compressed tar archives of server directories.
//!
//! The tar work is blocking and runs on tokio's blocking pool. Entries are
//! stored relative to the archived directory, in file-name order, so an
//! archive extracts straight back into a server directory.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use walkdir::WalkDir;

/// Archive everything under `source` into `destination`, returning the
/// archive size in bytes. A partially written archive is left in place on
/// failure.
pub async fn archive_directory(source: PathBuf, destination: PathBuf) -> io::Result<u64> {
    run_blocking(move || pack(&source, &destination)).await
}

/// Remove the contents of `target` (keeping the directory itself) and
/// extract `archive` into it.
pub async fn restore_directory(archive: PathBuf, target: PathBuf) -> io::Result<()> {
    run_blocking(move || {
        clear_directory(&target)?;
        unpack(&archive, &target)
    })
    .await
}

async fn run_blocking<T, F>(work: F) -> io::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| io::Error::other(format!("archive task panicked: {}", e)))?
}

fn pack(source: &Path, destination: &Path) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(destination)?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::other(e.to_string()))?;

        if entry.file_type().is_dir() {
            builder.append_dir(relative, entry.path())?;
        } else {
            builder.append_path_with_name(entry.path(), relative)?;
        }
    }

    let file = builder.into_inner()?.finish()?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}

fn unpack(archive: &Path, target: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.unpack(target)
}

fn clear_directory(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
