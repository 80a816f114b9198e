// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Unix Platform Implementation
//!
//! POSIX implementation backing Linux and macOS, using `libc` and `/proc`
//! where available.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Unix platform implementation (Linux, macOS, and other POSIX systems).
pub struct UnixPlatform;

impl UnixPlatform {
    /// Create a new Unix platform instance.
    pub fn new() -> Self {
        Self
    }

    fn page_size_impl() -> usize {
        // SAFETY: sysconf with _SC_PAGESIZE never fails on POSIX systems.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            4096
        }
    }

    fn cpu_count_impl() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Reads `/proc/meminfo` for `MemTotal`/`MemAvailable`, in bytes. Linux-only;
    /// falls back to an error on other Unix systems (e.g. macOS) that lack it.
    fn meminfo() -> Result<(u64, u64), PlatformError> {
        let contents = std::fs::read_to_string("/proc/meminfo")
            .map_err(|e| PlatformError::NotSupported(format!("/proc/meminfo unavailable: {e}")))?;

        let mut total_kb = None;
        let mut available_kb = None;
        for line in contents.lines() {
            if let Some(rest) = line.strip_prefix("MemTotal:") {
                total_kb = parse_kb(rest);
            } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                available_kb = parse_kb(rest);
            }
        }

        match (total_kb, available_kb) {
            (Some(total), Some(available)) => Ok((total * 1024, available * 1024)),
            _ => Err(PlatformError::Other("could not parse /proc/meminfo".to_string())),
        }
    }

    fn is_elevated_impl() -> bool {
        // SAFETY: geteuid takes no arguments and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
}

fn parse_kb(rest: &str) -> Option<u64> {
    rest.trim().trim_end_matches(" kB").trim().parse().ok()
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        Self::page_size_impl()
    }

    fn cpu_count(&self) -> usize {
        Self::cpu_count_impl()
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::meminfo().map(|(total, _)| total)
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::meminfo().map(|(_, available)| available)
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        Self::is_elevated_impl()
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(PlatformError::Io)
    }

    fn is_executable(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_platform_basics() {
        let platform = UnixPlatform::new();
        assert!(platform.cpu_count() >= 1);
        let page_size = platform.page_size();
        assert!(page_size >= 512);
        assert!(page_size <= 65536);
    }

    #[test]
    fn test_unix_platform_constants() {
        let platform = UnixPlatform::new();
        assert_eq!(platform.line_separator(), "\n");
        assert_eq!(platform.path_separator(), ':');
    }

    #[test]
    fn test_temp_dir() {
        let platform = UnixPlatform::new();
        assert!(!platform.temp_dir().as_os_str().is_empty());
    }
}
