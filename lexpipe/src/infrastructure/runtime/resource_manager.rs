// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Global resource governor: bounded semaphore "tokens" for CPU-bound
//! work, disk/database I/O, and the shared accelerator device.
//!
//! Adds a `gpu_tokens` class to the usual `cpu_tokens`/`io_tokens` pair:
//! the accelerator is a single shared device in the typical `M=1`
//! deployment, so embedder workers must acquire a GPU token before
//! calling the embedding service, the same way they acquire a CPU token
//! before a CPU-bound cleaning pass.

use lexpipe_domain::PipelineError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Governs how many GPU tokens are handed out by default; a single real
/// accelerator device should almost always set this to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratorProfile {
    /// One physical device: callers effectively serialize on it.
    SingleDevice,
    /// Multiple devices or a batched-server accelerator that can accept
    /// several in-flight batches.
    MultiDevice(usize),
}

impl AcceleratorProfile {
    fn token_count(self) -> usize {
        match self {
            AcceleratorProfile::SingleDevice => 1,
            AcceleratorProfile::MultiDevice(n) => n.max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceConfig {
    pub cpu_tokens: Option<usize>,
    pub io_tokens: Option<usize>,
    pub accelerator: AcceleratorProfile,
    pub memory_limit: Option<usize>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cpu_tokens: None,
            io_tokens: None,
            accelerator: AcceleratorProfile::SingleDevice,
            memory_limit: None,
        }
    }
}

/// Process-wide resource governor, shared via an `Arc` across every
/// worker task spawned by the orchestrator.
pub struct GlobalResourceManager {
    cpu_tokens: Arc<Semaphore>,
    io_tokens: Arc<Semaphore>,
    gpu_tokens: Arc<Semaphore>,
    memory_used: Arc<AtomicUsize>,
    memory_capacity: usize,
    cpu_token_count: usize,
    io_token_count: usize,
    gpu_token_count: usize,
}

impl GlobalResourceManager {
    pub fn new(config: ResourceConfig) -> Result<Self, PipelineError> {
        let available_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);

        let cpu_token_count = config.cpu_tokens.unwrap_or_else(|| available_cores.saturating_sub(1).max(1));
        let io_token_count = config.io_tokens.unwrap_or(12);
        let gpu_token_count = config.accelerator.token_count();

        if cpu_token_count == 0 || io_token_count == 0 || gpu_token_count == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "resource token counts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            cpu_tokens: Arc::new(Semaphore::new(cpu_token_count)),
            io_tokens: Arc::new(Semaphore::new(io_token_count)),
            gpu_tokens: Arc::new(Semaphore::new(gpu_token_count)),
            memory_used: Arc::new(AtomicUsize::new(0)),
            memory_capacity: config.memory_limit.unwrap_or(usize::MAX),
            cpu_token_count,
            io_token_count,
            gpu_token_count,
        })
    }

    pub async fn acquire_cpu(&self) -> Result<SemaphorePermit<'_>, PipelineError> {
        self.cpu_tokens
            .acquire()
            .await
            .map_err(|_| PipelineError::resource_exhausted("cpu token semaphore closed"))
    }

    pub async fn acquire_io(&self) -> Result<SemaphorePermit<'_>, PipelineError> {
        self.io_tokens
            .acquire()
            .await
            .map_err(|_| PipelineError::resource_exhausted("io token semaphore closed"))
    }

    /// Acquired by an embedder worker before calling the embedding
    /// service, so that at most `gpu_token_count` accelerator calls are
    /// in flight at once regardless of how many embedder workers (`M`)
    /// are configured.
    pub async fn acquire_gpu(&self) -> Result<SemaphorePermit<'_>, PipelineError> {
        self.gpu_tokens
            .acquire()
            .await
            .map_err(|_| PipelineError::resource_exhausted("gpu token semaphore closed"))
    }

    pub fn allocate_memory(&self, bytes: usize) -> Result<(), PipelineError> {
        let previous = self.memory_used.fetch_add(bytes, Ordering::SeqCst);
        if previous + bytes > self.memory_capacity {
            self.memory_used.fetch_sub(bytes, Ordering::SeqCst);
            return Err(PipelineError::resource_exhausted("memory capacity exceeded"));
        }
        Ok(())
    }

    pub fn deallocate_memory(&self, bytes: usize) {
        self.memory_used.fetch_sub(bytes, Ordering::SeqCst);
    }

    pub fn memory_used(&self) -> usize {
        self.memory_used.load(Ordering::SeqCst)
    }

    pub fn memory_capacity(&self) -> usize {
        self.memory_capacity
    }

    pub fn cpu_tokens_available(&self) -> usize {
        self.cpu_tokens.available_permits()
    }

    pub fn cpu_tokens_total(&self) -> usize {
        self.cpu_token_count
    }

    pub fn io_tokens_available(&self) -> usize {
        self.io_tokens.available_permits()
    }

    pub fn io_tokens_total(&self) -> usize {
        self.io_token_count
    }

    pub fn gpu_tokens_available(&self) -> usize {
        self.gpu_tokens.available_permits()
    }

    pub fn gpu_tokens_total(&self) -> usize {
        self.gpu_token_count
    }
}

static RESOURCE_MANAGER_CELL: OnceLock<GlobalResourceManager> = OnceLock::new();

/// Initializes the process-wide singleton. Must be called exactly once,
/// at bootstrap, before any worker task calls `resource_manager()`.
pub fn init_resource_manager(config: ResourceConfig) -> Result<(), String> {
    let manager = GlobalResourceManager::new(config).map_err(|e| e.to_string())?;
    RESOURCE_MANAGER_CELL
        .set(manager)
        .map_err(|_| "resource manager already initialized".to_string())
}

/// Returns the process-wide singleton.
///
/// # Panics
/// Panics if `init_resource_manager` was never called; this is a startup
/// invariant, not a runtime condition a worker task should handle.
pub fn resource_manager() -> &'static GlobalResourceManager {
    RESOURCE_MANAGER_CELL.get().expect("resource manager not initialized; call init_resource_manager at startup")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquires_and_releases_gpu_tokens() {
        let manager = GlobalResourceManager::new(ResourceConfig {
            accelerator: AcceleratorProfile::SingleDevice,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(manager.gpu_tokens_total(), 1);
        {
            let _permit = manager.acquire_gpu().await.unwrap();
            assert_eq!(manager.gpu_tokens_available(), 0);
        }
        assert_eq!(manager.gpu_tokens_available(), 1);
    }

    #[test]
    fn rejects_zero_token_counts() {
        let result = GlobalResourceManager::new(ResourceConfig {
            cpu_tokens: Some(0),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn memory_allocation_respects_capacity() {
        let manager = GlobalResourceManager::new(ResourceConfig {
            memory_limit: Some(100),
            ..Default::default()
        })
        .unwrap();
        assert!(manager.allocate_memory(60).is_ok());
        assert!(manager.allocate_memory(60).is_err());
        manager.deallocate_memory(60);
        assert!(manager.allocate_memory(40).is_ok());
    }

    #[test]
    fn multi_device_profile_yields_multiple_gpu_tokens() {
        let manager = GlobalResourceManager::new(ResourceConfig {
            accelerator: AcceleratorProfile::MultiDevice(3),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(manager.gpu_tokens_total(), 3);
    }
}
