// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Listens for SIGTERM/SIGINT (and SIGHUP on Unix) and drives the
//! [`ShutdownCoordinator`](crate::shutdown::ShutdownCoordinator). The first
//! signal initiates graceful shutdown (writer buffers flush before exit);
//! a second signal is treated as an abrupt shutdown request and is left to
//! the caller to enforce by not waiting out the grace period.

use crate::shutdown::ShutdownCoordinator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Spawns a task that listens for termination signals and drives `coordinator`,
/// incrementing `received` on every signal.
///
/// `received` is shared with the caller so it can poll the count to
/// distinguish a first (graceful) signal from a second (abrupt) one, and
/// so the caller's own exit-code decision can tell a cancelled run apart
/// from one that completed or failed on its own.
pub fn install(coordinator: ShutdownCoordinator, received: Arc<AtomicUsize>) {
    tokio::spawn(async move {
        loop {
            wait_for_signal().await;
            let n = received.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                tracing::info!("received termination signal, initiating graceful shutdown");
                coordinator.initiate_shutdown();
            } else {
                tracing::warn!("received second termination signal, forcing abrupt shutdown");
                coordinator.complete_shutdown();
                break;
            }
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
        _ = sighup.recv() => {}
    }
}

#[cfg(windows)]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_install_leaves_counter_at_zero_with_no_signal() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let received = Arc::new(AtomicUsize::new(0));
        install(coordinator, received.clone());
        assert_eq!(received.load(Ordering::SeqCst), 0);
    }
}
