// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-wide runtime resource governance: CPU/IO/GPU token semaphores
//! shared by every worker pool in a `process-pipeline` run.

pub mod resource_manager;

pub use resource_manager::{AcceleratorProfile, GlobalResourceManager, ResourceConfig};
