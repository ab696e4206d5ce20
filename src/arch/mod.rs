//! # Architecture Abstraction Layer
//!
//! Platform collaborators for the dispatcher: clock sources and memory
//! signals. Currently implements the Cortex-M4 port; extensible to other
//! architectures by adding sibling modules.
//!
//! The port is only compiled for bare-metal ARM with the `rt` feature, since
//! it relies on the `cortex-m-rt` linker script. Host builds use
//! [`MockClock`](crate::clock::MockClock) and
//! [`MockMemory`](crate::memory::MockMemory) instead.

#[cfg(all(target_arch = "arm", target_os = "none", feature = "rt"))]
pub mod cortex_m4;
