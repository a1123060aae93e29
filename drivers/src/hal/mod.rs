//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines the traits storage drivers implement so the disk
//! I/O adapter can be written without knowing which medium sits below it.
//!
//! # Design Principles
//!
//! - **One block per call**: drivers never see multi-block requests
//! - **No platform leakage**: traits must not reference platform-specific types
//!
//! # Available Interfaces
//!
//! - [`block_device`]: Block storage device access

pub mod block_device;
