//! # aux-mount
//!
//! Alt-azimuth telescope mount control over the AUX bus, with an adaptive
//! alignment model and predictive tracking.
//!
//! ## Features
//!
//! - **Self-selecting alignment**: identity, single-point rotation, SVD
//!   rotation, then a 4- or 6-parameter mechanical model (index offset,
//!   cone error, non-perpendicularity) as points accumulate
//! - **Coverage-aware thinning**: alignment points are bucketed by sky
//!   sector and the worst-fitting point in a full sector is evicted
//! - **Anti-backlash GoTo**: fixed or tracking-direction approach legs,
//!   limit checks before any motion
//! - **Predictive tracking**: centred-difference rates sent as guide rates
//!   once per second, cancellable at any point
//! - **no_std compatible core**: the alignment and transform math builds
//!   without the standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aux_mount::{CoordSetMode, Mount, StreamTransport, Target};
//! use aux_mount::config::units::{Degrees, Hours};
//!
//! let transport = StreamTransport::connect("1.2.3.4:2000", Duration::from_secs(1)).await?;
//! let mount = Mount::builder(transport)
//!     .config_file("mount.toml")?
//!     .build()?;
//!
//! // Vega
//! let target = Target::sidereal(Hours(18.6156), Degrees(38.7836));
//! mount.goto_equatorial(target, CoordSetMode::Track).await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): async mount control, TOML loading, `tracing` logs
//! - `defmt`: derives `defmt::Format` on small state enums for embedded logging

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod alignment;
pub mod config;
pub mod error;
pub mod motion;
pub mod protocol;
pub mod transform;

// Async mount control (std only)
#[cfg(feature = "std")]
pub mod mount;

// Re-exports for ergonomic API
pub use alignment::{AlignmentModel, AlignmentPoint, AlignmentStatus, ModelTier, PointDisposition};
pub use config::{validate_config, MountConfig};
pub use error::{Error, Result};
pub use motion::{Axis, CoordSetMode, EncoderPosition, GotoState, OperationState};
pub use protocol::{AuxCommand, CommandCode, DeviceId};
pub use transform::{AstronomicalOracle, CoordinateTransformPipeline, EquatorialCoord, SiderealOracle, Target};

#[cfg(feature = "std")]
pub use mount::{CoordSetOutcome, Mount, MountBuilder, MountStatus, MountTransport, StreamTransport};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Degrees, Hours, Steps, StepsPerSec};
