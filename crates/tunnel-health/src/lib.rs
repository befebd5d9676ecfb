//! Health probe engine.
//!
//! Every probe runs on its own schedule and writes one part of a shared
//! [`HealthSnapshot`](tunnel_core::HealthSnapshot). Readers only ever see
//! the latest published values and never wait on a probe.

pub mod engine;
pub mod probes;

pub use engine::{EngineHandle, HealthBoard, HealthEngine};
pub use probes::{
    standard_probes, DownstreamProbe, LogProbe, NetworkProbe, ProcessProbe, UpstreamProbe,
};
