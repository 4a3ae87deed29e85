//! DENM dissemination harness
//!
//! A deterministic discrete-event world in which the `denm_core` agents run:
//! vehicles on a road, roadside antennas and satellites as relays, and a
//! storyboard that crashes a vehicle at a fixed instant.
//!
//! # Core Principle: One Timeline
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual clock jumps from event to event, never wall time
//! - **Network**: Central router with range gating, per-sender latency and partitions
//! - **Randomness**: All entropy derived from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SimWorld                            │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ Event queue (time, seq) + SimContext virtual clock   │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       │                        │                            │
//! │  ┌────▼────┐              ┌────▼────┐                       │
//! │  │ node[i] │◄────────────►│antenna/ │     ...               │
//! │  │ vehicle │    Router    │satellite│                       │
//! │  └─────────┘              └─────────┘                       │
//! │       ▲                                                     │
//! │  ┌────┴──────────────┐   ┌──────────────┐                   │
//! │  │     Mobility      │   │  Storyboard  │                   │
//! │  │ (ground truth)    │   │ (stop/signal)│                   │
//! │  └───────────────────┘   └──────────────┘                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use denm_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_vehicles(20)
//!     .run(ScenarioId::CrashedTerrestrial)?;
//! println!("PDR: {:.1}%", result.summary.delivery_ratio * 100.0);
//! ```

mod agent;
mod context;
mod error;
mod exporter;
mod mobility;
mod network;
mod recorder;
mod runner;
pub mod scenarios;
mod storyboard;
mod summary;
mod world;

pub use agent::{SimulatedStation, StationKind};
pub use context::SimContext;
pub use error::SimError;
pub use exporter::SimExport;
pub use mobility::{MobileEntity, Mobility};
pub use network::{NetworkMessage, SimNetwork, SimNetworkController};
pub use recorder::{ScalarRow, ScalarStore};
pub use runner::{ScenarioResult, ScenarioRunner};
pub use scenarios::{Deployment, IncidentKind, InfrastructureProfile};
pub use storyboard::{Effect, Story, Storyboard};
pub use summary::{DelayStats, DisseminationSummary};
pub use world::{NetworkMetrics, SimConfig, SimWorld, WorldReport};
