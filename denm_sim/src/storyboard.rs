//! Storyboard - timed effects that drive a run.
//!
//! A story targets one station at one instant and applies one or more
//! effects. Signals are delivered through the world's event queue straight
//! to the target agent's `on_trigger`; there is no global signal registry.

use denm_core::TriggerCause;
use denm_env::{SimTime, StationId};

/// Something that happens to a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Immobilize the vehicle
    Stop,
    
    /// Emit a trigger cause to the vehicle's middleware
    Signal(String),
}

/// One timed story.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub at: SimTime,
    pub target: StationId,
    pub effects: Vec<Effect>,
}

/// Ordered collection of stories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Storyboard {
    stories: Vec<Story>,
}

impl Storyboard {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Registers a story.
    pub fn register(&mut self, story: Story) {
        self.stories.push(story);
    }
    
    /// Crash scenario: the vehicle stops and raises `crash_incident` at once.
    pub fn crash(vehicle: StationId, at: SimTime) -> Self {
        let mut board = Self::new();
        board.register(Story {
            at,
            target: vehicle,
            effects: vec![
                Effect::Stop,
                Effect::Signal(TriggerCause::CrashIncident.as_str().to_string()),
            ],
        });
        board
    }
    
    /// Witness scenario: the accident vehicle stops silently, and the
    /// witness raises `witness_report` after its reaction delay.
    pub fn witness(
        accident_vehicle: StationId,
        witness: StationId,
        crash_at: SimTime,
        witness_delay: std::time::Duration,
    ) -> Self {
        let mut board = Self::new();
        board.register(Story {
            at: crash_at,
            target: accident_vehicle,
            effects: vec![Effect::Stop],
        });
        board.register(Story {
            at: crash_at + witness_delay,
            target: witness,
            effects: vec![Effect::Signal(TriggerCause::WitnessReport.as_str().to_string())],
        });
        board
    }
    
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }
    
    /// Time of the first signal effect, if any.
    pub fn first_signal_time(&self) -> Option<SimTime> {
        self.stories
            .iter()
            .filter(|s| s.effects.iter().any(|e| matches!(e, Effect::Signal(_))))
            .map(|s| s.at)
            .min()
    }
}
