//! In-memory transport used by the unit tests.

use crate::message::DisseminationMessage;
use denm_env::{BroadcastTransport, EnvError, Position, StationId, TrafficClass};
use std::sync::Mutex;

/// One broadcast as seen by the transport.
#[derive(Debug, Clone)]
pub struct Sent {
    pub message: DisseminationMessage,
    pub sender_position: Position,
    pub class: TrafficClass,
}

/// Captures every broadcast; optionally refuses them all.
pub struct CapturingTransport {
    local_id: StationId,
    sent: Mutex<Vec<Sent>>,
    closed: bool,
}

impl CapturingTransport {
    pub fn new(local_id: StationId) -> Self {
        Self {
            local_id,
            sent: Mutex::new(Vec::new()),
            closed: false,
        }
    }
    
    pub fn closed(local_id: StationId) -> Self {
        Self {
            closed: true,
            ..Self::new(local_id)
        }
    }
    
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
    
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl BroadcastTransport<DisseminationMessage> for CapturingTransport {
    fn broadcast_single_hop(
        &self,
        message: DisseminationMessage,
        sender_position: Position,
        class: TrafficClass,
    ) -> Result<(), EnvError> {
        if self.closed {
            return Err(EnvError::network("Channel closed"));
        }
        self.sent.lock().unwrap().push(Sent {
            message,
            sender_position,
            class,
        });
        Ok(())
    }
    
    fn local_id(&self) -> StationId {
        self.local_id
    }
}
