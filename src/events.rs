//! The event-bus external collaborator (spec.md §6): a fire-and-forget
//! sink Nav posts radio-transmission and handoff events to. The teacher
//! has no event bus of its own, but `simulation/ai_pilot.rs` shows the
//! same "post and never check the reply" shape over the network; here
//! it happens in-process via `tracing`.

use serde::{Deserialize, Serialize};

/// Events Nav can emit. Closed, enumerable set (spec.md §9's guidance on
/// tagged unions for variant-identity-sensitive data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    RadioTransmission { aircraft: String, message: String },
    Handoff { aircraft: String, to_controller: String },
}

/// Fire-and-forget event sink. Implementations must never block or fail
/// visibly to the caller (spec.md §7: no error surfaces across the tick
/// boundary).
pub trait EventPoster: Send + Sync {
    fn post_event(&self, event: Event);
}

/// Logs every event via `tracing`, matching the density the teacher's
/// `ai_pilot.rs` uses for its own radio/handoff traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPoster;

impl EventPoster for TracingEventPoster {
    fn post_event(&self, event: Event) {
        match event {
            Event::RadioTransmission { aircraft, message } => {
                tracing::info!(aircraft = %aircraft, message = %message, "radio transmission");
            }
            Event::Handoff {
                aircraft,
                to_controller,
            } => {
                tracing::info!(aircraft = %aircraft, to_controller = %to_controller, "handoff");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_poster_accepts_both_variants_without_panicking() {
        let poster = TracingEventPoster;
        poster.post_event(Event::RadioTransmission {
            aircraft: "UAL123".to_string(),
            message: "going around".to_string(),
        });
        poster.post_event(Event::Handoff {
            aircraft: "UAL123".to_string(),
            to_controller: "NORCAL_APP".to_string(),
        });
    }
}
