use evac_models::{Envelope, ScreenRoute};
use tracing::{info, instrument, warn};

use super::radio::RadioFramer;
use crate::state::AppState;

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub radio_invoked: bool,
    pub radio_ok: Option<bool>,
}

/// §4.9: two independent push emissions, then a presence check that gates
/// the radio fallback. The radio is invoked **after** the targeted push
/// and only against the presence snapshot taken at this moment — a
/// subscriber joining mid-cycle gets no back-fill (§5 ordering guarantee).
#[instrument(skip(state, routes), fields(floor_id = %floor_id))]
pub async fn dispatch(state: &AppState, floor_id: &str, floor_name: &str, routes: Vec<ScreenRoute>) -> DispatchOutcome {
    let envelope = Envelope::new(floor_id.to_string(), floor_name.to_string(), routes);

    state.event_bus.emit_to_floor(envelope.clone());
    state.event_bus.emit_global(envelope.clone());

    if state.presence.has_subscribers(floor_id).await {
        info!("floor has live subscribers; radio fallback skipped");
        return DispatchOutcome::default();
    }

    info!("no live subscribers for floor; invoking radio fallback");
    let framer = RadioFramer::new(state.config.clone());
    match framer.transmit(&envelope).await {
        Ok(outcome) => DispatchOutcome {
            radio_invoked: true,
            radio_ok: Some(outcome.ok),
        },
        Err(e) => {
            warn!(error = %e, "radio fallback failed; cycle continues for other floors");
            DispatchOutcome {
                radio_invoked: true,
                radio_ok: Some(false),
            }
        }
    }
}
