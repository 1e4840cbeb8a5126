//! Background task event processing.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::helpers::spawn_tasks;

/// Apply one background event to application state.
///
/// Task outcomes go through the controller; any follow-up tasks it returns
/// (feed reloads after a mutation, panel refetches) are spawned right away.
pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::TaskFinished(outcome) => {
            app.in_flight = app.in_flight.saturating_sub(1);
            let follow_up = app.controller.apply(outcome).await;
            app.clamp_selections();
            spawn_tasks(app, follow_up, event_tx);
        }
        AppEvent::TaskPanicked { task, error } => {
            app.in_flight = app.in_flight.saturating_sub(1);
            tracing::error!(task, error = %error, "Background task panicked");
            app.controller
                .error(format!("Internal error in {} task", task));
        }
        AppEvent::OpenFailed { error } => {
            app.controller.error(format!("Failed to open link: {}", error));
        }
    }
}
