//! Helper functions for UI operations.
//!
//! Spawning controller tasks in the background, panic capture, and opening
//! media links.

use crate::app::{App, AppEvent};
use cosmic::controller::Task;
use cosmic::util::validate_url_for_open;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Error message for posts without a media link
pub(super) const ERR_POST_NO_MEDIA: &str = "Post has no media link";

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of the task silently disappearing (caught by Tokio's runtime but
/// not handled), panics are converted to `Err(String)` containing the panic
/// message.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run each task on the runtime and deliver its outcome as
/// [`AppEvent::TaskFinished`].
///
/// Nothing is cancelled: a task whose view has been left still reports back,
/// and the controller decides what to do with it.
pub(super) fn spawn_tasks(app: &mut App, tasks: Vec<Task>, event_tx: &mpsc::Sender<AppEvent>) {
    for task in tasks {
        app.in_flight += 1;
        let api = app.controller.api().clone();
        let tx = event_tx.clone();
        let label = task.label();
        tracing::debug!(task = label, "Spawning task");

        tokio::spawn(async move {
            let event = match catch_task_panic(task.run(&api)).await {
                Ok(outcome) => AppEvent::TaskFinished(outcome),
                Err(panic_msg) => {
                    tracing::error!(task = label, error = %panic_msg, "Background task panicked");
                    AppEvent::TaskPanicked {
                        task: label,
                        error: panic_msg,
                    }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, task = label, "Channel send failed (receiver dropped)");
            }
        });
    }
}

/// Open the open post's media link in the system browser.
///
/// Only http/https links are handed to the opener.
pub(super) fn open_media(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(url) = app
        .controller
        .detail()
        .open_post()
        .and_then(|open| open.post.media_url())
        .map(str::to_string)
    else {
        app.set_status(ERR_POST_NO_MEDIA);
        return;
    };

    let url = match validate_url_for_open(&url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "Refusing to open media link");
            app.controller.error(format!("Cannot open link: {}", e));
            return;
        }
    };

    app.set_status("Opening in browser...");
    let tx = event_tx.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = open::that(url.as_str()) {
            tracing::warn!(error = %e, "Failed to open media link");
            let _ = tx.blocking_send(AppEvent::OpenFailed {
                error: e.to_string(),
            });
        }
    });
}
