use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::listeners::{Listener, SlideEvent};

/// One event plus the listeners registered for it when it was triggered.
pub(crate) struct Dispatch {
    pub listeners: Vec<Listener>,
    pub event: SlideEvent,
}

/// Delivers events to listeners, one at a time, in the order they were
/// triggered. Runs on its own task so listeners never execute inside the
/// controller turn that produced the event.
pub(crate) async fn run(
    mut rx: UnboundedReceiver<Dispatch>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        select! {
            biased;
            _ = cancel.cancelled() => break,
            maybe = rx.recv() => match maybe {
                Some(dispatch) => deliver(dispatch),
                None => break,
            },
        }
    }
    debug!("listener dispatcher stopped");
    Ok(())
}

fn deliver(Dispatch { listeners, event }: Dispatch) {
    for listener in listeners {
        if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
            warn!(kind = ?event.kind, index = event.index, "listener panicked");
        }
    }
}
