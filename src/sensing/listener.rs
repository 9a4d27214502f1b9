use std::sync::Arc;

use anyhow::Result;

use super::activity::ActivitySampler;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Starts the global keyboard/pointer hooks feeding `sampler`.
///
/// The hooks run on a dedicated thread for the lifetime of the process.
#[cfg(feature = "desktop")]
pub fn spawn_input_listener(sampler: Arc<ActivitySampler>) -> Result<()> {
    use crate::log_info;
    use anyhow::Context;
    use rdev::{listen, EventType};

    std::thread::Builder::new()
        .name("vibesync-input".into())
        .spawn(move || {
            log_info!("Input listener started");
            let result = listen(move |event| match event.event_type {
                EventType::KeyPress(_) => sampler.record_keypress(),
                EventType::MouseMove { x, y } => sampler.record_pointer_move(x, y),
                _ => {}
            });
            if let Err(err) = result {
                log_warn!("Input listener stopped: {err:?}");
            }
        })
        .context("failed to spawn input listener thread")?;
    Ok(())
}

#[cfg(not(feature = "desktop"))]
pub fn spawn_input_listener(sampler: Arc<ActivitySampler>) -> Result<()> {
    let _ = sampler;
    log_warn!("Built without the `desktop` feature; activity rates will read as zero");
    Ok(())
}
