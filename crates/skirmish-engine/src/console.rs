//! Console-side background tasks: the periodic board printout and the
//! Ctrl-C watcher.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use skirmish_agents::Agent;
use skirmish_core::control::{SimulationControl, SimulationEndReason};
use skirmish_core::render::render_grid;
use skirmish_types::Bounds;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Print the board to `out` every `interval` until the run stops.
///
/// Returns the number of frames written.
pub async fn render_loop<W: Write + Send>(
    mut out: W,
    agents: Arc<[Arc<Agent>]>,
    bounds: Bounds,
    cells: u32,
    interval: Duration,
    control: Arc<SimulationControl>,
) -> u64 {
    let mut frames: u64 = 0;
    loop {
        let frame = render_grid(&agents, bounds, cells);
        if let Err(err) = writeln!(out, "{frame}").and_then(|()| out.flush()) {
            warn!(error = %err, "Board render failed, stopping render task");
            break;
        }
        frames = frames.saturating_add(1);
        if control.sleep_or_stop(interval).await {
            break;
        }
    }
    frames
}

/// Wait for the render task. Returns the frame count, or `None` if the task
/// panicked or was cancelled.
pub async fn join_renderer(handle: JoinHandle<u64>) -> Option<u64> {
    match handle.await {
        Ok(frames) => {
            info!(frames, "Board render stopped");
            Some(frames)
        }
        Err(err) => {
            warn!(error = %err, "Board render task failed");
            None
        }
    }
}

/// Finish the run with [`SimulationEndReason::OperatorStop`] on Ctrl-C.
///
/// The task exits on its own once the run stops for any other reason.
pub fn spawn_interrupt_watcher(control: Arc<SimulationControl>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    info!("Interrupt received, stopping simulation");
                    control.finish(SimulationEndReason::OperatorStop).await;
                }
                Err(err) => warn!(error = %err, "Unable to listen for interrupt"),
            },
            () = control.stopped() => {}
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skirmish_core::config::SimulationBoundsConfig;
    use skirmish_types::{Kind, Position};

    use super::*;

    fn control() -> Arc<SimulationControl> {
        Arc::new(SimulationControl::new(&SimulationBoundsConfig {
            max_ticks: 0,
            max_real_time_seconds: 0,
            stop_when_one_kind_left: false,
        }))
    }

    #[tokio::test]
    async fn stopped_run_renders_one_frame() {
        let agents: Arc<[Arc<Agent>]> =
            vec![Arc::new(Agent::new(Kind::Elf, Position::new(0, 0)))].into();
        let control = control();
        control.request_stop();

        let mut out = Vec::new();
        let frames = render_loop(
            &mut out,
            agents,
            Bounds::new(10, 10),
            2,
            Duration::from_secs(1),
            control,
        )
        .await;

        assert_eq!(frames, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "[E][ ]\n[ ][ ]\n\n");
    }

    #[tokio::test(start_paused = true)]
    async fn renders_every_interval_until_stop() {
        let agents: Arc<[Arc<Agent>]> = Vec::new().into();
        let control = control();
        let task = tokio::spawn(render_loop(
            std::io::sink(),
            agents,
            Bounds::new(10, 10),
            1,
            Duration::from_millis(100),
            Arc::clone(&control),
        ));

        tokio::time::sleep(Duration::from_millis(350)).await;
        control.request_stop();
        assert_eq!(task.await.unwrap(), 4);
    }

    #[allow(clippy::panic)]
    fn crashing_frame_count() -> u64 {
        panic!("render crashed")
    }

    #[tokio::test]
    async fn failed_render_task_is_reported() {
        let finished = tokio::spawn(async { 7_u64 });
        assert_eq!(join_renderer(finished).await, Some(7));

        let crashed = tokio::spawn(async { crashing_frame_count() });
        assert_eq!(join_renderer(crashed).await, None);
    }

    #[tokio::test]
    async fn watcher_exits_when_run_stops() {
        let control = control();
        let watcher = spawn_interrupt_watcher(Arc::clone(&control));
        control.finish(SimulationEndReason::LastKindStanding).await;
        watcher.await.unwrap();
        assert_eq!(
            control.end_reason().await,
            Some(SimulationEndReason::LastKindStanding)
        );
    }
}
