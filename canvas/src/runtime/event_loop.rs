//! Timer-driven tick loop with graceful signal handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::info;

use crate::interaction::{ElementLayout, InteractionEvent};

use super::session::{CameraSource, Session, SessionError};

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Loop options.
#[derive(Debug, Clone, Default)]
pub struct LoopConfig {
    /// Stop after this long.
    pub exit_after: Option<Duration>,
    /// Stop when a finite camera has been fully consumed.
    pub stop_when_finished: bool,
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    ExitAfter,
    Finished,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::ExitAfter => "exit-after",
            Self::Finished => "finished",
        }
    }
}

struct LoopData<'a, C: CameraSource> {
    session: &'a mut Session<C>,
    layout: &'a ElementLayout,
    clock: Instant,
    /// Events from ticks run during the last dispatch.
    pending: Vec<Vec<InteractionEvent>>,
}

/// Drive `session` from a timer at its target rate until a stop condition.
///
/// `on_tick` is called once per taken tick with that tick's events.
pub fn run_event_loop<C, F>(
    session: &mut Session<C>,
    layout: &ElementLayout,
    config: &LoopConfig,
    mut on_tick: F,
) -> Result<StopReason, SessionError>
where
    C: CameraSource,
    F: FnMut(&Session<C>, &[InteractionEvent]),
{
    let interval = Duration::from_secs_f64(session.gate().interval_ms() / 1000.0);
    let mut event_loop: EventLoop<LoopData<C>> = EventLoop::try_new()?;

    event_loop
        .handle()
        .insert_source(Timer::immediate(), move |deadline, _, data| {
            let now_ms = data.clock.elapsed().as_secs_f64() * 1000.0;
            if let Some(events) = data.session.tick(now_ms, data.layout) {
                data.pending.push(events);
            }
            TimeoutAction::ToInstant(deadline + interval)
        })
        .map_err(|e| SessionError::EventLoop(e.error))?;

    let mut data = LoopData {
        session,
        layout,
        clock: Instant::now(),
        pending: Vec::new(),
    };
    info!(
        "entering tick loop ({:.1}ms interval)",
        interval.as_secs_f64() * 1000.0
    );

    let reason = loop {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("shutdown signal received, exiting");
            break StopReason::Signal;
        }
        if let Some(limit) = config.exit_after {
            if data.clock.elapsed() >= limit {
                info!("exit timer fired after {:.1}s", limit.as_secs_f64());
                break StopReason::ExitAfter;
            }
        }
        if config.stop_when_finished && data.session.is_finished() {
            info!("input finished");
            break StopReason::Finished;
        }

        event_loop.dispatch(Some(interval), &mut data)?;
        for events in data.pending.drain(..) {
            on_tick(&*data.session, &events);
        }
    };

    info!("tick loop stopped ({})", reason.as_str());
    Ok(reason)
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use crate::hand::landmarks::fixtures;
    use crate::interaction::Mode;
    use crate::runtime::replay::{format_frame, Recording};

    fn replay_session(lines: &[String]) -> Session<crate::runtime::ReplayCamera> {
        let (camera, detector) = Recording::parse(&lines.join("\n")).unwrap().into_sources();
        Session::start(camera, detector, CanvasConfig::default()).unwrap()
    }

    #[test]
    fn test_replay_runs_to_completion() {
        let mut lines = Vec::new();
        for i in 0..8 {
            let hand = fixtures::with_pinch_ratio(0.4 + i as f32 * 0.02, 0.5, 0.05);
            lines.push(format_frame(i as f64 * 33.0, Some(&hand)));
        }
        lines.push(format_frame(264.0, None));

        let mut session = replay_session(&lines);
        let config = LoopConfig {
            exit_after: Some(Duration::from_secs(10)),
            stop_when_finished: true,
        };
        let mut finished = 0;
        let reason = run_event_loop(&mut session, &ElementLayout::new(), &config, |_, events| {
            finished += events
                .iter()
                .filter(|e| matches!(e, InteractionEvent::StrokeFinished { .. }))
                .count();
        })
        .unwrap();

        assert_eq!(reason, StopReason::Finished);
        assert_eq!(finished, 1);
        assert_eq!(session.state().mode(), Mode::Idle);
        assert_eq!(session.state().strokes().paths().len(), 1);
    }

    #[test]
    fn test_exit_after() {
        let lines = vec![format_frame(0.0, None)];
        let mut session = replay_session(&lines);
        let config = LoopConfig {
            exit_after: Some(Duration::from_millis(150)),
            stop_when_finished: false,
        };
        let mut ticks = 0;
        let reason =
            run_event_loop(&mut session, &ElementLayout::new(), &config, |_, _| ticks += 1).unwrap();
        assert_eq!(reason, StopReason::ExitAfter);
        assert!(ticks >= 1);
    }
}
