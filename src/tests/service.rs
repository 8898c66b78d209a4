use crate::service::{Cancelled, Exit, Flow, LoopService, ServiceControl, ServiceId, StopSignal};
use anyhow::{bail, Result};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

/// Counts iterations, sleeping between them, until told to stop or
/// `limit` is reached
struct Ticker {
    starts: Arc<AtomicUsize>,
    ticks: Arc<AtomicUsize>,
    exits: Arc<AtomicUsize>,
    limit: Option<usize>,
    fail: bool,
}

impl Ticker {
    fn new(limit: Option<usize>) -> Self {
        Self {
            starts: Default::default(),
            ticks: Default::default(),
            exits: Default::default(),
            limit,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(None)
        }
    }
}

impl LoopService for Ticker {
    fn service_id(&self) -> ServiceId {
        "ticker".to_owned()
    }

    fn on_start(&mut self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn run_iteration(&mut self, stop: &StopSignal) -> Result<Flow> {
        if self.fail {
            bail!("ticker broke");
        }
        let ticks = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(ticks) == self.limit {
            return Ok(Flow::Finished);
        }
        Ok(match stop.sleep(Duration::from_millis(5)) {
            Ok(()) => Flow::Continue,
            Err(Cancelled) => Flow::Cancelled,
        })
    }

    fn on_exit(&mut self, _exit: Exit) -> Result<()> {
        self.exits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn sleep_completes_without_stop() {
    let stop = StopSignal::new();
    assert_eq!(stop.sleep(Duration::from_millis(1)), Ok(()));
    assert_eq!(stop.sleep(Duration::ZERO), Ok(()));
}

#[test]
fn stop_interrupts_sleep() -> Result<()> {
    let stop = StopSignal::new();

    let sleeper = thread::spawn({
        let stop = stop.clone();
        move || {
            let started = Instant::now();
            (stop.sleep(Duration::from_secs(30)), started.elapsed())
        }
    });

    thread::sleep(Duration::from_millis(20));
    stop.stop();

    let (res, elapsed) = sleeper.join().expect("join");
    assert_eq!(res, Err(Cancelled));
    assert!(elapsed < Duration::from_secs(10));
    assert!(stop.is_stopped());
    assert_eq!(stop.sleep(Duration::ZERO), Err(Cancelled));
    Ok(())
}

#[test]
fn finished_service_reports_finished() -> Result<()> {
    let svc_ctl = ServiceControl::new();
    let ticker = Ticker::new(Some(3));
    let (ticks, exits) = (ticker.ticks.clone(), ticker.exits.clone());

    let handle = svc_ctl.spawn_loop(ticker)?;
    assert!(svc_ctl.wait_idle(Duration::from_secs(10)));
    assert_eq!(handle.join()?, Exit::Finished);

    assert_eq!(ticks.load(Ordering::SeqCst), 3);
    assert_eq!(exits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn stop_all_cancels_running_services() -> Result<()> {
    let svc_ctl = ServiceControl::new();
    let first = Ticker::new(None);
    let second = Ticker::new(None);
    let exits = [first.exits.clone(), second.exits.clone()];

    let handles = vec![svc_ctl.spawn_loop(first)?, svc_ctl.spawn_loop(second)?];
    assert!(!svc_ctl.wait_idle(Duration::from_millis(30)));

    svc_ctl.stop_all();
    for handle in handles {
        assert_eq!(handle.join()?, Exit::Cancelled);
    }
    for exits in exits {
        assert_eq!(exits.load(Ordering::SeqCst), 1);
    }
    assert!(svc_ctl.wait_idle(Duration::ZERO));
    Ok(())
}

#[test]
fn services_spawned_after_stop_all_start_but_never_iterate() -> Result<()> {
    let svc_ctl = ServiceControl::new();
    svc_ctl.stop_all();

    let ticker = Ticker::new(None);
    let (starts, ticks, exits) = (
        ticker.starts.clone(),
        ticker.ticks.clone(),
        ticker.exits.clone(),
    );

    assert_eq!(svc_ctl.spawn_loop(ticker)?.join()?, Exit::Cancelled);
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(ticks.load(Ordering::SeqCst), 0);
    assert_eq!(exits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn failing_service_stops_the_others() -> Result<()> {
    let svc_ctl = ServiceControl::new();

    let healthy = svc_ctl.spawn_loop(Ticker::new(None))?;
    let broken = Ticker::failing();
    let broken_exits = broken.exits.clone();
    let broken = svc_ctl.spawn_loop(broken)?;

    assert!(svc_ctl.wait_idle(Duration::from_secs(10)));
    assert!(broken.join().is_err());
    // the failed service still got to wrap up
    assert_eq!(broken_exits.load(Ordering::SeqCst), 1);
    assert_eq!(healthy.join()?, Exit::Cancelled);
    Ok(())
}

#[test]
fn handle_stops_only_its_own_service() -> Result<()> {
    let svc_ctl = ServiceControl::new();

    let first = svc_ctl.spawn_loop(Ticker::new(None))?;
    let second = svc_ctl.spawn_loop(Ticker::new(None))?;

    first.stop();
    assert_eq!(first.join()?, Exit::Cancelled);
    assert!(!svc_ctl.wait_idle(Duration::from_millis(20)));

    // dropping the handle stops and joins the thread
    drop(second);
    assert!(svc_ctl.wait_idle(Duration::ZERO));
    Ok(())
}
