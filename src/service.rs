pub mod shopper;

pub use self::shopper::*;
use anyhow::{bail, format_err, Result};
use parking_lot::{Condvar, Mutex};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::{debug, warn};

pub type ServiceId = String;

/// Cooperative stop request observed at a suspend point
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("cancelled")]
pub struct Cancelled;

/// What a service wants after one iteration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished,
    Cancelled,
}

/// How a service loop terminated
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    Finished,
    Cancelled,
}

/// A service that is a loop that does something
pub trait LoopService: Send {
    fn service_id(&self) -> ServiceId;

    /// One step of the loop
    ///
    /// Long waits inside should go through `stop` so they end as soon
    /// as the service is asked to stop.
    fn run_iteration(&mut self, stop: &StopSignal) -> Result<Flow>;

    /// Called once before the first iteration, even when the service
    /// was asked to stop before it got to run
    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called exactly once, after the last iteration
    ///
    /// If `on_start` or an iteration failed, this still runs (with
    /// `Exit::Cancelled`) before the error is returned.
    fn on_exit(&mut self, exit: Exit) -> Result<()>;
}

#[derive(Debug, Default)]
struct StopInner {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

/// A stop flag that sleeping threads can be woken up by
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        *self.inner.stopped.lock() = true;
        self.inner.condvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Sleep for `duration`, or until stopped, whichever comes first
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let mut stopped = self.inner.stopped.lock();

        if let Some(deadline) = Instant::now().checked_add(duration) {
            while !*stopped {
                if self
                    .inner
                    .condvar
                    .wait_until(&mut stopped, deadline)
                    .timed_out()
                {
                    break;
                }
            }
        } else {
            while !*stopped {
                self.inner.condvar.wait(&mut stopped);
            }
        }

        if *stopped {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct Registry {
    stopped: bool,
    signals: Vec<StopSignal>,
}

#[derive(Default)]
struct Running {
    count: Mutex<usize>,
    condvar: Condvar,
}

/// Counts a service as running until dropped
struct RunningGuard(Arc<Running>);

impl RunningGuard {
    fn new(running: Arc<Running>) -> Self {
        *running.count.lock() += 1;
        Self(running)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        *self.0.count.lock() -= 1;
        self.0.condvar.notify_all();
    }
}

/// Service execution control instance
///
/// Every service runs as a loop on its own thread, and we would like to
/// be able to gracefully terminate all of them, and handle a top-level
/// error of any of them by gracefully stopping everything else.
#[derive(Clone, Default)]
pub struct ServiceControl {
    registry: Arc<Mutex<Registry>>,
    running: Arc<Running>,
}

impl ServiceControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every service, including ones spawned later, to stop
    pub fn stop_all(&self) {
        let mut registry = self.registry.lock();
        registry.stopped = true;
        for signal in &registry.signals {
            signal.stop();
        }
    }

    fn register(&self) -> StopSignal {
        let signal = StopSignal::new();
        let mut registry = self.registry.lock();
        if registry.stopped {
            signal.stop();
        }
        registry.signals.push(signal.clone());
        signal
    }

    /// Block until no spawned service is running, or `timeout` elapses
    ///
    /// Returns `true` if everything finished in time.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let mut count = self.running.count.lock();
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while *count > 0 {
                self.running.condvar.wait(&mut count);
            }
            return true;
        };

        while *count > 0 {
            if self
                .running
                .condvar
                .wait_until(&mut count, deadline)
                .timed_out()
            {
                return *count == 0;
            }
        }
        true
    }

    /// Start a new service as a loop
    ///
    /// This will take care of checking the stop condition before every
    /// iteration and handling any errors (or panics) of the service by
    /// stopping all the other ones.
    pub fn spawn_loop(&self, mut service: impl LoopService + 'static) -> Result<JoinHandle> {
        let service_id = service.service_id();
        let stop = self.register();
        let running = RunningGuard::new(self.running.clone());

        let thread = thread::Builder::new().name(service_id.clone()).spawn({
            let svc_ctl = self.clone();
            let stop = stop.clone();
            move || {
                let _running = running;
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    run_loop(&mut service, &stop)
                })) {
                    Err(_e) => {
                        svc_ctl.stop_all();
                        bail!("service {service_id} panicked");
                    }
                    Ok(Err(e)) => {
                        warn!(%service_id, error = %e, "service failed, stopping all");
                        svc_ctl.stop_all();
                        Err(e)
                    }
                    Ok(res) => res,
                }
            }
        })?;

        Ok(JoinHandle::new(stop, thread))
    }
}

fn run_loop(service: &mut dyn LoopService, stop: &StopSignal) -> Result<Exit> {
    let exit = match run_iterations(service, stop) {
        Ok(exit) => exit,
        Err(e) => {
            if let Err(exit_err) = service.on_exit(Exit::Cancelled) {
                warn!(service_id = %service.service_id(), error = %exit_err, "on_exit failed");
            }
            return Err(e);
        }
    };

    debug!(service_id = %service.service_id(), ?exit, "service loop done");
    service.on_exit(exit)?;
    Ok(exit)
}

fn run_iterations(service: &mut dyn LoopService, stop: &StopSignal) -> Result<Exit> {
    service.on_start()?;

    loop {
        if stop.is_stopped() {
            return Ok(Exit::Cancelled);
        }

        match service.run_iteration(stop)? {
            Flow::Continue => {}
            Flow::Finished => return Ok(Exit::Finished),
            Flow::Cancelled => return Ok(Exit::Cancelled),
        }
    }
}

/// Simple thread join wrapper that stops and joins the thread on drop
pub struct JoinHandle {
    stop: StopSignal,
    thread: Option<thread::JoinHandle<Result<Exit>>>,
}

impl JoinHandle {
    fn new(stop: StopSignal, handle: thread::JoinHandle<Result<Exit>>) -> Self {
        JoinHandle {
            stop,
            thread: Some(handle),
        }
    }

    /// Ask only this service to stop
    #[cfg(test)]
    pub fn stop(&self) {
        self.stop.stop();
    }

    fn join_mut(&mut self) -> Result<Option<Exit>> {
        if let Some(h) = self.thread.take() {
            Ok(Some(
                h.join().map_err(|e| format_err!("join failed: {:?}", e))??,
            ))
        } else {
            Ok(None)
        }
    }

    pub fn join(mut self) -> Result<Exit> {
        self.join_mut()?
            .ok_or_else(|| format_err!("service already joined"))
    }
}

impl Drop for JoinHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop.stop();
            if let Err(e) = self.join_mut() {
                warn!(error = %e, "service ended with an error");
            }
        }
    }
}
