use std::{
    sync::{Arc, Mutex, MutexGuard},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use log::info;

use crate::{error::ValidationError, session::Session};

enum Control {
    Stop,
    Reschedule,
}

/// Drives a shared [`Session`] through repeated training ticks at the
/// session's cadence
///
/// The worker thread sleeps on a channel `recv_timeout`: a timeout runs one
/// [`training_tick`](Session::training_tick) under the session lock, while a
/// control message cancels the worker or re-arms the sleep after a cadence
/// change. Because ticks and manual commands both go through the same mutex,
/// they can never interleave, and a tick always observes a fully updated
/// Q-table.
///
/// The worker also exits on its own when a tick reports that the episode cap
/// has been reached.
pub struct Trainer {
    session: Arc<Mutex<Session>>,
    worker: Option<Worker>,
}

struct Worker {
    control: Sender<Control>,
    handle: JoinHandle<()>,
}

impl Trainer {
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self { session, worker: None }
    }

    /// Handle to the driven session
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Whether a worker is currently live
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.handle.is_finished())
    }

    /// Begin autonomous training
    ///
    /// If a worker is already live it is stopped and joined first, so
    /// restarting can never leave two timers ticking the same session.
    pub fn start(&mut self) {
        self.stop();

        lock(&self.session).set_auto_running(true);

        let session = Arc::clone(&self.session);
        let (control, ticks) = unbounded();
        let handle = thread::spawn(move || loop {
            let delay = lock(&session).action_delay();
            match ticks.recv_timeout(delay) {
                Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(Control::Reschedule) => continue,
                Err(RecvTimeoutError::Timeout) => {
                    if !lock(&session).training_tick() {
                        break;
                    }
                }
            }
        });

        self.worker = Some(Worker { control, handle });
        info!("autonomous training started");
    }

    /// Stop autonomous training
    ///
    /// Joins the worker before returning, so once this call completes no
    /// further tick can fire. Calling it while already idle is a no-op.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.control.send(Control::Stop);
            let _ = worker.handle.join();
            info!("autonomous training stopped");
        }
        lock(&self.session).set_auto_running(false);
    }

    /// Change the tick cadence, re-arming a live timer at the new delay
    ///
    /// The in-flight trajectory, episode count, epsilon, and Q-table are
    /// untouched; only the sleep restarts.
    pub fn set_action_delay(&mut self, delay_ms: u64) -> Result<(), ValidationError> {
        lock(&self.session).set_action_delay(delay_ms)?;
        if let Some(worker) = &self.worker {
            let _ = worker.control.send(Control::Reschedule);
        }
        Ok(())
    }
}

impl Drop for Trainer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<'a>(session: &'a Arc<Mutex<Session>>) -> MutexGuard<'a, Session> {
    session.lock().expect("session lock poisoned")
}
