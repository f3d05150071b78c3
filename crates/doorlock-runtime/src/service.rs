//! Single-owner lock service.
//!
//! The [`LockService`] task owns the [`Controller`] and is the only code that
//! ever mutates it. Keypad presses, admin shortcuts, fingerprint injection
//! and snapshot requests arrive on one bounded command channel; the 1 Hz
//! clock is an interval in the same `select!` loop. Both sources are
//! therefore serialized, and every event sees the effects of the previous
//! one. A third branch republishes the snapshot when a buzzer pulse ends, so
//! subscribers see `buzzer_active` clear without waiting for the next tick.
//!
//! ```text
//! ┌──────────────┐  Command   ┌─────────────────────┐
//! │ ServiceHandle│───────────►│                     │
//! │ (any task)   │   (mpsc)   │  LockService task   │   Snapshot
//! └──────────────┘            │  owns Controller    │──────────────► watch
//!                             │                     │   subscribers
//! ┌──────────────┐   Tick     │                     │
//! │ interval(1s) │───────────►│                     │
//! └──────────────┘            └─────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use doorlock_core::{KeypadInput, LockConfig};
//! use doorlock_runtime::{LockService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> doorlock_runtime::Result<()> {
//!     let handle = LockService::spawn(LockConfig::default(), ServiceConfig::default())?;
//!
//!     handle.seed().await?;
//!     handle.press(KeypadInput::Confirm).await?;
//!
//!     let snapshot = handle.snapshot().await?;
//!     println!("{}", snapshot.display);
//!
//!     handle.shutdown().await
//! }
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use doorlock_controller::{Controller, Dispatch, Snapshot};
use doorlock_core::constants::TICK_PERIOD_MS;
use doorlock_core::{FingerprintReading, KeypadInput, LockConfig};

use crate::error::{Result, ServiceError};

/// Runtime settings for the service task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Capacity of the command channel.
    pub command_capacity: usize,

    /// Clock period; the controller expects one tick per second.
    pub tick_period: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_capacity: 100,
            tick_period: Duration::from_millis(TICK_PERIOD_MS),
        }
    }
}

impl ServiceConfig {
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    /// Zero is raised to one millisecond.
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period.max(Duration::from_millis(1));
        self
    }
}

/// Request sent to the service task.
#[derive(Debug)]
pub enum Command {
    /// Keypad press; replies with what the controller did.
    Key {
        key: KeypadInput,
        reply: oneshot::Sender<Dispatch>,
    },

    /// Set the next fingerprint capture result.
    InjectFingerprint(FingerprintReading),

    /// Load the built-in test users; replies with how many were stored.
    Seed { reply: oneshot::Sender<usize> },

    /// Power-cycle the simulator.
    Reset { reply: oneshot::Sender<()> },

    /// Request a fresh snapshot.
    Snapshot { reply: oneshot::Sender<Snapshot> },

    /// Stop the service task.
    Shutdown,
}

/// Async owner of a [`Controller`].
pub struct LockService {
    controller: Controller,
    config: ServiceConfig,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Snapshot>,
}

impl LockService {
    /// Build a controller from `lock` and start serving it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Controller` if `lock` fails validation.
    pub fn spawn(lock: LockConfig, config: ServiceConfig) -> Result<ServiceHandle> {
        let controller = Controller::new(lock)?;
        Ok(Self::start(controller, config))
    }

    /// Start serving an existing controller.
    pub fn start(controller: Controller, config: ServiceConfig) -> ServiceHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let service = Self {
            controller,
            config,
            commands: command_rx,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(service.run());

        ServiceHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    async fn run(mut self) {
        let mut clock = time::interval(self.config.tick_period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        clock.tick().await;

        info!(
            "Lock service started (tick every {}ms)",
            self.config.tick_period.as_millis()
        );

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.execute(command),
                },

                _ = clock.tick() => {
                    self.controller.tick();
                    self.publish();
                }

                _ = Self::pulse_end(self.controller.buzzer().expires_at()) => {
                    debug!("Buzzer pulse ended");
                    self.publish();
                }
            }
        }

        info!("Lock service stopped");
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Key { key, reply } => {
                let dispatch = self.controller.press(key);
                debug!("Key {} -> {:?}", key, dispatch);
                self.publish();
                Self::respond(reply, dispatch, "key");
            }
            Command::InjectFingerprint(reading) => {
                self.controller.inject_fingerprint(reading);
            }
            Command::Seed { reply } => {
                let stored = self.controller.seed_credentials();
                self.publish();
                Self::respond(reply, stored, "seed");
            }
            Command::Reset { reply } => {
                self.controller.reset();
                self.publish();
                Self::respond(reply, (), "reset");
            }
            Command::Snapshot { reply } => {
                Self::respond(reply, self.controller.snapshot(), "snapshot");
            }
            Command::Shutdown => {}
        }
    }

    /// Completes when the buzzer pulse ending at `expiry` is over; never
    /// completes if the buzzer is silent.
    async fn pulse_end(expiry: Option<Instant>) {
        match expiry {
            Some(expiry) => time::sleep_until(expiry).await,
            None => std::future::pending().await,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }

    fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &str) {
        if reply.send(value).is_err() {
            warn!("Caller went away before the {} reply", command);
        }
    }
}

/// Handle to a running [`LockService`].
///
/// Dropping the handle closes the command channel and stops the task.
#[derive(Debug)]
pub struct ServiceHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// Press a keypad key.
    pub async fn press(&self, key: KeypadInput) -> Result<Dispatch> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Key { key, reply }).await?;
        rx.await.map_err(|_| ServiceError::no_reply("key"))
    }

    /// Set what the next fingerprint capture reports.
    pub async fn inject_fingerprint(&self, reading: FingerprintReading) -> Result<()> {
        self.send(Command::InjectFingerprint(reading)).await
    }

    /// Load the built-in test users.
    pub async fn seed(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Seed { reply }).await?;
        rx.await.map_err(|_| ServiceError::no_reply("seed"))
    }

    /// Power-cycle the simulator.
    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reset { reply }).await?;
        rx.await.map_err(|_| ServiceError::no_reply("reset"))
    }

    /// Take a snapshot after every previously sent command has run.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| ServiceError::no_reply("snapshot"))
    }

    /// Most recently published snapshot, without a round trip.
    pub fn latest(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every mutation, every tick and the end of
    /// every buzzer pulse.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stop the service and wait for the task to finish.
    pub async fn shutdown(self) -> Result<()> {
        if self.commands.send(Command::Shutdown).await.is_err() {
            debug!("Service already stopped");
        }
        self.task.await?;
        Ok(())
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ServiceError::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_controller::ControllerState;
    use doorlock_core::FingerprintOutcome;

    async fn type_keys(handle: &ServiceHandle, keys: &str) {
        for c in keys.chars() {
            handle.press(KeypadInput::from_char(c).unwrap()).await.unwrap();
        }
    }

    fn spawn_default() -> ServiceHandle {
        LockService::spawn(LockConfig::default(), ServiceConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_and_auto_lock() {
        let handle = spawn_default();
        assert_eq!(handle.seed().await.unwrap(), 2);

        type_keys(&handle, "o111111o").await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::Unlocking);
        assert!(snapshot.motor_engaged);
        assert_eq!(snapshot.unlock_seconds_remaining, 5);

        time::sleep(Duration::from_millis(5_500)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::Standby);
        assert!(!snapshot.motor_engaged);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_expires() {
        let handle = spawn_default();
        type_keys(&handle, "o1o2o3o").await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::Locked);
        assert_eq!(snapshot.lockout_seconds_remaining, 60);

        assert_eq!(
            handle.press(KeypadInput::Confirm).await.unwrap(),
            Dispatch::Ignored
        );

        time::sleep(Duration::from_millis(60_500)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::Standby);
        assert_eq!(snapshot.error_count, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fingerprint_settles() {
        let handle = spawn_default();
        type_keys(&handle, "of").await;
        handle
            .inject_fingerprint(FingerprintReading::new(FingerprintOutcome::Match, 12u8))
            .await
            .unwrap();
        handle.press(KeypadInput::Confirm).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::FingerprintCapture);
        assert_eq!(snapshot.lines()[2], "ID:12");

        time::sleep(Duration::from_millis(10_500)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::AwaitingPassword);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_publishes_changes() {
        let handle = spawn_default();
        let mut updates = handle.subscribe();
        assert_eq!(updates.borrow_and_update().state, ControllerState::Standby);

        handle.press(KeypadInput::Confirm).await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(
            updates.borrow_and_update().state,
            ControllerState::AwaitingPassword
        );
        assert_eq!(handle.latest().state, ControllerState::AwaitingPassword);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_buzzer_clears_between_ticks() {
        let handle = spawn_default();
        type_keys(&handle, "o12o").await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.error_count, 1);
        assert!(snapshot.buzzer_active);
        assert!(handle.latest().buzzer_active);

        time::sleep(Duration::from_millis(400)).await;
        assert!(!handle.latest().buzzer_active);
        assert_eq!(handle.latest().uptime, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_doorbell_held_until_pulse_ends() {
        let handle = spawn_default();
        let mut updates = handle.subscribe();
        handle.press(KeypadInput::Cancel).await.unwrap();
        assert!(updates.borrow_and_update().buzzer_active);

        time::sleep(Duration::from_millis(600)).await;
        assert!(handle.latest().buzzer_active);

        updates.changed().await.unwrap();
        assert!(!updates.borrow_and_update().buzzer_active);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let handle = spawn_default();
        handle.seed().await.unwrap();
        type_keys(&handle, "o12").await;

        handle.reset().await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ControllerState::Standby);
        assert_eq!(snapshot.user_count, 0);
        assert_eq!(snapshot.logs.len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = LockService::spawn(
            LockConfig::default().log_capacity(0),
            ServiceConfig::default(),
        );
        assert!(matches!(result, Err(ServiceError::Controller(_))));
    }

    #[tokio::test]
    async fn test_commands_after_shutdown_fail() {
        let handle = spawn_default();
        let commands = handle.commands.clone();
        handle.shutdown().await.unwrap();

        let (reply, _rx) = oneshot::channel();
        assert!(commands.send(Command::Snapshot { reply }).await.is_err());
    }
}
