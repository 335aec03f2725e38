//! Interval scheduler task

use super::Shared;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SchedulerCommand {
    Run { interval: Duration },
    Stop,
}

pub(super) struct SchedulerHandle {
    commands: watch::Sender<SchedulerCommand>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub(super) fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let (commands, receiver) = watch::channel(SchedulerCommand::Run { interval });
        let task = tokio::spawn(run_scheduler(shared, receiver));
        Self { commands, task }
    }

    pub(super) fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    pub(super) fn send(&self, command: SchedulerCommand) {
        // Fails only once the task has exited, which is the state Stop asks for.
        let _ = self.commands.send(command);
    }

    /// Stops the loop and waits for it, including a cycle in progress
    pub(super) async fn stop_and_join(self) {
        self.send(SchedulerCommand::Stop);
        if let Err(e) = self.task.await {
            tracing::error!("Scheduler task ended abnormally: {}", e);
        }
    }
}

async fn run_scheduler(shared: Arc<Shared>, mut commands: watch::Receiver<SchedulerCommand>) {
    let mut interval = match *commands.borrow_and_update() {
        SchedulerCommand::Run { interval } => interval,
        SchedulerCommand::Stop => return,
    };
    let mut next_run = Instant::now() + interval;
    tracing::debug!("Scheduler running, first cycle in {:?}", interval);

    loop {
        tokio::select! {
            _ = sleep_until(next_run) => {
                let guard = shared.cycle_lock.lock().await;
                // A command sent while a manual cycle held the lock wins over the
                // cycle that was due; the next iteration applies it.
                if commands.has_changed().unwrap_or(true) {
                    drop(guard);
                    continue;
                }
                let report = shared.cycle_under_lock(guard).await;
                if !report.is_success() {
                    tracing::error!("Scheduled crawl #{} failed: {}", report.crawl_number, report.message);
                }
                next_run = Instant::now() + interval;
            }
            changed = commands.changed() => {
                if changed.is_err() {
                    break;
                }
                match *commands.borrow_and_update() {
                    SchedulerCommand::Run { interval: updated } => {
                        interval = updated;
                        next_run = Instant::now() + interval;
                        tracing::debug!("Scheduler rescheduled, next cycle in {:?}", interval);
                    }
                    SchedulerCommand::Stop => break,
                }
            }
        }
    }

    tracing::debug!("Scheduler stopped");
}
