use std::time::Duration;

use docsync_core::Msg;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Recurring `Msg::PollTick` source. The timer task is aborted on `stop` or drop.
pub struct PollTimer {
    task: Option<JoinHandle<()>>,
}

impl PollTimer {
    /// Starts ticking; the first tick fires one full `period` from now.
    pub fn start(period: Duration, msg_tx: UnboundedSender<Msg>) -> Self {
        let period = period.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if msg_tx.send(Msg::PollTick).is_err() {
                    break;
                }
            }
        });
        Self { task: Some(task) }
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
