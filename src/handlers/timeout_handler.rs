use futures_channel::mpsc::UnboundedSender;
use futures_timer::Delay;
use log::debug;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::handlers::phase_handler::Input;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Local timers of one game screen. They only ever post inputs back to the
/// game loop, and all of them die with this struct.
pub struct Timers {
    inputs: UnboundedSender<Input>,
    tick_period: Duration,
    countdown: Option<JoinHandle<()>>,
    reveal: Option<JoinHandle<()>>,
}

impl Timers {
    pub fn new(inputs: UnboundedSender<Input>, tick_period: Duration) -> Self {
        Timers {
            inputs,
            tick_period,
            countdown: None,
            reveal: None,
        }
    }

    /// Starts a ticker whose ticks are stamped with `ticker`.
    pub fn start_countdown(&mut self, ticker: u64) {
        self.stop_countdown();
        debug!("Countdown {} started", ticker);
        self.countdown = Some(tokio::spawn(handle_countdown(
            self.inputs.clone(),
            ticker,
            self.tick_period,
        )));
    }

    pub fn stop_countdown(&mut self) {
        if let Some(task) = self.countdown.take() {
            debug!("Countdown stopped");
            task.abort();
        }
    }

    pub fn schedule_reveal(&mut self, round: u64, after: Duration) {
        self.cancel_reveal();
        debug!("Reveal for round {} scheduled in {:?}", round, after);
        self.reveal = Some(tokio::spawn(handle_reveal_timeout(
            self.inputs.clone(),
            round,
            after,
        )));
    }

    pub fn cancel_reveal(&mut self) {
        if let Some(task) = self.reveal.take() {
            task.abort();
        }
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn cancel_all(&mut self) {
        self.stop_countdown();
        self.cancel_reveal();
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn handle_countdown(inputs: UnboundedSender<Input>, ticker: u64, period: Duration) {
    loop {
        Delay::new(period).await;
        if inputs.unbounded_send(Input::Tick { ticker }).is_err() {
            return;
        }
    }
}

async fn handle_reveal_timeout(inputs: UnboundedSender<Input>, round: u64, after: Duration) {
    Delay::new(after).await;
    let _ = inputs.unbounded_send(Input::RevealElapsed { round });
}
