use std::{future::Future, time::Duration};

use aircon_common::PollConfig;
use tokio::{
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tracing::info;

use crate::console::Console;

pub struct Poller {
    tasks: Vec<JoinHandle<()>>,
}

impl Poller {
    pub fn start(console: Console, config: &PollConfig) -> Self {
        let temperature = {
            let console = console.clone();
            spawn_poll_loop(
                Duration::from_millis(config.temperature_interval_ms),
                move || {
                    let console = console.clone();
                    async move { console.fetch_temperature().await }
                },
            )
        };

        let voltage = {
            let console = console.clone();
            spawn_poll_loop(
                Duration::from_millis(config.voltage_interval_ms),
                move || {
                    let console = console.clone();
                    async move { console.fetch_voltage().await }
                },
            )
        };

        let flicker_period = Duration::from_millis(config.flicker_interval_ms);
        let flicker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(flicker_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                console.flicker_tick().await;
            }
        });

        info!(
            "polling temperature every {}ms, voltage every {}ms",
            config.temperature_interval_ms, config.voltage_interval_ms
        );

        Self {
            tasks: vec![temperature, voltage, flicker],
        }
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    pub fn shutdown(mut self) {
        self.abort_all();
        info!("poller stopped");
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.abort_all();
    }
}

// Each tick spawns its own job; responses may land in any order.
fn spawn_poll_loop<F, Fut>(period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            while in_flight.try_join_next().is_some() {}
            in_flight.spawn(job());
        }
    })
}
