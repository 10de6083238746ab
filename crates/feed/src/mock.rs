//! Mock feeds
//!
//! Real exchange connectors live behind [`PriceFeed`](crate::PriceFeed);
//! these two implementations cover everything tests and demo runs need:
//! a deterministic scripted replay and a seeded random walk shaped like the
//! streams the engine was designed against (delayed, bursty, finite).

use crate::{FeedError, PriceFeed};
use async_trait::async_trait;
use common::Tick;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Replays a fixed tick list, optionally ending with an error.
#[derive(Debug)]
pub struct ScriptedFeed {
    name: String,
    ticks: VecDeque<Tick>,
    error: Option<String>,
    tick_delay: Option<Duration>,
}

impl ScriptedFeed {
    pub fn new(name: impl Into<String>, ticks: Vec<Tick>) -> Self {
        Self {
            name: name.into(),
            ticks: ticks.into(),
            error: None,
            tick_delay: None,
        }
    }

    /// End the stream with a feed error once all ticks are consumed
    pub fn fail_with(mut self, reason: impl Into<String>) -> Self {
        self.error = Some(reason.into());
        self
    }

    /// Pace the replay with a wall-clock delay before each tick
    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = Some(delay);
        self
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    async fn next(&mut self) -> Option<Result<Tick, FeedError>> {
        if let Some(delay) = self.tick_delay {
            tokio::time::sleep(delay).await;
        }

        match self.ticks.pop_front() {
            Some(tick) => Some(Ok(tick)),
            None => self
                .error
                .take()
                .map(|reason| Err(FeedError::Disconnected(reason))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Seeded random walk: a finite stream of ticks whose timestamps advance
/// 1-5 seconds per step and whose price drifts by at most `MAX_STEP` around
/// the starting value.
#[derive(Debug)]
pub struct RandomWalkFeed {
    name: String,
    rng: StdRng,
    price: f64,
    remaining: u32,
    next_timestamp: i64,
    tick_interval: Duration,
}

const MAX_STEP: f64 = 5.0;

impl RandomWalkFeed {
    pub fn new(name: impl Into<String>, seed: u64, start_price: f64, ticks: u32) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
            price: start_price,
            remaining: ticks,
            next_timestamp: 0,
            tick_interval: Duration::ZERO,
        }
    }

    /// First tick timestamp (epoch seconds); defaults to 0
    pub fn starting_at(mut self, timestamp: i64) -> Self {
        self.next_timestamp = timestamp;
        self
    }

    /// Wall-clock pacing between ticks; zero replays as fast as possible
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

#[async_trait]
impl PriceFeed for RandomWalkFeed {
    async fn next(&mut self) -> Option<Result<Tick, FeedError>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if !self.tick_interval.is_zero() {
            tokio::time::sleep(self.tick_interval).await;
        }

        let tick = Tick::new(self.next_timestamp, self.price);

        // Advance state for the following tick
        self.next_timestamp += self.rng.gen_range(1..=5);
        self.price = (self.price + (self.rng.gen::<f64>() - 0.5) * 2.0 * MAX_STEP).max(0.01);

        Some(Ok(tick))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
