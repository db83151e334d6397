//! Lock-step engine around the simulation
//!
//! The engine owns the authoritative `Game`, an event log keyed by tick and a
//! short history of past states. An event stamped for a tick that has
//! already been simulated rolls the game back to the state before that tick
//! and re-simulates forward, so late delivery ends in the same state as
//! on-time delivery.
//!
//! Other threads (renderers, scripted AI) go through `SharedEngine::pause`,
//! which holds the engine still for as long as the guard lives.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;

use crate::error::EngineError;
use crate::sim::{Event, Game, Gid};

/// Past states kept for rollback (two seconds at the nominal tick rate)
pub const DEFAULT_HISTORY: usize = 2 * crate::consts::TICKS_PER_SECOND as usize;

/// Read-only pose of one entity, for scripted controllers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    pub gid: Gid,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
}

pub struct Engine {
    game: Game,
    /// Events by the tick they are applied before
    events: BTreeMap<u64, Vec<Event>>,
    /// State at the start of each recent tick, oldest first
    history: VecDeque<Game>,
    history_len: usize,
}

impl Engine {
    pub fn new(game: Game) -> Self {
        Self::with_history(game, DEFAULT_HISTORY)
    }

    pub fn with_history(game: Game, history_len: usize) -> Self {
        let history_len = history_len.max(1);
        Self {
            game,
            events: BTreeMap::new(),
            history: VecDeque::with_capacity(history_len),
            history_len,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Ticks simulated so far
    pub fn tick(&self) -> u64 {
        self.game.tick
    }

    /// Oldest tick an event can still be stamped with
    pub fn oldest_tick(&self) -> u64 {
        self.history
            .front()
            .map_or(self.game.tick + 1, |g| g.tick + 1)
    }

    /// Queue `event` to apply just before tick `tick` is simulated
    ///
    /// Ticks are numbered from 1. An event for a tick already simulated
    /// triggers a rollback; one older than the retained history is rejected.
    pub fn push(&mut self, tick: u64, event: Event) -> Result<(), EngineError> {
        if tick > self.game.tick {
            self.events.entry(tick).or_default().push(event);
            return Ok(());
        }

        let oldest = self.oldest_tick();
        if tick < oldest {
            log::warn!("dropping {event:?} for tick {tick}; oldest replayable is {oldest}");
            return Err(EngineError::TooLate { tick, oldest });
        }
        self.events.entry(tick).or_default().push(event);
        self.rollback(tick);
        Ok(())
    }

    /// Simulate one tick
    pub fn advance(&mut self) {
        let next = self.game.tick + 1;
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(self.game.copy());

        if let Some(events) = self.events.get_mut(&next) {
            // Stable, so each entity's events keep their arrival order
            events.sort_by_key(Event::gid);
            for event in events.iter() {
                self.game.apply(event);
            }
        }
        self.game.think();

        let oldest = self.oldest_tick();
        self.events = self.events.split_off(&oldest);
    }

    /// Re-simulate from the start of `tick` back up to the current tick
    fn rollback(&mut self, tick: u64) {
        let target = self.game.tick;
        let Some(idx) = self.history.iter().rposition(|g| g.tick < tick) else {
            return;
        };
        self.game.overwrite_with(&self.history[idx]);
        self.history.truncate(idx);
        log::info!(
            "rolled back from tick {target} to {} for a late event",
            self.game.tick
        );
        while self.game.tick < target {
            self.advance();
        }
    }

    pub fn view(&self, gid: Gid) -> Option<EntityView> {
        self.game.ent(gid).map(|e| EntityView {
            gid: e.gid,
            pos: e.pos,
            vel: e.vel,
            angle: e.angle,
        })
    }
}

/// An engine shared between the simulation thread and its readers
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Hold the engine still; nothing advances until the guard drops
    pub fn pause(&self) -> MutexGuard<'_, Engine> {
        // A reader that panicked cannot have left the state half-written
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn advance(&self) {
        self.pause().advance();
    }

    pub fn push(&self, tick: u64, event: Event) -> Result<(), EngineError> {
        self.pause().push(tick, event)
    }

    /// Run `f` against the paused game
    pub fn with_game<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        f(self.pause().game())
    }
}
