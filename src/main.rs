//! Mana Arena headless runner
//!
//! Usage: `mana-arena [config.json] [ticks]`
//!
//! Runs a seeded match between two scripted players through the lock-step
//! engine and logs the outcome.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match native::load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => mana_arena::GameConfig::default(),
    };
    let ticks = match args.next().map(|s| s.parse::<u64>()) {
        None => 600,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            log::error!("bad tick count: {e}");
            return ExitCode::FAILURE;
        }
    };

    match native::run(config, ticks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; the host drives it directly
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::Vec2;
    use mana_arena::sim::snapshot;
    use mana_arena::{AbilityRegistry, Engine, Event, Game, GameConfig, Gid};

    pub fn load_config(path: &str) -> Result<GameConfig, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        Ok(GameConfig::from_json(&json)?)
    }

    pub fn run(config: GameConfig, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
        let (w, h) = (config.arena.width, config.arena.height);
        let mut game = Game::new(config, &AbilityRegistry::with_builtins())?;
        let red = game.add_player(Vec2::new(w * 0.2, h * 0.2));
        let blue = game.add_player(Vec2::new(w * 0.8, h * 0.8));
        game.add_control_point(Vec2::new(w * 0.5, h * 0.5), 60.0);

        let mut engine = Engine::new(game);
        log::info!("Running {ticks} ticks");

        for tick in 1..=ticks {
            for (gid, foe) in [(red, blue), (blue, red)] {
                for event in script(&engine, tick, gid, foe) {
                    engine.push(tick, event)?;
                }
            }
            engine.advance();
        }

        let game = engine.game();
        for ent in game.ents.iter().filter(|e| e.draws_mana()) {
            log::info!(
                "entity {} at ({:.1}, {:.1}) health {:.1}, {} live processes",
                ent.gid,
                ent.pos.x,
                ent.pos.y,
                ent.stats.health(),
                ent.processes.len()
            );
        }
        let bytes = snapshot::encode(game)?;
        log::info!(
            "Finished at tick {}: {} entities, snapshot {} bytes",
            game.tick,
            game.ents.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Simple chase-and-cast controller
    fn script(engine: &Engine, tick: u64, gid: Gid, foe: Gid) -> Vec<Event> {
        let (Some(me), Some(them)) = (engine.view(gid), engine.view(foe)) else {
            return Vec::new();
        };
        let to_foe = them.pos - me.pos;
        let want = to_foe.y.atan2(to_foe.x);
        let mut events = vec![
            Event::Turn {
                gid,
                amount: mana_arena::angle_delta(me.angle, want),
            },
            Event::Accelerate { gid, amount: 1.0 },
        ];
        match tick % 240 {
            1 => events.push(Event::Activate { gid, slot: 0 }),
            60 => events.push(Event::Activate { gid, slot: 2 }),
            120 if to_foe.length() < 500.0 => events.push(Event::Activate { gid, slot: 4 }),
            180 => {
                events.push(Event::Activate { gid, slot: 5 });
                events.push(Event::Target {
                    gid,
                    slot: 5,
                    pos: them.pos,
                });
            }
            _ => {}
        }
        events
    }
}
