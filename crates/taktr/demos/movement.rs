//! Minimal host for the simulation substrate: a plain sleep loop stands in
//! for the display's per-refresh callback. Spawns a player and a short-lived
//! spark, runs movement and lifetime systems at a fixed 60 Hz step, watches
//! the player's health through a subscription, and stops itself from inside
//! a system once the poison finishes the player off.
//!
//! Run with `RUST_LOG=debug cargo run --example movement` for the per-frame
//! report lines.

use std::time::Duration;

use glam::Vec2;
use taktr::prelude::*;

fn movement_system(world: &mut World, dt: f32) -> Result<(), EcsError> {
    for entity in world.query(&[ComponentKind::Position, ComponentKind::Velocity]) {
        let step = world.get::<Velocity>(entity).copied().unwrap_or_default();
        if let Some(pos) = world.get_mut::<Position>(entity) {
            pos.0 += step.0 * dt;
        }
    }
    Ok(())
}

fn lifetime_system(world: &mut World, dt: f32) -> Result<(), EcsError> {
    for entity in world.query(&[ComponentKind::Lifetime]) {
        if let Some(lifetime) = world.get_mut::<Lifetime>(entity) {
            lifetime.remaining -= dt;
            if lifetime.remaining <= 0.0 {
                log::info!("{entity} burned out");
                world.destroy(entity);
            }
        }
    }
    Ok(())
}

fn main() {
    taktr::diag::init_logger();

    let mut world = World::new();
    let player = world
        .create([
            Position(Vec2::ZERO).wrap(),
            Velocity(Vec2::new(2.0, 0.0)).wrap(),
            Health {
                current: 30,
                max: 30,
            }
            .wrap(),
            Sprite {
                atlas: 0,
                frame: 4,
                layer: 1,
            }
            .wrap(),
        ])
        .expect("fresh world");

    world
        .create([
            Position(Vec2::new(1.0, 1.0)).wrap(),
            Velocity(Vec2::new(0.0, 8.0)).wrap(),
            Lifetime { remaining: 0.5 }.wrap(),
        ])
        .expect("fresh world");

    // The HUD would hang off this subscription; here it is a log line.
    world
        .subscribe(player, ComponentKind::Health, |entity, value| {
            if let ComponentValue::Health(health) = value {
                log::info!("{entity} health now {}/{}", health.current, health.max);
            }
        })
        .expect("player is alive");

    let mut schedule = Schedule::new();
    schedule.add_system(movement_system, 10);
    schedule.add_system(lifetime_system, 20);

    // Ticks down once per simulated second; asks the loop to stop when the
    // player is done for.
    let mut since_pulse = 0.0_f32;
    schedule.add_system(
        move |world: &mut World, dt: f32| -> Result<(), EcsError> {
            since_pulse += dt;
            if since_pulse < 1.0 {
                return Ok(());
            }
            since_pulse -= 1.0;
            let Some(health) = world.get::<Health>(player).copied() else {
                return Ok(());
            };
            let poisoned = Health {
                current: health.current - 10,
                max: health.max,
            };
            world.update(player, poisoned.wrap())?;
            if poisoned.current <= 0 {
                world.request_stop();
            }
            Ok(())
        },
        30,
    );

    let mut frames = 0u64;
    let mut game = GameLoop::new(
        world,
        schedule,
        Duration::from_secs_f64(1.0 / 60.0),
        move |world: &World, alpha: f32| {
            frames += 1;
            if frames % 60 == 0 {
                if let Some(pos) = world.get::<Position>(player) {
                    log::info!("player at ({:.2}, {:.2}), blend {alpha:.2}", pos.0.x, pos.0.y);
                }
            }
        },
    );

    game.start();
    while game.stats().running {
        game.frame();
        // A windowed host would vsync here; 4 ms keeps the demo honest
        // about ticks-per-frame being variable.
        std::thread::sleep(Duration::from_millis(4));
    }

    let stats = game.stats();
    log::info!(
        "stopped after {} ticks ({:.1} tps, {} overruns)",
        stats.ticks,
        stats.ticks_per_second,
        stats.overruns,
    );
}
