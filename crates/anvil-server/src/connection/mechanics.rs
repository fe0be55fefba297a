//! Built-in block behaviors driven by the tick loop.
//!
//! The fuller rule set (redstone, crops, fluids) registers through the same
//! two entry points; these are the behaviors the server carries natively.

use rand::rngs::StdRng;
use rand::Rng;

use anvil_world::tick::ScheduledTick;
use anvil_world::{BlockRegistry, World};

use super::ConnectionHandler;

const GRASS: u16 = 2;
const DIRT: u16 = 3;
const SAND: u16 = 12;
const GRAVEL: u16 = 13;
const FIRE: u16 = 51;

/// Delay before an unsupported gravity block starts to fall.
const GRAVITY_DELAY: u32 = 2;

/// React to a block edit: schedule follow-up updates for the position and
/// the block resting on it.
pub(super) fn on_block_changed(handler: &mut ConnectionHandler, x: i32, y: i32, z: i32) {
    let now = handler.world.total_time() as u64;
    for (nx, ny, nz) in [(x, y, z), (x, y + 1, z)] {
        let (id, _) = handler.world.get_block(nx, ny, nz);
        if id == SAND || id == GRAVEL {
            handler.scheduler.schedule(nx, ny, nz, id, GRAVITY_DELAY, now);
        }
    }
}

/// One random tick for a block. Returns the replacement state, if any.
pub(super) fn random_tick(
    world: &World,
    registry: &BlockRegistry,
    rng: &mut StdRng,
    x: i32,
    y: i32,
    z: i32,
    id: u16,
) -> Option<(u16, u8)> {
    match id {
        GRASS => {
            // Grass smothers under anything that blocks light.
            let (above, _) = world.get_block(x, y + 1, z);
            if above != 0 && registry.light_opacity(above) > 2 {
                Some((DIRT, 0))
            } else {
                None
            }
        }
        FIRE => {
            // Untended fire burns out.
            if rng.gen_range(0..3) == 0 {
                Some((0, 0))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// A scheduled update fired. Returns block changes to apply in order, plus
/// whether the same block should be rescheduled.
pub(super) struct ScheduledOutcome {
    pub changes: Vec<(i32, i32, i32, u16, u8)>,
    pub reschedule: Option<(i32, i32, i32, u16)>,
}

pub(super) fn scheduled_tick(world: &World, tick: &ScheduledTick) -> ScheduledOutcome {
    let mut outcome = ScheduledOutcome {
        changes: Vec::new(),
        reschedule: None,
    };
    let (current, meta) = world.get_block(tick.x, tick.y, tick.z);
    if current != tick.block_id {
        return outcome; // the block changed before its update fired
    }

    if current == SAND || current == GRAVEL {
        let (below, _) = world.get_block(tick.x, tick.y - 1, tick.z);
        if below == 0 && tick.y > 0 {
            outcome.changes.push((tick.x, tick.y, tick.z, 0, 0));
            outcome
                .changes
                .push((tick.x, tick.y - 1, tick.z, current, meta));
            // Keep falling until something holds it up.
            outcome.reschedule = Some((tick.x, tick.y - 1, tick.z, current));
        }
    }
    outcome
}
