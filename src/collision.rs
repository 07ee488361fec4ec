use std::collections::HashMap;

use fixedbitset::FixedBitSet;

use crate::gamemodes::GameMode;
use crate::player::Player;
use crate::world::{NodeEntry, World};

/// Per-tick scratch set of prey already promised to a predator this pass.
/// Cleared at the start of every consumption pass; first claim wins.
pub struct ClaimedSet {
    bits: FixedBitSet,
}

impl ClaimedSet {
    pub fn new() -> Self {
        Self {
            bits: FixedBitSet::with_capacity(4096),
        }
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }

    pub fn claim(&mut self, id: u32) {
        let idx = id as usize;
        if idx >= self.bits.len() {
            self.bits.grow(idx + 1);
        }
        self.bits.insert(idx);
    }

    pub fn is_claimed(&self, id: u32) -> bool {
        let idx = id as usize;
        idx < self.bits.len() && self.bits.contains(idx)
    }
}

impl Default for ClaimedSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds everything the given player cell eats this tick, in discovery
/// order over the owner's visible set.
///
/// Food is taken on bounding-box contact alone. Everything else must pass
/// the kind multiplier against the probe's mass (virus 1.33, another
/// player's cell or ejected mass 1.25, a sibling cell 1.00 once both merge
/// countdowns have elapsed) and then sit deep enough inside the probe:
/// farther than `probe.size - prey.eating_range_bonus()` is a miss.
pub fn cells_in_range(
    world: &World,
    players: &HashMap<u32, Player>,
    gamemode: &dyn GameMode,
    probe_id: u32,
    claimed: &mut ClaimedSet,
) -> Vec<u32> {
    let Some(NodeEntry::Player(probe)) = world.get_node(probe_id) else {
        return Vec::new();
    };
    let probe_owner_id = probe.data.owner_id;
    let Some(owner) = probe_owner_id.and_then(|id| players.get(&id)) else {
        return Vec::new();
    };

    let r = probe.data.size();
    let left = probe.data.position.x - r;
    let right = probe.data.position.x + r;
    let top = probe.data.position.y - r;
    let bottom = probe.data.position.y + r;

    let mut list = Vec::new();
    for &check_id in &owner.visible_nodes {
        if check_id == probe_id || claimed.is_claimed(check_id) {
            continue;
        }
        let Some(check) = world.get_node(check_id) else {
            continue;
        };
        let data = check.data();

        // Freshly burst cells pass through their siblings untouched.
        if probe.ignore_collision && data.owner_id == probe_owner_id {
            continue;
        }

        let p = data.position;
        if p.x < left || p.x > right || p.y < top || p.y > bottom {
            continue;
        }

        let multiplier = match check {
            NodeEntry::Food(_) => {
                list.push(check_id);
                claimed.claim(check_id);
                continue;
            }
            NodeEntry::Virus(_) => 1.33,
            NodeEntry::Ejected(_) => 1.25,
            NodeEntry::Player(other) => {
                if data.owner_id == probe_owner_id {
                    // Sibling merge, gated on both countdowns.
                    if probe.recombine_ticks > 0 || other.recombine_ticks > 0 {
                        continue;
                    }
                    1.0
                } else {
                    if gamemode.have_teams() {
                        let Some(other_owner) =
                            data.owner_id.and_then(|id| players.get(&id))
                        else {
                            continue;
                        };
                        if other_owner.team.is_some() && other_owner.team == owner.team {
                            continue;
                        }
                    }
                    1.25
                }
            }
        };

        if data.mass * multiplier > probe.data.mass {
            continue;
        }
        let dist = probe.data.position.distance(p);
        if dist > r - data.eating_range_bonus() {
            continue;
        }

        list.push(check_id);
        claimed.claim(check_id);
    }
    list
}
