use std::collections::HashMap;
use std::f32::consts::TAU;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use tokio::sync::RwLock;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::collision::{self, ClaimedSet};
use crate::config::Config;
use crate::entity::{CellKind, EjectedMass, Food, PlayerCell, Virus};
use crate::gamemodes::{self, GameMode, LeaderboardEntry, ffa::Ffa};
use crate::player::Player;
use crate::world::{Border, NodeEntry, World};

/// Ticks per one-second bucket at the 50 ms quantum.
const SECOND_TICKS: u32 = 20;

/// Feed-search radius around an ejected blob in flight.
const VIRUS_FEED_RANGE: f32 = 100.0;

/// The authoritative game state and its fixed-timestep update.
///
/// All mutation happens inside `step` or the explicit input methods; callers
/// serialize access through a lock (see `run`).
pub struct Simulation {
    pub config: Config,
    pub world: World,
    pub players: HashMap<u32, Player>,
    pub gamemode: Box<dyn GameMode>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub tick_count: u64,
    tick_main: u32,
    tick_spawn: u32,
    next_player_id: u32,
    claimed: ClaimedSet,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        let border = Border::new(
            config.border.left,
            config.border.top,
            config.border.right,
            config.border.bottom,
        );
        let gamemode = gamemodes::get_gamemode(config.server.gamemode);
        Self {
            config,
            world: World::new(border),
            players: HashMap::new(),
            gamemode,
            leaderboard: Vec::new(),
            tick_count: 0,
            tick_main: 0,
            tick_spawn: 0,
            next_player_id: 1,
            claimed: ClaimedSet::new(),
        }
    }

    /// One-time startup: gamemode init hook plus the initial food fill.
    pub fn init(&mut self) {
        let mut gamemode = mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
        gamemode.on_server_init(self);
        self.gamemode = gamemode;

        for _ in 0..self.config.food.start_amount {
            self.spawn_food();
        }
        info!(
            gamemode = self.gamemode.name(),
            food = self.world.current_food,
            "simulation initialized"
        );
    }

    // ---- player lifecycle ----------------------------------------------

    pub fn add_player(&mut self, name: impl Into<String>) -> u32 {
        let id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1).max(1);
        let mut player = Player::new(id, name);
        player.color = World::random_color();
        self.gamemode.on_player_join(&mut player);
        info!(player_id = id, name = %player.name, "player joined");
        self.players.insert(id, player);
        id
    }

    /// Drops a player cell for the given player. Position and mass default
    /// to a random spot and the configured start mass.
    pub fn spawn_player(
        &mut self,
        player_id: u32,
        position: Option<Vec2>,
        mass: Option<f32>,
    ) -> Option<u32> {
        if !self.players.contains_key(&player_id) {
            return None;
        }
        let position = position.unwrap_or_else(|| self.world.border.random_position());
        let mass = mass.unwrap_or(self.config.player.start_mass);
        let id = self.world.next_id();
        let cell = PlayerCell::new(id, player_id, position, mass);
        let id = self.add_node(NodeEntry::Player(cell));
        if let Some(player) = self.players.get_mut(&player_id) {
            player.mouse = position;
        }
        Some(id)
    }

    /// Marks the player as gone. Their cells linger for the configured
    /// number of seconds and are culled by the per-second bucket.
    pub fn disconnect_player(&mut self, player_id: u32) {
        let Some(player) = self.players.get_mut(&player_id) else {
            return;
        };
        player.disconnected = true;
        let cells = player.cells.clone();
        let linger = self.config.player.disconnect_time;
        for cell_id in cells {
            if let Some(NodeEntry::Player(cell)) = self.world.get_node_mut(cell_id) {
                cell.disconnect_ticks = linger;
            }
        }
        info!(player_id, linger_seconds = linger, "player disconnected");
    }

    pub fn set_player_target(&mut self, player_id: u32, target: Vec2) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.mouse = target;
        }
    }

    // ---- registry bridge -----------------------------------------------

    /// Inserts an entity and notifies observers: the owner always hears
    /// about its own cell, everyone else only if the spawn is in view.
    pub fn add_node(&mut self, entry: NodeEntry) -> u32 {
        let position = entry.data().position;
        let owner_id = entry.data().owner_id;
        let id = self.world.insert(entry);

        if let Some(owner_id) = owner_id {
            if let Some(player) = self.players.get_mut(&owner_id) {
                let color = player.color;
                if let Some(node) = self.world.get_node_mut(id) {
                    node.data_mut().color = color;
                }
                player.cells.push(id);
                player.node_addition_queue.push(id);
            }
        }
        for player in self.players.values_mut() {
            if Some(player.id) == owner_id {
                continue;
            }
            if player.in_view(position) {
                player.node_addition_queue.push(id);
            }
        }
        id
    }

    /// Removes an entity and tells every observer. No-op when already gone.
    pub fn remove_node(&mut self, id: u32) {
        let Some(entry) = self.world.remove(id) else {
            return;
        };
        if let Some(owner_id) = entry.data().owner_id {
            if let Some(player) = self.players.get_mut(&owner_id) {
                player.cells.retain(|&c| c != id);
            }
        }
        for player in self.players.values_mut() {
            player.node_destroy_queue.push(id);
        }
    }

    // ---- tick ----------------------------------------------------------

    /// Advances the world by one quantum.
    pub fn step(&mut self) {
        self.tick_count += 1;

        self.move_player_cells();
        self.update_moving_nodes();
        self.resolve_consumption();
        self.spawn_tick();

        let mut gamemode = mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
        gamemode.on_tick(self);
        self.gamemode = gamemode;

        self.tick_main += 1;
        if self.tick_main >= SECOND_TICKS {
            self.update_cells();
            let gamemode = mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
            self.leaderboard = gamemode.update_leaderboard(self);
            self.gamemode = gamemode;
            self.tick_main = 0;
        }

        // Views refresh last so the next tick's collision pass reads a
        // visible set consistent with start-of-tick state.
        self.update_views();
    }

    /// Owner-directed movement: every cell of a connected player chases the
    /// player's mouse, capped so it never overshoots the target.
    fn move_player_cells(&mut self) {
        let Border {
            left,
            top,
            right,
            bottom,
        } = self.world.border;

        let mut targets: Vec<(u32, Vec2)> = Vec::new();
        for player in self.players.values() {
            if player.disconnected {
                continue;
            }
            for &cell_id in &player.cells {
                targets.push((cell_id, player.mouse));
            }
        }

        for (cell_id, mouse) in targets {
            let Some(NodeEntry::Player(cell)) = self.world.get_node_mut(cell_id) else {
                continue;
            };
            if cell.ignore_collision {
                continue;
            }
            let delta = mouse - cell.data.position;
            let dist = delta.length();
            if dist < 1.0 {
                continue;
            }
            let angle = delta.x.atan2(delta.y);
            let speed = cell.data.speed().min(dist);
            cell.data.position += Vec2::new(angle.sin() * speed, angle.cos() * speed);
            cell.data.clamp_to(left, top, right, bottom);
        }
    }

    /// Inertial sweep over the moving set: integrate live movers, let
    /// finished ones settle out, prune ids whose entity is gone.
    fn update_moving_nodes(&mut self) {
        let Border {
            left,
            top,
            right,
            bottom,
        } = self.world.border;

        let snapshot = self.world.moving_nodes.clone();
        let mut finished = Vec::new();
        let mut fed: Vec<(u32, u32)> = Vec::new();

        for id in snapshot {
            let Some(node) = self.world.get_node(id) else {
                self.world.remove_moving(id);
                continue;
            };
            if node.data().move_ticks == 0 {
                finished.push(id);
                continue;
            }

            // An ejected blob in flight feeds the first virus it overlaps,
            // as long as there is room for the virus population to grow.
            if node.kind() == CellKind::Ejected
                && self.world.virus_nodes.len() < self.config.virus.max_amount
            {
                if let Some(virus_id) = self.find_feedable_virus(node.data().position) {
                    fed.push((virus_id, id));
                    continue;
                }
            }

            if let Some(node) = self.world.get_node_mut(id) {
                let data = node.data_mut();
                data.update_move();
                data.clamp_to(left, top, right, bottom);
            }
        }

        for (virus_id, feeder_id) in fed {
            self.feed_virus(virus_id, feeder_id);
        }
        for id in finished {
            if let Some(NodeEntry::Player(cell)) = self.world.get_node_mut(id) {
                cell.ignore_collision = false;
            }
            self.world.remove_moving(id);
        }
    }

    fn find_feedable_virus(&self, position: Vec2) -> Option<u32> {
        for &id in &self.world.virus_nodes {
            let Some(node) = self.world.get_node(id) else {
                continue;
            };
            let p = node.data().position;
            if (position.x - p.x).abs() <= VIRUS_FEED_RANGE
                && (position.y - p.y).abs() <= VIRUS_FEED_RANGE
            {
                return Some(id);
            }
        }
        None
    }

    /// The fed virus absorbs the blob and aims along its flight path. Once
    /// full it resets and launches a fresh virus in that direction.
    fn feed_virus(&mut self, virus_id: u32, feeder_id: u32) {
        let Some(feeder) = self.world.get_node(feeder_id) else {
            return;
        };
        let feeder_mass = feeder.data().mass;
        let feeder_angle = feeder.data().angle;
        self.remove_node(feeder_id);

        let mut shoot = false;
        if let Some(NodeEntry::Virus(virus)) = self.world.get_node_mut(virus_id) {
            virus.data.angle = feeder_angle;
            virus.data.add_mass(feeder_mass);
            virus.fed += 1;
            if virus.fed >= self.config.virus.feed_amount {
                virus.fed = 0;
                virus.data.mass = self.config.virus.start_mass;
                shoot = true;
            }
        }
        if shoot {
            self.shoot_virus(virus_id);
        }
    }

    fn shoot_virus(&mut self, parent_id: u32) {
        let Some(parent) = self.world.get_node(parent_id) else {
            return;
        };
        let position = parent.data().position;
        let angle = parent.data().angle;

        let id = self.world.next_id();
        let mut virus = Virus::new(id, position, self.config.virus.start_mass);
        virus.data.angle = angle;
        virus
            .data
            .set_move_engine(self.config.virus.shot_speed, 20, 0.75);
        let id = self.add_node(NodeEntry::Virus(virus));
        self.world.add_moving(id);
        debug!(virus_id = id, "virus shot");
    }

    /// Consumption pass: each player cell probes its owner's visible set and
    /// swallows whatever the resolver grants it. Prey is removed on the
    /// spot; virus bursts and gamemode hooks run after the sweep.
    fn resolve_consumption(&mut self) {
        self.claimed.clear();
        let mut bursts: Vec<(u32, u32)> = Vec::new();
        let mut ejected_consumed: Vec<(u32, Vec2)> = Vec::new();
        let max_mass = self.config.player.max_mass;

        let probes = self.world.player_nodes.clone();
        for probe_id in probes {
            let Some(probe) = self.world.get_node(probe_id) else {
                continue; // eaten earlier this pass
            };
            let probe_owner = probe.data().owner_id;

            let prey = collision::cells_in_range(
                &self.world,
                &self.players,
                self.gamemode.as_ref(),
                probe_id,
                &mut self.claimed,
            );
            for prey_id in prey {
                let Some(prey_node) = self.world.get_node(prey_id) else {
                    continue;
                };
                let prey_kind = prey_node.kind();
                let prey_mass = prey_node.data().mass;
                let prey_position = prey_node.data().position;

                if let Some(node) = self.world.get_node_mut(probe_id) {
                    let data = node.data_mut();
                    data.mass = (data.mass + prey_mass).min(max_mass);
                }
                if let Some(node) = self.world.get_node_mut(prey_id) {
                    node.data_mut().set_killer(probe_id);
                }

                match prey_kind {
                    CellKind::Virus => {
                        if let Some(owner_id) = probe_owner {
                            bursts.push((owner_id, probe_id));
                        }
                    }
                    CellKind::Ejected => ejected_consumed.push((probe_id, prey_position)),
                    _ => {}
                }
                self.remove_node(prey_id);
            }
        }

        for (owner_id, consumer_id) in bursts {
            self.virus_burst(owner_id, consumer_id);
        }
        if !ejected_consumed.is_empty() {
            let gamemode = mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
            for (eater_id, position) in ejected_consumed {
                gamemode.on_ejected_consumed(self, eater_id, position);
            }
            self.gamemode = gamemode;
        }
    }

    /// Pops the cell that swallowed a virus into as many pieces as its mass
    /// and the owner's free cell slots allow.
    fn virus_burst(&mut self, owner_id: u32, consumer_id: u32) {
        let Some(player) = self.players.get(&owner_id) else {
            return;
        };
        let slots = self
            .config
            .player
            .max_cells
            .saturating_sub(player.cells.len()) as i32;
        let Some(node) = self.world.get_node(consumer_id) else {
            return;
        };
        let mass = node.data().mass;

        let max_splits = (mass / 16.0).floor() as i32 - 1;
        let mut num_splits = slots.min(max_splits);
        if num_splits <= 0 {
            return;
        }
        let split_mass = (mass / (num_splits as f32 + 1.0)).min(36.0);

        // Very large consumers shed a few quarter-mass chunks instead of a
        // spray of 36s.
        let mut big_splits = 0;
        let end_mass = mass - num_splits as f32 * split_mass;
        if end_mass / 2.0 > 660.0 {
            big_splits += 1;
        }
        if end_mass / 3.0 > 660.0 {
            big_splits += 1;
        }
        if end_mass / 4.0 > 660.0 {
            big_splits += 1;
        }
        num_splits -= big_splits;

        let mut rng = rand::rng();
        for _ in 0..num_splits {
            let angle = rng.random::<f32>() * TAU;
            self.burst_piece(owner_id, consumer_id, angle, split_mass, 150.0);
        }
        for _ in 0..big_splits {
            let angle = rng.random::<f32>() * TAU;
            let quarter = match self.world.get_node(consumer_id) {
                Some(node) => node.data().mass / 4.0,
                None => break,
            };
            self.burst_piece(owner_id, consumer_id, angle, quarter, 20.0);
        }

        let recombine_time = self.config.player.recombine_time;
        if let Some(NodeEntry::Player(cell)) = self.world.get_node_mut(consumer_id) {
            cell.calc_merge_time(recombine_time);
        }
        debug!(owner_id, consumer_id, "virus burst");
    }

    /// One piece flying out of a burst: takes its mass off the parent and
    /// launches with collision off until the engine runs out.
    fn burst_piece(&mut self, owner_id: u32, parent_id: u32, angle: f32, mass: f32, speed: f32) {
        let Some(parent) = self.world.get_node_mut(parent_id) else {
            return;
        };
        let data = parent.data_mut();
        if data.mass <= mass {
            return;
        }
        data.mass -= mass;
        let position = data.position;

        let id = self.world.next_id();
        let mut cell = PlayerCell::new(id, owner_id, position, mass);
        cell.data.angle = angle;
        cell.data.set_move_engine(speed, 10, 0.75);
        cell.calc_merge_time(self.config.player.recombine_time);
        cell.ignore_collision = true;
        let id = self.add_node(NodeEntry::Player(cell));
        self.world.add_moving(id);
    }

    // ---- player actions ------------------------------------------------

    /// Splits every eligible cell toward the player's mouse. Parent keeps
    /// half, sibling launches with the other half; both merge countdowns
    /// restart so the pair cannot recombine instantly.
    pub fn split_cells(&mut self, player_id: u32) {
        let Some(player) = self.players.get(&player_id) else {
            return;
        };
        let mouse = player.mouse;
        let cell_ids = player.cells.clone();
        let max_cells = self.config.player.max_cells;
        let min_mass = self.config.player.min_mass_split;
        let recombine_time = self.config.player.recombine_time;

        for cell_id in cell_ids {
            let at_capacity = self
                .players
                .get(&player_id)
                .is_none_or(|p| p.cells.len() >= max_cells);
            if at_capacity {
                continue;
            }
            let Some(NodeEntry::Player(cell)) = self.world.get_node(cell_id) else {
                continue;
            };
            if cell.data.mass < min_mass {
                continue;
            }

            let position = cell.data.position;
            let delta = mouse - position;
            let angle = delta.x.atan2(delta.y);
            let offset = cell.data.size() / 2.0;
            let start = position + Vec2::new(offset * angle.sin(), offset * angle.cos());
            let launch_speed = cell.data.speed() * 6.0;
            let half = cell.data.mass / 2.0;

            if let Some(NodeEntry::Player(cell)) = self.world.get_node_mut(cell_id) {
                cell.data.mass = half;
                cell.calc_merge_time(recombine_time);
            }

            let id = self.world.next_id();
            let mut split = PlayerCell::new(id, player_id, start, half);
            split.data.angle = angle;
            split.data.set_move_engine(launch_speed, 32, 0.85);
            split.calc_merge_time(recombine_time);
            let id = self.add_node(NodeEntry::Player(split));
            self.world.add_moving(id);
        }
    }

    /// Throws a blob of mass from every eligible cell toward the mouse.
    /// The cell loses `eject.mass_loss`; the blob carries `eject.mass`.
    pub fn eject_mass(&mut self, player_id: u32) {
        let Some(player) = self.players.get(&player_id) else {
            return;
        };
        let mouse = player.mouse;
        let cell_ids = player.cells.clone();
        let min_mass = self.config.player.min_mass_eject;
        let blob_mass = self.config.eject.mass;
        let mass_loss = self.config.eject.mass_loss;
        let speed = self.config.eject.speed;

        for cell_id in cell_ids {
            let Some(NodeEntry::Player(cell)) = self.world.get_node(cell_id) else {
                continue;
            };
            if cell.data.mass < min_mass {
                continue;
            }

            let position = cell.data.position;
            let color = cell.data.color;
            let delta = mouse - position;
            let mut angle = delta.x.atan2(delta.y);
            let rim = cell.data.size() + 5.0;
            let start = position + Vec2::new(rim * angle.sin(), rim * angle.cos());

            if let Some(node) = self.world.get_node_mut(cell_id) {
                node.data_mut().mass -= mass_loss;
            }

            angle += rand::rng().random_range(-0.2..0.2);
            let id = self.world.next_id();
            let mut blob = EjectedMass::new(id, start, blob_mass);
            blob.data.color = color;
            blob.data.angle = angle;
            blob.data.set_move_engine(speed, 20, 0.75);
            let id = self.add_node(NodeEntry::Ejected(blob));
            self.world.add_moving(id);
        }
    }

    // ---- spawning ------------------------------------------------------

    fn spawn_tick(&mut self) {
        self.tick_spawn += 1;
        if self.tick_spawn >= self.config.food.spawn_interval {
            self.update_food();
            self.virus_check();
            self.tick_spawn = 0;
        }
    }

    fn update_food(&mut self) {
        let room = self
            .config
            .food
            .max_amount
            .saturating_sub(self.world.current_food);
        let to_spawn = self.config.food.spawn_amount.min(room);
        for _ in 0..to_spawn {
            self.spawn_food();
        }
    }

    fn spawn_food(&mut self) {
        let id = self.world.next_id();
        let position = self.world.border.random_position();
        let mut food = Food::new(id, position, self.config.food.mass);
        food.data.color = World::random_color();
        self.add_node(NodeEntry::Food(food));
    }

    fn virus_check(&mut self) {
        if self.world.virus_nodes.len() >= self.config.virus.min_amount {
            return;
        }
        let position = self.world.border.random_position();
        self.try_spawn_virus_at(position);
    }

    /// Single spawn attempt: the position is abandoned (until a later pass)
    /// if any player cell big enough to pop the virus overlaps it.
    pub fn try_spawn_virus_at(&mut self, position: Vec2) -> bool {
        let min_mass = self.config.virus.start_mass;
        for &id in &self.world.player_nodes {
            let Some(node) = self.world.get_node(id) else {
                continue;
            };
            let data = node.data();
            if data.mass < min_mass {
                continue;
            }
            if data.aabb_contains(position) {
                return false;
            }
        }
        let id = self.world.next_id();
        let virus = Virus::new(id, position, self.config.virus.start_mass);
        self.add_node(NodeEntry::Virus(virus));
        true
    }

    // ---- per-second bucket ---------------------------------------------

    /// Runs once per second of game time: disconnect lingers, merge
    /// countdowns, and mass decay.
    fn update_cells(&mut self) {
        let decay = 1.0 - self.config.player.mass_decay_rate * self.gamemode.decay_mod();
        let min_decay = self.config.player.min_mass_decay;

        let ids = self.world.player_nodes.clone();
        for id in ids {
            let mut cull = false;
            if let Some(NodeEntry::Player(cell)) = self.world.get_node_mut(id) {
                if cell.disconnect_ticks > -1 {
                    cell.disconnect_ticks -= 1;
                    if cell.disconnect_ticks == -1 {
                        cull = true;
                    }
                } else if cell.recombine_ticks > 0 {
                    cell.recombine_ticks -= 1;
                }
                if !cull && cell.data.mass >= min_decay {
                    cell.data.mass *= decay;
                }
            }
            if cull {
                self.remove_node(id);
            }
        }

        self.players
            .retain(|_, player| !(player.disconnected && player.cells.is_empty()));
    }

    fn update_views(&mut self) {
        let view_base = self.config.server.view_base;
        for player in self.players.values_mut() {
            if player.disconnected {
                continue;
            }
            player.update_view(&self.world, view_base);
        }
    }
}

/// Fixed-timestep driver: accumulates wall time and executes whole quanta,
/// so a stalled host catches up instead of slowing the game down.
pub async fn run(sim: Arc<RwLock<Simulation>>) {
    let quantum = {
        let sim = sim.read().await;
        Duration::from_millis(sim.config.server.tick_interval_ms.max(1))
    };

    let mut ticker = time::interval(Duration::from_millis(5));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = time::Instant::now();
    let mut accumulator = Duration::ZERO;

    loop {
        ticker.tick().await;
        let now = time::Instant::now();
        accumulator += now - last;
        last = now;

        while accumulator >= quantum {
            accumulator -= quantum;
            let started = std::time::Instant::now();
            {
                let mut sim = sim.write().await;
                sim.step();
            }
            let elapsed = started.elapsed();
            if elapsed > quantum {
                warn!(?elapsed, "tick overran its quantum");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::new(Config::default())
    }

    fn cell_mass(sim: &Simulation, id: u32) -> f32 {
        sim.world.get_node(id).map(|n| n.data().mass).unwrap_or(0.0)
    }

    #[test]
    fn food_at_same_position_is_eaten() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let probe = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(50.0))
            .unwrap();
        let food_id = s.world.next_id();
        let food = Food::new(food_id, Vec2::new(100.0, 100.0), 1.0);
        s.add_node(NodeEntry::Food(food));

        s.update_views();
        s.resolve_consumption();

        assert!(s.world.get_node(food_id).is_none());
        assert_eq!(s.world.current_food, 0);
        assert_eq!(cell_mass(&s, probe), 51.0);
        let player = s.players.get(&player_id).unwrap();
        assert!(player.node_destroy_queue.contains(&food_id));
    }

    #[test]
    fn split_below_threshold_is_noop() {
        let mut s = sim();
        let player_id = s.add_player("a");
        s.spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(20.0));
        s.set_player_target(player_id, Vec2::new(200.0, 100.0));

        s.split_cells(player_id);
        assert_eq!(s.players.get(&player_id).unwrap().cells.len(), 1);
    }

    #[test]
    fn split_halves_mass_and_launches_sibling_toward_mouse() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let parent = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(36.0))
            .unwrap();
        s.set_player_target(player_id, Vec2::new(200.0, 100.0));

        s.split_cells(player_id);

        let cells = s.players.get(&player_id).unwrap().cells.clone();
        assert_eq!(cells.len(), 2);
        let sibling = *cells.iter().find(|&&c| c != parent).unwrap();

        assert_eq!(cell_mass(&s, parent), 18.0);
        assert_eq!(cell_mass(&s, sibling), 18.0);

        // Mouse was due east, so the sibling starts to the parent's right.
        let parent_x = s.world.get_node(parent).unwrap().data().position.x;
        let sibling_x = s.world.get_node(sibling).unwrap().data().position.x;
        assert!(sibling_x > parent_x);

        for id in [parent, sibling] {
            let Some(NodeEntry::Player(cell)) = s.world.get_node(id) else {
                panic!("missing player cell");
            };
            assert!(cell.recombine_ticks > 0);
        }
        assert!(s.world.is_moving(sibling));
    }

    #[test]
    fn split_respects_cell_cap() {
        let mut s = sim();
        s.config.player.max_cells = 2;
        let player_id = s.add_player("a");
        s.spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(400.0));
        s.set_player_target(player_id, Vec2::new(200.0, 100.0));

        s.split_cells(player_id);
        s.split_cells(player_id);
        assert_eq!(s.players.get(&player_id).unwrap().cells.len(), 2);
    }

    #[test]
    fn eject_loses_fixed_mass_and_spawns_fixed_blob() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(100.0))
            .unwrap();
        s.set_player_target(player_id, Vec2::new(200.0, 100.0));

        s.eject_mass(player_id);

        assert_eq!(cell_mass(&s, cell), 84.0);
        assert_eq!(s.world.ejected_nodes.len(), 1);
        let blob_id = s.world.ejected_nodes[0];
        let blob = s.world.get_node(blob_id).unwrap();
        assert_eq!(blob.data().mass, 12.0);
        assert_eq!(blob.data().owner_id, None);
        assert!(s.world.is_moving(blob_id));
    }

    #[test]
    fn eject_below_threshold_is_noop() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(31.0))
            .unwrap();
        s.eject_mass(player_id);
        assert_eq!(cell_mass(&s, cell), 31.0);
        assert!(s.world.ejected_nodes.is_empty());
    }

    #[test]
    fn disconnected_cells_linger_then_vanish() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(10.0))
            .unwrap();
        s.disconnect_player(player_id);

        for _ in 0..60 {
            s.update_cells();
        }
        assert!(s.world.get_node(cell).is_some(), "cell culled too early");

        s.update_cells();
        assert!(s.world.get_node(cell).is_none());
        assert!(!s.players.contains_key(&player_id), "player not purged");
    }

    #[test]
    fn recombine_counts_down_per_second() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(36.0))
            .unwrap();
        if let Some(NodeEntry::Player(c)) = s.world.get_node_mut(cell) {
            c.recombine_ticks = 3;
        }
        s.update_cells();
        s.update_cells();
        let Some(NodeEntry::Player(c)) = s.world.get_node(cell) else {
            panic!("cell missing");
        };
        assert_eq!(c.recombine_ticks, 1);
    }

    #[test]
    fn mass_decays_only_above_floor() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let fat = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(1000.0))
            .unwrap();
        let thin = s
            .spawn_player(player_id, Some(Vec2::new(200.0, 200.0)), Some(5.0))
            .unwrap();

        s.update_cells();
        assert!(cell_mass(&s, fat) < 1000.0);
        assert_eq!(cell_mass(&s, thin), 5.0);
    }

    #[test]
    fn virus_spawn_skipped_over_big_cell() {
        let mut s = sim();
        let player_id = s.add_player("a");
        s.spawn_player(player_id, Some(Vec2::new(3000.0, 3000.0)), Some(200.0));

        assert!(!s.try_spawn_virus_at(Vec2::new(3000.0, 3000.0)));
        assert!(s.world.virus_nodes.is_empty());

        assert!(s.try_spawn_virus_at(Vec2::new(100.0, 100.0)));
        assert_eq!(s.world.virus_nodes.len(), 1);
    }

    #[test]
    fn virus_spawn_ignores_small_cells() {
        let mut s = sim();
        let player_id = s.add_player("a");
        s.spawn_player(player_id, Some(Vec2::new(3000.0, 3000.0)), Some(50.0));
        assert!(s.try_spawn_virus_at(Vec2::new(3000.0, 3000.0)));
    }

    #[test]
    fn food_spawner_respects_maximum() {
        let mut s = sim();
        s.config.food.max_amount = 12;
        s.config.food.spawn_amount = 10;
        s.update_food();
        assert_eq!(s.world.current_food, 10);
        s.update_food();
        assert_eq!(s.world.current_food, 12);
        s.update_food();
        assert_eq!(s.world.current_food, 12);
    }

    #[test]
    fn virus_burst_conserves_mass_and_flags_pieces() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let consumer = s
            .spawn_player(player_id, Some(Vec2::new(1000.0, 1000.0)), Some(200.0))
            .unwrap();

        s.virus_burst(player_id, consumer);

        let cells = s.players.get(&player_id).unwrap().cells.clone();
        assert!(cells.len() > 1);
        let total: f32 = cells.iter().map(|&id| cell_mass(&s, id)).sum();
        assert!((total - 200.0).abs() < 0.01);

        for &id in &cells {
            if id == consumer {
                continue;
            }
            let Some(NodeEntry::Player(cell)) = s.world.get_node(id) else {
                panic!("missing burst piece");
            };
            assert!(cell.ignore_collision);
            assert!(cell.recombine_ticks > 0);
            assert!(s.world.is_moving(id));
        }
    }

    #[test]
    fn finished_mover_settles_and_regains_collision() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(1000.0, 1000.0)), Some(20.0))
            .unwrap();
        if let Some(NodeEntry::Player(c)) = s.world.get_node_mut(cell) {
            c.ignore_collision = true;
            c.data.set_move_engine(10.0, 1, 0.9);
        }
        s.world.add_moving(cell);

        s.update_moving_nodes(); // integrates, ticks hit 0
        assert!(s.world.is_moving(cell));
        s.update_moving_nodes(); // settles
        assert!(!s.world.is_moving(cell));
        let Some(NodeEntry::Player(c)) = s.world.get_node(cell) else {
            panic!("cell missing");
        };
        assert!(!c.ignore_collision);
    }

    #[test]
    fn fed_virus_shoots_after_enough_blobs() {
        let mut s = sim();
        let virus_id = s.world.next_id();
        let virus = Virus::new(virus_id, Vec2::new(1000.0, 1000.0), 100.0);
        s.add_node(NodeEntry::Virus(virus));
        if let Some(NodeEntry::Virus(v)) = s.world.get_node_mut(virus_id) {
            v.fed = s.config.virus.feed_amount - 1;
        }

        let blob_id = s.world.next_id();
        let mut blob = EjectedMass::new(blob_id, Vec2::new(1010.0, 1000.0), 12.0);
        blob.data.angle = 1.0;
        s.add_node(NodeEntry::Ejected(blob));

        s.feed_virus(virus_id, blob_id);

        assert!(s.world.get_node(blob_id).is_none());
        assert_eq!(s.world.virus_nodes.len(), 2);
        let Some(NodeEntry::Virus(v)) = s.world.get_node(virus_id) else {
            panic!("virus missing");
        };
        assert_eq!(v.fed, 0);
        assert_eq!(v.data.mass, s.config.virus.start_mass);
    }

    #[test]
    fn virus_eaten_by_heavy_cell_bursts_it() {
        let mut s = sim();
        let player_id = s.add_player("a");
        s.spawn_player(player_id, Some(Vec2::new(1000.0, 1000.0)), Some(200.0));
        let virus_id = s.world.next_id();
        s.add_node(NodeEntry::Virus(Virus::new(
            virus_id,
            Vec2::new(1000.0, 1000.0),
            100.0,
        )));

        s.update_views();
        s.resolve_consumption();

        assert!(s.world.get_node(virus_id).is_none());
        assert!(s.players.get(&player_id).unwrap().cells.len() > 1);
    }

    #[test]
    fn step_runs_spawn_phase_on_interval() {
        let mut s = sim();
        for _ in 0..s.config.food.spawn_interval {
            s.step();
        }
        assert_eq!(s.world.current_food, s.config.food.spawn_amount);
        assert_eq!(s.world.virus_nodes.len(), 1);
    }

    #[test]
    fn owner_movement_stops_at_target() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(10.0))
            .unwrap();
        s.set_player_target(player_id, Vec2::new(102.0, 100.0));

        for _ in 0..10 {
            s.move_player_cells();
        }
        let pos = s.world.get_node(cell).unwrap().data().position;
        assert!((pos.x - 102.0).abs() < 1.0);
        assert_eq!(pos.y, 100.0);
    }

    #[test]
    fn disconnected_owner_cells_stop_chasing() {
        let mut s = sim();
        let player_id = s.add_player("a");
        let cell = s
            .spawn_player(player_id, Some(Vec2::new(100.0, 100.0)), Some(10.0))
            .unwrap();
        s.set_player_target(player_id, Vec2::new(500.0, 100.0));
        s.disconnect_player(player_id);

        s.move_player_cells();
        let pos = s.world.get_node(cell).unwrap().data().position;
        assert_eq!(pos, Vec2::new(100.0, 100.0));
    }
}
