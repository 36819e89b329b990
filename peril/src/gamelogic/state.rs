//! Per-player game state and the rules applied to incoming messages.
//!
//! `GameState` is plain synchronous data. Concurrent access goes through
//! [`super::GameHandle`], which owns one instance on its own task.

use std::fmt::Write as _;

use tracing::debug;

use super::types::{power_level, ArmyMove, Location, Player, RecognitionOfWar, Unit, UnitRank};
use super::GameError;
use crate::routing::PlayingState;

/// Result of seeing another player's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move came from ourselves.
    SamePlayer,
    /// No shared location; nothing to do.
    Safe,
    /// The mover shares a location with us.
    MakeWar,
}

/// Result of resolving a war recognition from our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarOutcome {
    NotInvolved,
    NoUnits,
    OpponentWon,
    YouWon,
    Draw,
}

/// Outcome of a war plus the usernames for the game log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarResolution {
    pub outcome: WarOutcome,
    pub winner: String,
    pub loser: String,
    /// Human-readable account of the battle.
    pub report: String,
}

impl WarResolution {
    fn uninvolved(outcome: WarOutcome, report: String) -> Self {
        Self {
            outcome,
            winner: String::new(),
            loser: String::new(),
            report,
        }
    }

    /// Line published to the game log, if the war was actually fought.
    pub fn log_message(&self) -> Option<String> {
        match self.outcome {
            WarOutcome::Draw => Some(format!(
                "A war between {} and {} resulted in a draw",
                self.winner, self.loser
            )),
            WarOutcome::OpponentWon | WarOutcome::YouWon => {
                Some(format!("{} won a war against {}", self.winner, self.loser))
            }
            WarOutcome::NotInvolved | WarOutcome::NoUnits => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    player: Player,
    paused: bool,
}

impl GameState {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            player: Player::new(username),
            paused: false,
        }
    }

    pub fn username(&self) -> &str {
        &self.player.username
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Copy of our player, as attached to outgoing messages.
    pub fn player_snapshot(&self) -> Player {
        self.player.clone()
    }

    /// `spawn <location> <rank>`
    pub fn spawn(&mut self, words: &[String]) -> Result<Unit, GameError> {
        if words.len() < 3 {
            return Err(GameError::Usage("spawn <location> <rank>"));
        }

        let location: Location = words[1].parse()?;
        let rank: UnitRank = words[2].parse()?;
        let id = self.player.units.keys().next_back().map_or(1, |last| last + 1);

        let unit = Unit { id, rank, location };
        self.player.units.insert(id, unit.clone());

        debug!(unit_id = id, rank = %rank, location = %location, "unit_spawned");
        Ok(unit)
    }

    /// `move <location> <unitID> [unitID...]`
    pub fn move_units(&mut self, words: &[String]) -> Result<ArmyMove, GameError> {
        if self.paused {
            return Err(GameError::Paused);
        }
        if words.len() < 3 {
            return Err(GameError::Usage("move <location> <unitID> <unitID> <unitID>..."));
        }

        let to_location: Location = words[1].parse()?;

        let mut ids = Vec::with_capacity(words.len() - 2);
        for word in &words[2..] {
            let id: u32 = word
                .parse()
                .map_err(|_| GameError::InvalidUnitId(word.clone()))?;
            if !self.player.units.contains_key(&id) {
                return Err(GameError::UnitNotFound(id));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut units = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(unit) = self.player.units.get_mut(&id) {
                unit.location = to_location;
                units.push(unit.clone());
            }
        }

        Ok(ArmyMove {
            player: self.player_snapshot(),
            units,
            to_location,
        })
    }

    /// Multi-line summary for the `status` command.
    pub fn status(&self) -> String {
        let mut out = String::new();
        if self.paused {
            let _ = writeln!(out, "The game state is: PAUSED");
        } else {
            let _ = writeln!(out, "The game state is: PLAYING");
        }
        let _ = writeln!(out, "You are {}, and you have {} units.", self.player.username, self.player.units.len());
        for unit in self.player.units.values() {
            let _ = writeln!(out, "* {}: {}, {}", unit.id, unit.location, unit.rank);
        }
        out
    }

    pub fn handle_pause(&mut self, state: PlayingState) {
        self.paused = state.is_paused;
    }

    pub fn handle_move(&self, mv: &ArmyMove) -> MoveOutcome {
        if mv.player.username == self.player.username {
            return MoveOutcome::SamePlayer;
        }

        match self.player.overlapping_location(&mv.player) {
            Some(_) => MoveOutcome::MakeWar,
            None => MoveOutcome::Safe,
        }
    }

    pub fn handle_war(&mut self, rw: &RecognitionOfWar) -> WarResolution {
        let me = self.player.username.clone();
        let mut report = format!("{} has declared war on {}!\n", rw.attacker.username, rw.defender.username);

        if me == rw.defender.username {
            let _ = writeln!(report, "{me}, you published the war.");
            return WarResolution::uninvolved(WarOutcome::NotInvolved, report);
        }
        if me != rw.attacker.username {
            let _ = writeln!(report, "{me}, you are not involved in this war.");
            return WarResolution::uninvolved(WarOutcome::NotInvolved, report);
        }

        let Some(location) = rw.attacker.overlapping_location(&rw.defender) else {
            let _ = writeln!(report, "Error! No units are in the same location. No war will be fought.");
            return WarResolution::uninvolved(WarOutcome::NoUnits, report);
        };

        let attacker_power = power_level(rw.attacker.units_in(location));
        let defender_power = power_level(rw.defender.units_in(location));
        let _ = writeln!(report, "{}'s power in {location}: {attacker_power}", rw.attacker.username);
        let _ = writeln!(report, "{}'s power in {location}: {defender_power}", rw.defender.username);

        let attacker = rw.attacker.username.clone();
        let defender = rw.defender.username.clone();

        let (outcome, winner, loser) = if attacker_power > defender_power {
            let _ = writeln!(report, "{attacker} has won the war!");
            (WarOutcome::YouWon, attacker, defender)
        } else if defender_power > attacker_power {
            let _ = writeln!(report, "{defender} has won the war!");
            let _ = writeln!(report, "You have lost the war! Your units in {location} have been killed.");
            self.remove_units_in(location);
            (WarOutcome::OpponentWon, defender, attacker)
        } else {
            let _ = writeln!(report, "The war ended in a draw! Your units in {location} have been killed.");
            self.remove_units_in(location);
            (WarOutcome::Draw, attacker, defender)
        };

        WarResolution {
            outcome,
            winner,
            loser,
            report,
        }
    }

    fn remove_units_in(&mut self, location: Location) {
        self.player.units.retain(|_, u| u.location != location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn state_with(username: &str, spawns: &[&str]) -> GameState {
        let mut gs = GameState::new(username);
        for spawn in spawns {
            gs.spawn(&words(spawn)).unwrap();
        }
        gs
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut gs = GameState::new("alice");
        let first = gs.spawn(&words("spawn europe infantry")).unwrap();
        let second = gs.spawn(&words("spawn asia artillery")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.rank, UnitRank::Artillery);
        assert_eq!(gs.player_snapshot().units.len(), 2);
    }

    #[test]
    fn test_spawn_rejects_bad_input() {
        let mut gs = GameState::new("alice");
        assert!(matches!(gs.spawn(&words("spawn europe")), Err(GameError::Usage(_))));
        assert!(matches!(gs.spawn(&words("spawn mars infantry")), Err(GameError::UnknownLocation(_))));
        assert!(matches!(gs.spawn(&words("spawn europe wizard")), Err(GameError::UnknownRank(_))));
    }

    #[test]
    fn test_move_relocates_units() {
        let mut gs = state_with("alice", &["spawn europe infantry", "spawn europe cavalry"]);
        let mv = gs.move_units(&words("move asia 1 2")).unwrap();

        assert_eq!(mv.to_location, Location::Asia);
        assert_eq!(mv.units.len(), 2);
        assert!(mv.player.units.values().all(|u| u.location == Location::Asia));
    }

    #[test]
    fn test_move_repeated_id_counts_once() {
        let mut gs = state_with("alice", &["spawn europe infantry"]);
        let mv = gs.move_units(&words("move asia 1 1 1")).unwrap();

        assert_eq!(mv.units.len(), 1);
        assert_eq!(mv.units[0].id, 1);
    }

    #[test]
    fn test_move_unknown_unit() {
        let mut gs = state_with("alice", &["spawn europe infantry"]);
        assert!(matches!(gs.move_units(&words("move asia 7")), Err(GameError::UnitNotFound(7))));
        assert!(matches!(gs.move_units(&words("move asia x")), Err(GameError::InvalidUnitId(_))));
        // Nothing moved on failure.
        assert!(gs.player_snapshot().units.values().all(|u| u.location == Location::Europe));
    }

    #[test]
    fn test_move_while_paused() {
        let mut gs = state_with("alice", &["spawn europe infantry"]);
        gs.handle_pause(PlayingState { is_paused: true });
        assert!(matches!(gs.move_units(&words("move asia 1")), Err(GameError::Paused)));

        gs.handle_pause(PlayingState { is_paused: false });
        assert!(gs.move_units(&words("move asia 1")).is_ok());
    }

    #[test]
    fn test_handle_move_outcomes() {
        let alice = state_with("alice", &["spawn europe infantry"]);
        let mut bob = state_with("bob", &["spawn africa infantry"]);

        let own = alice.clone().move_units(&words("move europe 1")).unwrap();
        assert_eq!(alice.handle_move(&own), MoveOutcome::SamePlayer);

        let safe = bob.move_units(&words("move asia 1")).unwrap();
        assert_eq!(alice.handle_move(&safe), MoveOutcome::Safe);

        let war = bob.move_units(&words("move europe 1")).unwrap();
        assert_eq!(alice.handle_move(&war), MoveOutcome::MakeWar);
    }

    #[test]
    fn test_war_not_involved() {
        let mut carol = GameState::new("carol");
        let rw = RecognitionOfWar {
            attacker: Player::new("alice"),
            defender: Player::new("bob"),
        };
        assert_eq!(carol.handle_war(&rw).outcome, WarOutcome::NotInvolved);

        let mut bob = GameState::new("bob");
        assert_eq!(bob.handle_war(&rw).outcome, WarOutcome::NotInvolved);
    }

    #[test]
    fn test_war_no_shared_location() {
        let mut alice = state_with("alice", &["spawn europe infantry"]);
        let bob = state_with("bob", &["spawn asia infantry"]);
        let rw = RecognitionOfWar {
            attacker: alice.player_snapshot(),
            defender: bob.player_snapshot(),
        };
        let resolution = alice.handle_war(&rw);
        assert_eq!(resolution.outcome, WarOutcome::NoUnits);
        assert_eq!(resolution.log_message(), None);
    }

    #[test]
    fn test_war_attacker_wins() {
        let mut alice = state_with("alice", &["spawn europe artillery"]);
        let bob = state_with("bob", &["spawn europe infantry"]);
        let rw = RecognitionOfWar {
            attacker: alice.player_snapshot(),
            defender: bob.player_snapshot(),
        };

        let resolution = alice.handle_war(&rw);
        assert_eq!(resolution.outcome, WarOutcome::YouWon);
        assert_eq!(resolution.log_message().unwrap(), "alice won a war against bob");
        assert_eq!(alice.player_snapshot().units.len(), 1);
    }

    #[test]
    fn test_war_attacker_loses_units() {
        let mut alice = state_with("alice", &["spawn europe infantry", "spawn asia infantry"]);
        let bob = state_with("bob", &["spawn europe cavalry"]);
        let rw = RecognitionOfWar {
            attacker: alice.player_snapshot(),
            defender: bob.player_snapshot(),
        };

        let resolution = alice.handle_war(&rw);
        assert_eq!(resolution.outcome, WarOutcome::OpponentWon);
        assert_eq!(resolution.winner, "bob");
        assert_eq!(resolution.loser, "alice");

        let remaining = alice.player_snapshot();
        assert_eq!(remaining.units.len(), 1);
        assert!(remaining.units.values().all(|u| u.location == Location::Asia));
    }

    #[test]
    fn test_war_draw() {
        let mut alice = state_with("alice", &["spawn europe cavalry"]);
        let bob = state_with("bob", &["spawn europe cavalry"]);
        let rw = RecognitionOfWar {
            attacker: alice.player_snapshot(),
            defender: bob.player_snapshot(),
        };

        let resolution = alice.handle_war(&rw);
        assert_eq!(resolution.outcome, WarOutcome::Draw);
        assert_eq!(
            resolution.log_message().unwrap(),
            "A war between alice and bob resulted in a draw"
        );
        assert!(alice.player_snapshot().units.is_empty());
    }

    #[test]
    fn test_status_lists_units() {
        let gs = state_with("alice", &["spawn africa cavalry"]);
        let status = gs.status();
        assert!(status.contains("PLAYING"));
        assert!(status.contains("* 1: africa, cavalry"));
    }
}
