//! Bluffing dice game.
//!
//! Each round every active player rolls hidden dice, then players take
//! turns raising a claim about how many dice on the whole table show a
//! given face. Any player holding the turn may instead challenge the last
//! claim. Whoever was wrong loses a die; the last player with dice wins.

use std::collections::BTreeMap;

use partyhall_protocol::{UserId, now_millis};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::{GameError, GameRules, Phase, TurnState};

/// Dice each player starts with.
pub const DICE_PER_PLAYER: u8 = 5;

/// A claim: at least `quantity` dice on the table show `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub quantity: u32,
    pub value: u8,
    pub bidder_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRecord {
    #[serde(flatten)]
    pub bid: Bid,
    pub round: u32,
    pub timestamp: u64,
}

/// How the most recent challenge played out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOutcome {
    pub challenger_id: UserId,
    pub bid: Bid,
    /// Dice on the table that matched the bid's face.
    pub actual_count: u32,
    /// `true` when the bidder was bluffing.
    pub succeeded: bool,
    pub loser_id: UserId,
}

/// Bluffing game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bluffing {
    /// This round's rolls. A player missing here hasn't rolled yet.
    pub dice: BTreeMap<UserId, Vec<u8>>,
    /// Dice each player rolls; zero once eliminated.
    pub dice_counts: BTreeMap<UserId, u8>,
    /// Players still holding dice, in seat order.
    pub active_players: Vec<UserId>,
    pub current_bid: Option<Bid>,
    pub bid_history: Vec<BidRecord>,
    pub dice_per_player: u8,
    pub last_challenge: Option<ChallengeOutcome>,
    pub last_round_loser: Option<UserId>,
}

impl Bluffing {
    fn is_active(&self, player: &UserId) -> bool {
        self.active_players.contains(player)
    }

    fn everyone_rolled(&self) -> bool {
        self.active_players.iter().all(|p| self.dice.contains_key(p))
    }

    /// Dice showing `value` across all active players.
    pub fn count_face(&self, value: u8) -> u32 {
        self.active_players
            .iter()
            .filter_map(|p| self.dice.get(p))
            .flatten()
            .filter(|&&die| die == value)
            .count() as u32
    }

    fn parse_bid(data: &Value, bidder: &UserId) -> Result<Bid, GameError> {
        let quantity = data
            .get("quantity")
            .and_then(Value::as_u64)
            .filter(|&q| q >= 1)
            .ok_or_else(|| GameError::InvalidAction("bid quantity must be at least 1".into()))?;
        let value = data
            .get("value")
            .and_then(Value::as_u64)
            .filter(|v| (1..=6).contains(v))
            .ok_or_else(|| GameError::InvalidAction("bid value must be between 1 and 6".into()))?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| GameError::InvalidAction("bid quantity is too large".into()))?;
        Ok(Bid {
            quantity,
            value: value as u8,
            bidder_id: bidder.clone(),
        })
    }

    fn roll<R: Rng + ?Sized>(
        &mut self,
        turns: &mut TurnState,
        actor: &UserId,
        rng: &mut R,
    ) -> Result<(), GameError> {
        if turns.phase != Phase::Rolling {
            return Err(GameError::InvalidAction("dice are rolled at the start of a round".into()));
        }
        if !self.is_active(actor) {
            return Err(GameError::InvalidAction("you are out of dice".into()));
        }
        if self.dice.contains_key(actor) {
            return Err(GameError::InvalidAction("you already rolled this round".into()));
        }
        let count = self.dice_counts.get(actor).copied().unwrap_or(0);
        let roll = (0..count).map(|_| rng.random_range(1..=6)).collect();
        self.dice.insert(actor.clone(), roll);

        if self.everyone_rolled() {
            turns.phase = Phase::Bidding;
        }
        Ok(())
    }

    fn place_bid(&mut self, turns: &mut TurnState, data: &Value, actor: &UserId) -> Result<(), GameError> {
        if turns.phase != Phase::Bidding {
            return Err(GameError::InvalidAction("bids open once everyone has rolled".into()));
        }
        let bid = Self::parse_bid(data, actor)?;
        self.bid_history.push(BidRecord {
            bid: bid.clone(),
            round: turns.round,
            timestamp: now_millis(),
        });
        self.current_bid = Some(bid);
        turns.advance(|p| self.is_active(p));
        Ok(())
    }

    fn challenge(&mut self, turns: &mut TurnState, actor: &UserId) -> Result<(), GameError> {
        let Some(bid) = self.current_bid.take() else {
            return Err(GameError::InvalidAction("there is no bid to challenge".into()));
        };
        let actual_count = self.count_face(bid.value);
        let succeeded = actual_count < bid.quantity;
        let loser = if succeeded { bid.bidder_id.clone() } else { actor.clone() };

        let remaining = self.dice_counts.entry(loser.clone()).or_insert(0);
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.active_players.retain(|p| *p != loser);
        }

        self.last_challenge = Some(ChallengeOutcome {
            challenger_id: actor.clone(),
            bid,
            actual_count,
            succeeded,
            loser_id: loser.clone(),
        });
        self.last_round_loser = Some(loser.clone());

        if let [last] = self.active_players.as_slice() {
            turns.finish_with_winner(last.clone());
            return Ok(());
        }

        turns.round += 1;
        turns.phase = Phase::Rolling;
        self.dice.clear();
        // A loser who has left the table is no longer in the turn order, so
        // the seat after the challenger starts instead.
        turns.current_turn = if self.is_active(&loser) {
            Some(loser)
        } else {
            turns
                .next_after(&loser, |p| self.is_active(p))
                .or_else(|| turns.next_after(actor, |p| self.is_active(p)))
        };
        Ok(())
    }
}

impl GameRules for Bluffing {
    fn init<R: Rng + ?Sized>(players: &[UserId], _rng: &mut R) -> Self {
        Self {
            dice: BTreeMap::new(),
            dice_counts: players.iter().map(|p| (p.clone(), DICE_PER_PLAYER)).collect(),
            active_players: players.to_vec(),
            current_bid: None,
            bid_history: Vec::new(),
            dice_per_player: DICE_PER_PLAYER,
            last_challenge: None,
            last_round_loser: None,
        }
    }

    fn initial_phase() -> Phase {
        Phase::Rolling
    }

    fn apply<R: Rng + ?Sized>(
        &mut self,
        turns: &mut TurnState,
        action: &str,
        data: &Value,
        actor: &UserId,
        rng: &mut R,
    ) -> Result<(), GameError> {
        match action {
            "rollDice" => self.roll(turns, actor, rng),
            "placeBid" => self.place_bid(turns, data, actor),
            "challenge" => self.challenge(turns, actor),
            other => Err(GameError::unknown_action(other)),
        }
    }

    fn is_turn_exempt(action: &str) -> bool {
        action == "rollDice"
    }

    fn is_eligible(&self, player: &UserId) -> bool {
        self.is_active(player)
    }

    fn describe(&self, _turns: &TurnState, action: &str, data: &Value, actor_name: &str) -> String {
        match action {
            "rollDice" => format!("{actor_name} rolled their dice"),
            "placeBid" => {
                let quantity = data.get("quantity").and_then(Value::as_u64).unwrap_or(0);
                let value = data.get("value").and_then(Value::as_u64).unwrap_or(0);
                format!("{actor_name} bid {quantity} {value}'s")
            }
            "challenge" => match &self.last_challenge {
                Some(outcome) if outcome.succeeded => format!(
                    "{actor_name} challenged the last bid and caught a bluff: only {} {}'s",
                    outcome.actual_count, outcome.bid.value
                ),
                Some(outcome) => format!(
                    "{actor_name} challenged the last bid and was wrong: there were {} {}'s",
                    outcome.actual_count, outcome.bid.value
                ),
                None => format!("{actor_name} challenged the last bid!"),
            },
            _ => format!("{actor_name} performed {action}"),
        }
    }

    fn on_player_left(&mut self, turns: &mut TurnState, player: &UserId) {
        self.active_players.retain(|p| p != player);
        self.dice.remove(player);
        self.dice_counts.insert(player.clone(), 0);

        if turns.is_over() {
            return;
        }
        match self.active_players.as_slice() {
            [last] => turns.finish_with_winner(last.clone()),
            [] => turns.phase = Phase::GameOver,
            _ if turns.phase == Phase::Rolling && self.everyone_rolled() => {
                turns.phase = Phase::Bidding;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GamePayload, GameState};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn players() -> Vec<UserId> {
        vec![UserId::new("a"), UserId::new("b"), UserId::new("c")]
    }

    fn bluffing(state: &GameState) -> &Bluffing {
        match &state.payload {
            GamePayload::Bluffing(b) => b,
            other => panic!("expected bluffing payload, got {other:?}"),
        }
    }

    fn rolled_game(rng: &mut StdRng) -> GameState {
        let players = players();
        let mut state = crate::GameType::Bluffing.start(&players, rng);
        for p in &players {
            state = state.apply("rollDice", &Value::Null, p, rng).unwrap();
        }
        state
    }

    #[test]
    fn test_init_gives_everyone_five_dice_and_rolling_phase() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = crate::GameType::Bluffing.start(&players(), &mut rng);
        assert_eq!(state.turns.phase, Phase::Rolling);
        let game = bluffing(&state);
        assert!(game.dice_counts.values().all(|&c| c == DICE_PER_PLAYER));
        assert!(game.dice.is_empty());
    }

    #[test]
    fn test_bidding_opens_after_everyone_rolls() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = rolled_game(&mut rng);
        assert_eq!(state.turns.phase, Phase::Bidding);
        let game = bluffing(&state);
        for dice in game.dice.values() {
            assert_eq!(dice.len(), DICE_PER_PLAYER as usize);
            assert!(dice.iter().all(|d| (1..=6).contains(d)));
        }
    }

    #[test]
    fn test_second_roll_in_same_round_is_invalid() {
        let mut rng = StdRng::seed_from_u64(5);
        let players = players();
        let state = crate::GameType::Bluffing.start(&players, &mut rng);
        let state = state.apply("rollDice", &Value::Null, &players[0], &mut rng).unwrap();
        let err = state
            .apply("rollDice", &Value::Null, &players[0], &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn test_bid_before_rolling_is_invalid() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = crate::GameType::Bluffing.start(&players(), &mut rng);
        let actor = state.current_turn().cloned().unwrap();
        let err = state
            .apply("placeBid", &json!({"quantity": 2, "value": 3}), &actor, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn test_bid_value_out_of_range_is_invalid() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = rolled_game(&mut rng);
        let actor = state.current_turn().cloned().unwrap();
        for data in [json!({"quantity": 2, "value": 7}), json!({"quantity": 0, "value": 3}), json!({})] {
            let err = state.apply("placeBid", &data, &actor, &mut rng).unwrap_err();
            assert!(matches!(err, GameError::InvalidAction(_)));
        }
    }

    #[test]
    fn test_place_bid_records_history_and_advances_turn() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = rolled_game(&mut rng);
        let actor = state.current_turn().cloned().unwrap();
        let next = state
            .apply("placeBid", &json!({"quantity": 2, "value": 3}), &actor, &mut rng)
            .unwrap();
        let game = bluffing(&next);
        let bid = game.current_bid.as_ref().unwrap();
        assert_eq!((bid.quantity, bid.value), (2, 3));
        assert_eq!(bid.bidder_id, actor);
        assert_eq!(game.bid_history.len(), 1);
        assert_ne!(next.current_turn(), Some(&actor));
    }

    #[test]
    fn test_challenge_without_bid_is_invalid() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = rolled_game(&mut rng);
        let actor = state.current_turn().cloned().unwrap();
        let err = state
            .apply("challenge", &Value::Null, &actor, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn test_failed_challenge_costs_challenger_a_die() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = rolled_game(&mut rng);
        let [a, b, _c] = <[UserId; 3]>::try_from(players()).unwrap();
        if let GamePayload::Bluffing(game) = &mut state.payload {
            game.dice.insert(a.clone(), vec![2, 2, 1, 1, 1]);
            game.dice.insert(b.clone(), vec![2, 5, 5, 5, 5]);
            game.current_bid = Some(Bid { quantity: 3, value: 2, bidder_id: a.clone() });
        }
        state.turns.current_turn = Some(b.clone());

        let next = state.apply("challenge", &Value::Null, &b, &mut rng).unwrap();
        let game = bluffing(&next);
        assert_eq!(game.dice_counts[&b], DICE_PER_PLAYER - 1);
        assert_eq!(game.dice_counts[&a], DICE_PER_PLAYER);
        assert_eq!(next.turns.current_turn, Some(b.clone()));
        assert_eq!(next.turns.round, 2);
        assert_eq!(next.turns.phase, Phase::Rolling);
        assert!(game.dice.is_empty());
        assert!(game.current_bid.is_none());
        assert!(!game.last_challenge.as_ref().unwrap().succeeded);
    }

    #[test]
    fn test_losing_last_die_eliminates_and_can_end_game() {
        let mut rng = StdRng::seed_from_u64(5);
        let players = vec![UserId::new("a"), UserId::new("b")];
        let mut state = crate::GameType::Bluffing.start(&players, &mut rng);
        for p in &players {
            state = state.apply("rollDice", &Value::Null, p, &mut rng).unwrap();
        }
        if let GamePayload::Bluffing(game) = &mut state.payload {
            game.dice_counts.insert(players[0].clone(), 1);
            game.dice.insert(players[0].clone(), vec![6]);
            game.dice.insert(players[1].clone(), vec![1, 1, 1, 1, 1]);
            game.current_bid = Some(Bid { quantity: 4, value: 6, bidder_id: players[0].clone() });
        }

        let next = state.apply("challenge", &Value::Null, &players[1], &mut rng).unwrap();
        assert!(next.is_over());
        assert_eq!(next.turns.winner, Some(players[1].clone()));
        assert_eq!(bluffing(&next).active_players, vec![players[1].clone()]);
    }

    #[test]
    fn test_player_leaving_ends_two_player_game() {
        let mut rng = StdRng::seed_from_u64(5);
        let players = vec![UserId::new("a"), UserId::new("b")];
        let mut state = crate::GameType::Bluffing.start(&players, &mut rng);
        state.remove_player(&players[0]);
        assert!(state.is_over());
        assert_eq!(state.turns.winner, Some(players[1].clone()));
    }

    #[test]
    fn test_player_leaving_during_roll_opens_bidding_when_rest_rolled() {
        let mut rng = StdRng::seed_from_u64(5);
        let players = players();
        let mut state = crate::GameType::Bluffing.start(&players, &mut rng);
        state = state.apply("rollDice", &Value::Null, &players[0], &mut rng).unwrap();
        state = state.apply("rollDice", &Value::Null, &players[1], &mut rng).unwrap();
        state.remove_player(&players[2]);
        assert_eq!(state.turns.phase, Phase::Bidding);
        assert!(!state.turns.turn_order.contains(&players[2]));
    }
}
