//! Card-draw elimination: players take turns drawing from one shuffled
//! deck, and whoever draws the fourth king loses.

use std::fmt;

use partyhall_protocol::UserId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::serialize_len;
use crate::{GameError, GameRules, TurnState};

/// Kings drawn before the game ends.
pub const KINGS_TO_LOSE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
            Suit::Spades => "spades",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "ace")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "jack")]
    Jack,
    #[serde(rename = "queen")]
    Queen,
    #[serde(rename = "king")]
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Ace => "ace",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "jack",
            Rank::Queen => "queen",
            Rank::King => "king",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    #[serde(rename = "value")]
    pub rank: Rank,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}

/// Card-draw game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDraw {
    /// Draw pile; the next card is the last element. Only its size is sent.
    #[serde(rename = "cardsRemaining", serialize_with = "serialize_len")]
    pub deck: Vec<Card>,
    pub current_card: Option<Card>,
    pub drawn_cards: Vec<Card>,
    pub king_count: u8,
}

impl CardDraw {
    /// The 52 cards in suit-then-rank order.
    pub fn standard_deck() -> Vec<Card> {
        Suit::ALL
            .into_iter()
            .flat_map(|suit| Rank::ALL.into_iter().map(move |rank| Card::new(rank, suit)))
            .collect()
    }

    /// A game over a pre-arranged pile. Cards come off the end.
    pub fn with_deck(deck: Vec<Card>) -> Self {
        Self {
            deck,
            current_card: None,
            drawn_cards: Vec::new(),
            king_count: 0,
        }
    }
}

impl GameRules for CardDraw {
    fn init<R: Rng + ?Sized>(_players: &[UserId], rng: &mut R) -> Self {
        let mut deck = Self::standard_deck();
        deck.shuffle(rng);
        Self::with_deck(deck)
    }

    fn apply<R: Rng + ?Sized>(
        &mut self,
        turns: &mut TurnState,
        action: &str,
        _data: &Value,
        actor: &UserId,
        _rng: &mut R,
    ) -> Result<(), GameError> {
        match action {
            "draw" | "drawCard" => {
                let Some(card) = self.deck.pop() else {
                    turns.finish_with_winner(actor.clone());
                    return Ok(());
                };
                self.current_card = Some(card);
                self.drawn_cards.push(card);

                if card.rank == Rank::King {
                    self.king_count += 1;
                    if self.king_count >= KINGS_TO_LOSE {
                        turns.finish_with_loser(actor.clone());
                        return Ok(());
                    }
                }
                turns.advance(|_| true);
                Ok(())
            }
            other => Err(GameError::unknown_action(other)),
        }
    }

    fn describe(&self, turns: &TurnState, action: &str, _data: &Value, actor_name: &str) -> String {
        match (action, self.current_card) {
            ("draw" | "drawCard", _) if turns.is_over() && turns.winner.is_some() => {
                format!("{actor_name} found the deck empty")
            }
            ("draw" | "drawCard", Some(card)) if turns.is_over() => {
                format!("{actor_name} drew the {card}, the last king!")
            }
            ("draw" | "drawCard", Some(card)) => format!("{actor_name} drew the {card}"),
            _ => format!("{actor_name} performed {action}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn turns(players: &[&str]) -> TurnState {
        let order: Vec<UserId> = players.iter().map(|p| UserId::new(*p)).collect();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = crate::GameState::start(&order, CardDraw::with_deck(Vec::new()), &mut rng);
        state.turns.current_turn = order.first().cloned();
        state.turns
    }

    #[test]
    fn test_standard_deck_has_52_unique_cards_and_4_kings() {
        let deck = CardDraw::standard_deck();
        assert_eq!(deck.len(), 52);
        let unique: std::collections::HashSet<_> = deck.iter().collect();
        assert_eq!(unique.len(), 52);
        assert_eq!(deck.iter().filter(|c| c.rank == Rank::King).count(), 4);
    }

    #[test]
    fn test_draw_pops_last_card_and_advances_turn() {
        let mut game = CardDraw::with_deck(vec![
            Card::new(Rank::Two, Suit::Clubs),
            Card::new(Rank::Ace, Suit::Hearts),
        ]);
        let mut turns = turns(&["a", "b"]);
        let mut rng = StdRng::seed_from_u64(0);
        game.apply(&mut turns, "draw", &Value::Null, &UserId::new("a"), &mut rng)
            .unwrap();

        assert_eq!(game.current_card, Some(Card::new(Rank::Ace, Suit::Hearts)));
        assert_eq!(game.deck.len(), 1);
        assert_eq!(turns.current_turn, Some(UserId::new("b")));
    }

    #[test]
    fn test_draw_from_empty_deck_ends_with_winner() {
        let mut game = CardDraw::with_deck(Vec::new());
        let mut turns = turns(&["a", "b"]);
        let mut rng = StdRng::seed_from_u64(0);
        game.apply(&mut turns, "drawCard", &Value::Null, &UserId::new("a"), &mut rng)
            .unwrap();
        assert!(turns.is_over());
        assert_eq!(turns.winner, Some(UserId::new("a")));
        assert_eq!(
            game.describe(&turns, "drawCard", &Value::Null, "Alice"),
            "Alice found the deck empty"
        );
    }

    #[test]
    fn test_unknown_action_is_invalid() {
        let mut game = CardDraw::with_deck(Vec::new());
        let mut turns = turns(&["a", "b"]);
        let mut rng = StdRng::seed_from_u64(0);
        let err = game
            .apply(&mut turns, "shuffle", &Value::Null, &UserId::new("a"), &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn test_card_serializes_with_value_field() {
        let json = serde_json::to_string(&Card::new(Rank::King, Suit::Spades)).unwrap();
        assert_eq!(json, r#"{"suit":"spades","value":"king"}"#);
    }
}
