//! Game rules for Partyhall.
//!
//! Three turn-based party games share one action protocol: a client sends
//! an action name plus a JSON payload, and the game's rules either produce
//! the next state or reject the action.
//!
//! - [`CardDraw`]: draw from a shuffled deck until the fourth king
//! - [`PromptResponse`]: reveal prompts, everyone answers
//! - [`Bluffing`]: hidden dice, bids and challenges
//!
//! Each game implements [`GameRules`]. [`GameState`] wraps the payload with
//! the shared turn bookkeeping and dispatches to the right rules, so the
//! coordinator only ever sees one type:
//!
//! ```rust
//! use partyhall_games::{GameType, Phase};
//! use partyhall_protocol::UserId;
//! use rand::SeedableRng;
//!
//! let players = vec![UserId::new("alice"), UserId::new("bob")];
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let state = "kings-cup".parse::<GameType>().unwrap().start(&players, &mut rng);
//! let actor = state.current_turn().unwrap().clone();
//! let next = state.apply("draw", &serde_json::Value::Null, &actor, &mut rng).unwrap();
//!
//! assert_eq!(next.turns.phase, Phase::Playing);
//! assert_ne!(next.current_turn(), Some(&actor));
//! ```

mod bluffing;
mod card_draw;
mod error;
mod prompt;
mod rules;
mod state;

pub use bluffing::{Bid, BidRecord, Bluffing, ChallengeOutcome, DICE_PER_PLAYER};
pub use card_draw::{Card, CardDraw, KINGS_TO_LOSE, Rank, Suit};
pub use error::GameError;
pub use prompt::PromptResponse;
pub use rules::GameRules;
pub use state::{GamePayload, GameState, GameType, Phase, TurnState};
