//! Prompt/response game: the turn holder reveals a prompt, everyone
//! answers whether it applies to them.

use std::collections::BTreeMap;

use partyhall_protocol::UserId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::Value;

use crate::state::serialize_len;
use crate::{GameError, GameRules, Phase, TurnState};

const BUILT_IN_PROMPTS: [&str; 20] = [
    "Never have I ever been skydiving",
    "Never have I ever eaten a bug on purpose",
    "Never have I ever lied to get out of a party",
    "Never have I ever cheated on a test",
    "Never have I ever been kicked out of a bar",
    "Never have I ever gone skinny dipping",
    "Never have I ever broken a bone",
    "Never have I ever gotten a tattoo",
    "Never have I ever been on TV",
    "Never have I ever gone surfing",
    "Never have I ever been to a concert alone",
    "Never have I ever played a drinking game",
    "Never have I ever cried during a movie",
    "Never have I ever ghosted someone",
    "Never have I ever had a crush on a teacher",
    "Never have I ever sent a text to the wrong person",
    "Never have I ever stolen something",
    "Never have I ever been on a blind date",
    "Never have I ever stayed up for more than 24 hours",
    "Never have I ever lied in this game",
];

/// Prompt game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    /// Prompts not yet shown; the next one is the last element.
    #[serde(rename = "promptsRemaining", serialize_with = "serialize_len")]
    pub queue: Vec<String>,
    pub current_prompt: Option<String>,
    pub used_prompts: Vec<String>,
    /// One point per positive answer.
    pub scores: BTreeMap<UserId, u32>,
    pub custom_prompts: Vec<String>,
}

impl PromptResponse {
    /// A game over `prompts` instead of the built-in list, shuffled.
    pub fn with_prompts<R: Rng + ?Sized>(
        prompts: impl IntoIterator<Item = String>,
        players: &[UserId],
        rng: &mut R,
    ) -> Self {
        let mut queue: Vec<String> = prompts.into_iter().collect();
        queue.shuffle(rng);
        Self {
            queue,
            current_prompt: None,
            used_prompts: Vec::new(),
            scores: players.iter().map(|p| (p.clone(), 0)).collect(),
            custom_prompts: Vec::new(),
        }
    }

    fn prompt_text(data: &Value) -> Option<&str> {
        data.get("prompt")
            .or_else(|| data.get("question"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

impl GameRules for PromptResponse {
    fn init<R: Rng + ?Sized>(players: &[UserId], rng: &mut R) -> Self {
        Self::with_prompts(BUILT_IN_PROMPTS.iter().map(|p| p.to_string()), players, rng)
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
            "nextPrompt" | "nextQuestion" => {
                let Some(prompt) = self.queue.pop() else {
                    turns.phase = Phase::GameOver;
                    return Ok(());
                };
                self.current_prompt = Some(prompt.clone());
                self.used_prompts.push(prompt);
                turns.advance(|_| true);
                Ok(())
            }
            "answer" => {
                let answer = data.get("answer").and_then(Value::as_bool).ok_or_else(|| {
                    GameError::InvalidAction("answer needs a boolean 'answer' field".into())
                })?;
                if answer {
                    *self.scores.entry(actor.clone()).or_insert(0) += 1;
                }
                Ok(())
            }
            "addPrompt" | "addCustomQuestion" => {
                let prompt = Self::prompt_text(data)
                    .ok_or_else(|| GameError::InvalidAction("prompt must not be empty".into()))?
                    .to_string();
                self.custom_prompts.push(prompt.clone());
                self.queue.push(prompt);
                self.queue.shuffle(rng);
                Ok(())
            }
            other => Err(GameError::unknown_action(other)),
        }
    }

    fn is_turn_exempt(action: &str) -> bool {
        action == "answer"
    }

    fn describe(&self, turns: &TurnState, action: &str, data: &Value, actor_name: &str) -> String {
        match action {
            "nextPrompt" | "nextQuestion" if turns.is_over() => {
                "No prompts left, that's the game!".to_string()
            }
            "nextPrompt" | "nextQuestion" => match &self.current_prompt {
                Some(prompt) => format!("{actor_name} asked: {prompt}"),
                None => format!("{actor_name} performed {action}"),
            },
            "answer" => {
                if data.get("answer").and_then(Value::as_bool).unwrap_or(false) {
                    format!("{actor_name} has done this!")
                } else {
                    format!("{actor_name} has never done this")
                }
            }
            "addPrompt" | "addCustomQuestion" => format!("{actor_name} added a prompt"),
            _ => format!("{actor_name} performed {action}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameState;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn start(prompts: &[&str]) -> (GameState, StdRng) {
        let players = vec![UserId::new("a"), UserId::new("b")];
        let mut rng = StdRng::seed_from_u64(11);
        let payload =
            PromptResponse::with_prompts(prompts.iter().map(|p| p.to_string()), &players, &mut rng);
        (GameState::start(&players, payload, &mut rng), rng)
    }

    fn payload(state: &GameState) -> &PromptResponse {
        match &state.payload {
            crate::GamePayload::PromptResponse(p) => p,
            other => panic!("expected prompt payload, got {other:?}"),
        }
    }

    #[test]
    fn test_init_uses_built_in_prompts_and_zero_scores() {
        let players = vec![UserId::new("a"), UserId::new("b")];
        let mut rng = StdRng::seed_from_u64(2);
        let game = PromptResponse::init(&players, &mut rng);
        assert_eq!(game.queue.len(), BUILT_IN_PROMPTS.len());
        assert_eq!(game.scores.get(&UserId::new("a")), Some(&0));
    }

    #[test]
    fn test_answer_true_scores_and_keeps_turn() {
        let (state, mut rng) = start(&["p1", "p2"]);
        let holder = state.current_turn().cloned();
        let not_holder = if holder == Some(UserId::new("a")) { "b" } else { "a" };

        let next = state
            .apply("answer", &json!({"answer": true}), &UserId::new(not_holder), &mut rng)
            .unwrap();
        assert_eq!(payload(&next).scores[&UserId::new(not_holder)], 1);
        assert_eq!(next.current_turn().cloned(), holder);
        assert_eq!(payload(&next).queue.len(), 2);

        let next = next
            .apply("answer", &json!({"answer": false}), &UserId::new(not_holder), &mut rng)
            .unwrap();
        assert_eq!(payload(&next).scores[&UserId::new(not_holder)], 1);
    }

    #[test]
    fn test_answer_without_flag_is_invalid() {
        let (state, mut rng) = start(&["p1"]);
        let err = state
            .apply("answer", &json!({}), &UserId::new("a"), &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn test_add_prompt_extends_queue_and_custom_list() {
        let (state, mut rng) = start(&["p1"]);
        let actor = state.current_turn().cloned().unwrap();
        let next = state
            .apply("addCustomQuestion", &json!({"question": "  Never have I ever sung karaoke "}), &actor, &mut rng)
            .unwrap();
        let game = payload(&next);
        assert_eq!(game.custom_prompts, vec!["Never have I ever sung karaoke".to_string()]);
        assert_eq!(game.queue.len(), 2);
        assert!(game.queue.contains(&"Never have I ever sung karaoke".to_string()));
    }

    #[test]
    fn test_add_empty_prompt_is_invalid() {
        let (state, mut rng) = start(&["p1"]);
        let actor = state.current_turn().cloned().unwrap();
        let err = state
            .apply("addPrompt", &json!({"prompt": "   "}), &actor, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn test_only_answer_is_turn_exempt() {
        assert!(PromptResponse::is_turn_exempt("answer"));
        assert!(!PromptResponse::is_turn_exempt("nextPrompt"));
        assert!(!PromptResponse::is_turn_exempt("addPrompt"));
    }
}
