use serde::{Deserialize, Serialize};

use crate::answer::{Answer, Source};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

/// Chat transcript for one session. Display only: earlier turns are not fed
/// back into retrieval or the prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, question: &str) {
        self.turns.push(ConversationTurn {
            role: Role::User,
            content: question.to_string(),
            sources: Vec::new(),
        });
    }

    pub fn push_assistant(&mut self, answer: &Answer) {
        self.turns.push(ConversationTurn {
            role: Role::Assistant,
            content: answer.answer.clone(),
            sources: answer.sources.clone(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_turn_order_and_sources() {
        let mut c = Conversation::new();
        c.push_user("What is an EP?");
        c.push_assistant(&Answer {
            answer: "An Employment Pass is...".to_string(),
            sources: vec![Source {
                title: "EP".to_string(),
                url: "https://www.mom.gov.sg/ep".to_string(),
                pass_type: "Employment Pass".to_string(),
                category: "employment_passes".to_string(),
            }],
            question: "What is an EP?".to_string(),
        });
        let roles: Vec<Role> = c.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(c.turns()[1].sources.len(), 1);
        c.clear();
        assert!(c.turns().is_empty());
    }
}
