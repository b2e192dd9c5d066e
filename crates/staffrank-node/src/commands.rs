//! Slash-command definitions registered at startup.

use crate::interaction::TARGET_OPTION;
use serde::Serialize;
use staffrank_core::Direction;

/// Command type: chat input (slash command).
const CHAT_INPUT: u8 = 1;
/// Option type: user.
const USER_OPTION: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOptionDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOptionDefinition>,
}

impl CommandDefinition {
    fn for_direction(direction: Direction) -> Self {
        let (description, option) = match direction {
            Direction::Promote => (
                "Promotes a staff member to the next rank.",
                "User to promote",
            ),
            Direction::Demote => (
                "Demotes a staff member to the previous rank.",
                "User to demote",
            ),
        };
        Self {
            kind: CHAT_INPUT,
            name: direction.command_name().to_string(),
            description: description.to_string(),
            options: vec![CommandOptionDefinition {
                kind: USER_OPTION,
                name: TARGET_OPTION.to_string(),
                description: option.to_string(),
                required: true,
            }],
        }
    }
}

/// The promote and demote commands.
pub fn staff_commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::for_direction(Direction::Promote),
        CommandDefinition::for_direction(Direction::Demote),
    ]
}
