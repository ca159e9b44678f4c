//! MCP Prompts
//!
//! Canned conversations that steer the agent towards the right tools.

use std::collections::HashMap;

use super::error::RegistryError;
use super::protocol::{PromptMessage, PromptsGetResult};
use super::registry::{McpRegistry, PromptBuilder, RegisteredPrompt};

/// Register all prompts with the registry
pub fn register_all_prompts(registry: &mut McpRegistry) -> Result<(), RegistryError> {
    registry.register_prompt(greeting_prompt())?;
    registry.register_prompt(restaurant_creation_prompt())?;
    registry.register_prompt(table_creation_prompt())?;
    registry.register_prompt(error_handling_prompt())?;
    Ok(())
}

fn arg<'a>(args: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    args.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn conversation(description: &str, user: String, assistant: String) -> PromptsGetResult {
    PromptsGetResult {
        description: description.to_string(),
        messages: vec![PromptMessage::user(user), PromptMessage::assistant(assistant)],
    }
}

// ============================================================================
// restaurant_greeting
// ============================================================================

const GREETING: &str = "A friendly greeting for users of the restaurant management system";

fn greeting_prompt() -> RegisteredPrompt {
    PromptBuilder::new("restaurant_greeting")
        .description(GREETING)
        .argument("userName", "User's name if available", false)
        .build(|args| {
            let name = arg(args, "userName");
            conversation(
                GREETING,
                format!(
                    "Greet {} as their restaurant management assistant.",
                    name.unwrap_or("the user")
                ),
                format!(
                    "Hello {}! I'm your restaurant management assistant. I can create \
                     restaurants, set up their tables, manage staff and roles. \
                     What would you like to do today?",
                    name.unwrap_or("there")
                ),
            )
        })
}

// ============================================================================
// restaurant_creation
// ============================================================================

const RESTAURANT_CREATION: &str = "Guide users through creating a new restaurant";

fn restaurant_creation_prompt() -> RegisteredPrompt {
    PromptBuilder::new("restaurant_creation")
        .description(RESTAURANT_CREATION)
        .build(|_| {
            conversation(
                RESTAURANT_CREATION,
                "How should I guide the user to create a new restaurant?".to_string(),
                "To create a new restaurant I need its name, at least 3 characters long. \
                 What would you like to call it?\n\n\
                 Once you give me a name I'll call the create-restaurant tool and tell you \
                 the ID the system assigned."
                    .to_string(),
            )
        })
}

// ============================================================================
// table_creation
// ============================================================================

const TABLE_CREATION: &str = "Guide users through creating a table for a restaurant";

fn table_creation_prompt() -> RegisteredPrompt {
    PromptBuilder::new("table_creation")
        .description(TABLE_CREATION)
        .argument(
            "restaurant_id",
            "ID of the restaurant where the table will be created",
            false,
        )
        .argument(
            "restaurant_name",
            "Name of the restaurant where the table will be created",
            false,
        )
        .build(|args| {
            let id = arg(args, "restaurant_id");
            let name = arg(args, "restaurant_name");

            let mut question = "How should I guide the user to create a new table".to_string();
            if let Some(id) = id {
                question.push_str(&format!(" for restaurant ID {}", id));
            }
            if let Some(name) = name {
                question.push_str(&format!(" ({})", name));
            }
            question.push('?');

            let mut answer = match name {
                Some(name) => format!("To create a new table for {}, I need:\n\n", name),
                None => "To create a new table, I need:\n\n".to_string(),
            };
            answer.push_str("1. A table name (e.g. \"Table 1\" or \"Window Booth\")\n");
            answer.push_str("2. Its seating capacity\n");
            if id.is_none() {
                answer.push_str("3. The ID of the restaurant it belongs to\n");
            }
            answer.push_str("\nWith those details I'll call the create-table tool.");
            if let Some(id) = id {
                answer.push_str(&format!(" The table will go to restaurant ID {}.", id));
            }

            conversation(TABLE_CREATION, question, answer)
        })
}

// ============================================================================
// error_handling
// ============================================================================

const ERROR_HANDLING: &str =
    "Guide on handling errors gracefully in the restaurant management system";

fn error_handling_prompt() -> RegisteredPrompt {
    PromptBuilder::new("error_handling")
        .description(ERROR_HANDLING)
        .argument("error_type", "Type of error encountered", false)
        .argument("error_message", "The specific error message", false)
        .build(|args| {
            let question = match (arg(args, "error_type"), arg(args, "error_message")) {
                (Some(kind), Some(message)) => format!(
                    "How should I handle a {} error with message: \"{}\"?",
                    kind, message
                ),
                (Some(kind), None) => format!("How should I handle a {} error?", kind),
                (None, Some(message)) => {
                    format!("How should I handle an error with message: \"{}\"?", message)
                }
                (None, None) => "How should I handle an error?".to_string(),
            };

            conversation(
                ERROR_HANDLING,
                question,
                "When a tool fails I should explain what went wrong in plain language, \
                 suggest how the user can fix it and offer an alternative when there is one.\n\n\
                 If restaurant creation fails because the name is taken, I might say: \
                 \"That name is already in use. Would you like to try another one?\"\n\n\
                 If a tool reports that the authentication token was not found, the user \
                 needs to log in again before retrying."
                    .to_string(),
            )
        })
}
