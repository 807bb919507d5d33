use std::collections::HashMap;

pub mod expense;
pub mod group;
pub mod ledger;
pub mod system;
pub mod user;

use crate::cli::core::{CommandError, CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(user::definitions());
    commands.extend(group::definitions());
    commands.extend(expense::definitions());
    commands.extend(ledger::definitions());
    commands.extend(system::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// Splits a comma-separated argument into trimmed, non-empty items.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_amount(raw: &str, what: &str) -> Result<f64, CommandError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidArguments(format!("invalid {what} `{raw}`")))
}

pub(crate) fn parse_amounts(raw: &str, what: &str) -> Result<Vec<f64>, CommandError> {
    parse_list(raw)
        .iter()
        .map(|item| parse_amount(item, what))
        .collect()
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {usage}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_skip_blank_items() {
        assert_eq!(parse_list("USR1, USR2,,USR3 "), vec!["USR1", "USR2", "USR3"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn amounts_reject_garbage_and_infinity() {
        assert_eq!(parse_amounts("50,30.5", "share").unwrap(), vec![50.0, 30.5]);
        assert!(parse_amount("abc", "amount").is_err());
        assert!(parse_amount("inf", "amount").is_err());
    }

    #[test]
    fn registry_keeps_declaration_order() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"user"));
        assert_eq!(names.last(), Some(&"exit"));
        assert!(registry.get("settle").is_some());
        assert_eq!(registry.iter().count(), names.len());
    }
}
