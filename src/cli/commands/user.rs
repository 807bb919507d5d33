use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;

use super::{usage_error, CommandDefinition};

const USAGE: &str = "user add <name> | user list";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "user",
        "Add or list users",
        USAGE,
        cmd_user,
    )]
}

fn cmd_user(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.split_first() {
        Some((&"add", name)) if !name.is_empty() => {
            let name = name.join(" ");
            let id = context.ledger.add_user(&name)?;
            io::print_success(format!("User `{name}` added as {id}."));
            Ok(())
        }
        Some((&"list", _)) => {
            let users = context.ledger.users();
            if users.is_empty() {
                io::print_info("No users yet.");
            }
            for user in users {
                io::print_info(format!("  {:<8} {}", user.id, user.name));
            }
            Ok(())
        }
        _ => Err(usage_error(USAGE)),
    }
}
