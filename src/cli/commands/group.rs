use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;

use super::{parse_list, usage_error, CommandDefinition};

const USAGE: &str = "group add <name> <member-id>... | group list";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "group",
        "Add or list groups",
        USAGE,
        cmd_group,
    )]
}

fn cmd_group(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        ["add", name, members @ ..] => {
            let member_ids: Vec<String> = members.iter().flat_map(|raw| parse_list(raw)).collect();
            let id = context.ledger.add_group(name, &member_ids)?;
            io::print_success(format!(
                "Group `{name}` added as {id} with {} member(s).",
                member_ids.len()
            ));
            Ok(())
        }
        ["list", ..] => {
            let groups = context.ledger.groups();
            if groups.is_empty() {
                io::print_info("No groups yet.");
            }
            for group in groups {
                io::print_info(format!(
                    "  {:<8} {:<16} {}",
                    group.id,
                    group.name,
                    group.member_ids.join(", ")
                ));
            }
            Ok(())
        }
        _ => Err(usage_error(USAGE)),
    }
}
