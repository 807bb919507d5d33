use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::{io, output};
use crate::ledger::{SplitInput, SplitStrategy};

use super::{parse_amount, parse_amounts, parse_list, usage_error, CommandDefinition};

const USAGE: &str = "expense add <group-id> <description> <payer-id> <amount> <strategy> \
<participants> [shares] | expense list";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "expense",
        "Record or list expenses",
        USAGE,
        cmd_expense,
    )]
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        ["add", group_id, description, payer_id, amount, strategy, participants, rest @ ..]
            if rest.len() <= 1 =>
        {
            let strategy = SplitStrategy::create(strategy)?;
            let amount = parse_amount(amount, "amount")?;
            let mut input = SplitInput::new(*payer_id, amount, parse_list(participants));
            match (strategy, rest.first()) {
                (SplitStrategy::Exact, Some(shares)) => {
                    input = input.with_exact_shares(parse_amounts(shares, "share")?);
                }
                (SplitStrategy::Percent, Some(shares)) => {
                    input = input.with_percent_shares(parse_amounts(shares, "percentage")?);
                }
                (SplitStrategy::Equal, Some(_)) => {
                    io::print_warning("Shares are ignored for equal splits.");
                }
                _ => {}
            }

            let id = context
                .ledger
                .record_expense(group_id, description, input, strategy)?;
            io::print_success(format!(
                "Expense {id} recorded: {} paid {} ({strategy}).",
                context.user_label(payer_id),
                output::format_amount(amount, context.currency()),
            ));
            Ok(())
        }
        ["list", ..] => {
            let expenses = context.ledger.expenses();
            if expenses.is_empty() {
                io::print_info("No expenses recorded.");
            }
            for expense in expenses {
                io::print_info(format!(
                    "  {:<6} {:<6} {:<20} {:>14}  {:<8} paid by {} for {}",
                    expense.id,
                    expense.group_id,
                    expense.description,
                    output::format_amount(expense.amount(), context.currency()),
                    expense.strategy,
                    expense.input.payer_id,
                    expense.input.participant_ids.join(",")
                ));
            }
            Ok(())
        }
        _ => Err(usage_error(USAGE)),
    }
}
