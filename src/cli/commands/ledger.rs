use std::path::{Path, PathBuf};

use crate::cli::core::{looks_like_path, CommandResult, ShellContext};
use crate::cli::{io, output};
use crate::storage::StorageBackend;

use super::{parse_amount, usage_error, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("balances", "Show net balances", "balances", cmd_balances),
        CommandDefinition::new(
            "settle",
            "Suggest payments that clear all balances",
            "settle",
            cmd_settle,
        ),
        CommandDefinition::new(
            "save",
            "Save the ledger by name or to a file path",
            "save [name|path]",
            cmd_save,
        ),
        CommandDefinition::new(
            "load",
            "Load a ledger by name or from a file path",
            "load [name|path]",
            cmd_load,
        ),
        CommandDefinition::new(
            "backup",
            "Snapshot the ledger into its backup folder",
            "backup [note]",
            cmd_backup,
        ),
        CommandDefinition::new("backups", "List ledger backups", "backups", cmd_backups),
        CommandDefinition::new(
            "restore",
            "Restore the ledger from a backup",
            "restore <backup-name>",
            cmd_restore,
        ),
        CommandDefinition::new(
            "threshold",
            "Show or set the large-expense alert threshold",
            "threshold [value|off]",
            cmd_threshold,
        ),
    ]
}

fn cmd_balances(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let balances = context.ledger.balances();
    output::section("Balances");
    if balances.is_empty() {
        io::print_info("No balances yet.");
        return Ok(());
    }
    for (user_id, amount) in &balances {
        io::print_info(format!(
            "  {:<24} {:>14}",
            context.user_label(user_id),
            output::format_signed(*amount, context.currency())
        ));
    }
    Ok(())
}

fn cmd_settle(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let transfers = context.ledger.settle_up();
    output::section("Settlement");
    if transfers.is_empty() {
        io::print_info("All balances are settled.");
        return Ok(());
    }
    for transfer in &transfers {
        io::print_info(format!(
            "  {} pays {} {}",
            context.user_label(&transfer.from_user_id),
            context.user_label(&transfer.to_user_id),
            output::format_amount(transfer.amount, context.currency())
        ));
    }
    Ok(())
}

fn cmd_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let snapshot = context.ledger.snapshot();
    let target = args.first().copied();
    let explicit_path = match target {
        Some(raw) if looks_like_path(raw) => Some(PathBuf::from(raw)),
        Some(_) => None,
        None => context.ledger_path.clone(),
    };

    if let Some(path) = explicit_path {
        context.storage.save_to_path(&snapshot, &path)?;
        context.ledger.mark_saved();
        io::print_success(format!("Ledger saved to {}.", path.display()));
        context.ledger_path = Some(path);
        return Ok(());
    }

    let name = target
        .map(str::to_string)
        .unwrap_or_else(|| context.active_ledger_name());
    let path = context.storage.save(&snapshot, &name)?;
    context.ledger.mark_saved();
    context.ledger_name = Some(name.clone());
    context.ledger_path = None;
    context.update_last_opened(&name)?;
    io::print_success(format!("Ledger `{name}` saved to {}.", path.display()));
    Ok(())
}

fn cmd_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !context.confirm_discard("Discard unsaved changes and load?")? {
        io::print_info("Load cancelled.");
        return Ok(());
    }
    let report = match args.first().copied() {
        Some(raw) if looks_like_path(raw) => context.storage.load_from_path(Path::new(raw))?,
        Some(name) => context.storage.load(name)?,
        None => match context.ledger_path.clone() {
            Some(path) => context.storage.load_from_path(&path)?,
            None => context.storage.load(&context.active_ledger_name())?,
        },
    };
    let source = report.path.display().to_string();
    let name = report.name.clone();
    context.install(report)?;
    if let Some(name) = name {
        context.update_last_opened(&name)?;
    }
    io::print_success(format!(
        "Loaded {source}: {} user(s), {} group(s), {} expense(s).",
        context.ledger.users().len(),
        context.ledger.groups().len(),
        context.ledger.expenses().len()
    ));
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let name = context.active_ledger_name();
    let path = context
        .storage
        .backup(&context.ledger.snapshot(), &name, note.as_deref())?;
    io::print_success(format!("Backup written to {}.", path.display()));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let name = context.active_ledger_name();
    let backups = context.storage.list_backups(&name)?;
    output::section(format!("Backups of `{name}`"));
    if backups.is_empty() {
        io::print_info("No backups found.");
    }
    for backup in backups {
        io::print_info(format!("  {backup}"));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [backup_name] = args else {
        return Err(usage_error("restore <backup-name>"));
    };
    if !context.confirm_discard("Discard unsaved changes and restore?")? {
        io::print_info("Restore cancelled.");
        return Ok(());
    }
    let name = context.active_ledger_name();
    let report = context.storage.restore(&name, backup_name)?;
    context.install(report)?;
    io::print_success(format!("Ledger `{name}` restored from {backup_name}."));
    Ok(())
}

fn cmd_threshold(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let threshold = match args {
        [] => {
            match context.ledger.notification_threshold() {
                Some(value) => io::print_info(format!(
                    "Alerts fire above {}.",
                    output::format_amount(value, context.currency())
                )),
                None => io::print_info("Large-expense alerts are off."),
            }
            return Ok(());
        }
        [value] if value.eq_ignore_ascii_case("off") => None,
        [value] => Some(parse_amount(value, "threshold")?),
        _ => return Err(usage_error("threshold [value|off]")),
    };

    context.ledger.set_notification_threshold(threshold)?;
    context.config.notification_threshold = threshold;
    context.persist_config()?;
    match threshold {
        Some(value) => io::print_success(format!(
            "Alert threshold set to {}.",
            output::format_amount(value, context.currency())
        )),
        None => io::print_success("Large-expense alerts disabled."),
    }
    Ok(())
}

