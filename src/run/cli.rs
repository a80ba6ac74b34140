use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::db::{Cell, Database, SheetName};
use crate::ledger::{Ledger, NewEntry, NewTemplate, NewTransfer, WindowEdit};
use crate::models::{IntField, Period};

pub(crate) fn as_cli(args: &[String]) -> ExitCode {
    let Some(command) = args.get(1) else {
        print_usage();
        return ExitCode::SUCCESS;
    };
    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-V" | "version" => {
            println!("sharedledger {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let outcome = open_ledger().and_then(|mut ledger| dispatch(command, &args[2..], &mut ledger));
    super::respond(outcome)
}

fn open_ledger() -> Result<Ledger> {
    let config = Config::load()?;
    let db_path = config.resolve_db_path()?;
    tracing::debug!(path = %db_path.display(), "opening store");
    let db = Database::open(&db_path)?;
    Ledger::from_config(db, &config)
}

fn dispatch(command: &str, args: &[String], ledger: &mut Ledger) -> Result<Value> {
    match command {
        "month" => cli_month(args, ledger),
        "overview" => cli_overview(args, ledger),
        "transfers" => {
            let [period] = positional::<1>(args, "transfers <YYYY-MM>")?;
            json(ledger.transfers_for_month(period.parse()?)?)
        }
        "balance-history" => json(ledger.balance_history()?),
        "add" => cli_add(args, ledger),
        "delete" => {
            let [id] = positional::<1>(args, "delete <id>")?;
            json(ledger.delete_entry(id)?)
        }
        "recurrent" => cli_recurrent(args, ledger),
        "transfer" => cli_transfer(args, ledger),
        "spending" => cli_spending(args, ledger),
        "settings" => cli_settings(args, ledger),
        "import" => cli_import(args, ledger),
        "export" => cli_export(args, ledger),
        other => {
            print_usage_to_stderr();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

const USAGE: &[(&str, &str)] = &[
    ("month <member> <YYYY-MM>", "Month entries and summary"),
    ("overview <member> <YYYY-MM>", "Summary plus transfers and shared balance"),
    ("transfers <YYYY-MM>", "Transfer totals for a month"),
    ("balance-history", "Shared account balance per month"),
    ("add <member> <YYYY-MM> <type> <amount>", "Add an entry"),
    ("    --date <date> --note <text>", ""),
    ("delete <id>", "Delete an entry"),
    ("recurrent list <member>", "List recurring templates"),
    ("recurrent add <member> <type> <amount> <start> [end]", "Add a template"),
    ("    --note <text>", ""),
    ("recurrent update <id> [--start YYYY-MM] [--end YYYY-MM]", "Change a template's window"),
    ("recurrent delete <id>", "Delete a template"),
    ("transfer list <member> <YYYY-MM>", "List a member's transfers"),
    ("transfer add <member> <YYYY-MM> <amount>", "Record a transfer (replaces)"),
    ("    --note <text>", ""),
    ("transfer delete <id>", "Delete a transfer"),
    ("spending get <YYYY-MM>", "Shared spending for a month"),
    ("spending set <YYYY-MM> <amount> [--note <text>]", "Record shared spending"),
    ("spending history", "All shared spending"),
    ("settings [get]", "Member display names"),
    ("settings set <first> <second>", "Change member display names"),
    ("import <sheet> <file.csv>", "Import a sheet export"),
    ("export <member> <YYYY-MM> [path]", "Export a month to CSV"),
];

fn usage_text() -> String {
    let mut out = String::from("sharedledger - shared household ledger\n\n");
    out.push_str("Usage: sharedledger <command>\n\nCommands:\n");
    for (cmd, what) in USAGE {
        out.push_str(&format!("  {cmd:<56} {what}\n"));
    }
    out.push_str(&format!("  {:<56} Show this help\n", "--help, -h"));
    out.push_str(&format!("  {:<56} Show version\n", "--version, -V"));
    out.push_str("\nTypes: ");
    let types: Vec<&str> = crate::models::Category::all()
        .iter()
        .map(|c| c.as_str())
        .collect();
    out.push_str(&types.join(", "));
    out
}

fn print_usage() {
    println!("{}", usage_text());
}

fn print_usage_to_stderr() {
    eprintln!("{}", usage_text());
}

fn json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

// ── Argument helpers ─────────────────────────────────────────

/// Value following `name`, e.g. `--note rent`.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn plain(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

/// The first `N` plain arguments, or a usage error.
fn positional<'a, const N: usize>(args: &'a [String], usage: &str) -> Result<[&'a str; N]> {
    let plain = plain(args);
    plain
        .get(..N)
        .and_then(|head| <[&str; N]>::try_from(head).ok())
        .ok_or_else(|| anyhow::anyhow!("Usage: sharedledger {usage}"))
}

fn amount_arg(s: &str) -> IntField {
    Cell::from(s).int()
}

/// `YYYY-MM` split into year and month fields; anything unparsable is invalid.
fn period_fields(s: &str) -> (IntField, IntField) {
    match s.trim().split_once(['-', '/']) {
        Some((y, m)) => (Cell::from(y).int(), Cell::from(m).int()),
        None => (Cell::from(s).int(), IntField::Missing),
    }
}

fn note_arg(args: &[String]) -> String {
    flag(args, "--note").unwrap_or_default().to_string()
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

// ── Commands ─────────────────────────────────────────────────

fn cli_month(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let [member, period] = positional::<2>(args, "month <member> <YYYY-MM>")?;
    json(ledger.ensure_and_summarize(member, period.parse()?)?)
}

fn cli_overview(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let [member, period] = positional::<2>(args, "overview <member> <YYYY-MM>")?;
    json(ledger.overview(member, period.parse()?)?)
}

fn cli_add(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let [member, period, category, amount] =
        positional::<4>(args, "add <member> <YYYY-MM> <type> <amount>")?;
    let entry = NewEntry {
        member_id: member.to_string(),
        period: period.parse()?,
        date: flag(args, "--date").unwrap_or_default().to_string(),
        category: category.to_string(),
        amount: amount_arg(amount),
        note: note_arg(args),
    };
    json(ledger.add_entry(entry)?)
}

fn cli_recurrent(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let action = args.first().map(String::as_str).unwrap_or("list");
    let rest = args.get(1..).unwrap_or_default();
    match action {
        "list" => {
            let [member] = positional::<1>(rest, "recurrent list <member>")?;
            json(ledger.list_templates(member)?)
        }
        "add" => {
            let [member, category, amount, start] =
                positional::<4>(rest, "recurrent add <member> <type> <amount> <start> [end]")?;
            let (start_year, start_month) = period_fields(start);
            let (end_year, end_month) = plain(rest)
                .get(4)
                .map_or((IntField::Missing, IntField::Missing), |end| period_fields(end));
            let template = NewTemplate {
                member_id: member.to_string(),
                category: category.to_string(),
                amount: amount_arg(amount),
                note: note_arg(rest),
                start_year,
                start_month,
                end_year,
                end_month,
            };
            json(ledger.add_template(template)?)
        }
        "update" => {
            let [id] = positional::<1>(rest, "recurrent update <id> [--start ..] [--end ..]")?;
            let start = flag(rest, "--start").map(period_fields);
            let (end_year, end_month) = flag(rest, "--end")
                .map_or((IntField::Missing, IntField::Missing), period_fields);
            let edit = WindowEdit {
                start_year: start.map(|(y, _)| y),
                start_month: start.map(|(_, m)| m),
                end_year,
                end_month,
            };
            json(ledger.update_template_window(id, edit)?)
        }
        "delete" => {
            let [id] = positional::<1>(rest, "recurrent delete <id>")?;
            json(ledger.delete_template(id)?)
        }
        other => anyhow::bail!("Unknown recurrent action: {other}"),
    }
}

fn cli_transfer(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let action = args.first().map(String::as_str).unwrap_or("list");
    let rest = args.get(1..).unwrap_or_default();
    match action {
        "list" => {
            let [member, period] = positional::<2>(rest, "transfer list <member> <YYYY-MM>")?;
            json(ledger.list_transfers(member, period.parse()?)?)
        }
        "add" => {
            let [member, period, amount] =
                positional::<3>(rest, "transfer add <member> <YYYY-MM> <amount>")?;
            let transfer = NewTransfer {
                member_id: member.to_string(),
                period: period.parse()?,
                amount: amount_arg(amount),
                note: note_arg(rest),
            };
            json(ledger.add_transfer(transfer)?)
        }
        "delete" => {
            let [id] = positional::<1>(rest, "transfer delete <id>")?;
            json(ledger.delete_transfer(id)?)
        }
        other => anyhow::bail!("Unknown transfer action: {other}"),
    }
}

fn cli_spending(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let action = args.first().map(String::as_str).unwrap_or("history");
    let rest = args.get(1..).unwrap_or_default();
    match action {
        "get" => {
            let [period] = positional::<1>(rest, "spending get <YYYY-MM>")?;
            json(ledger.shared_spending(period.parse()?)?)
        }
        "set" => {
            let [period, amount] = positional::<2>(rest, "spending set <YYYY-MM> <amount>")?;
            let period: Period = period.parse()?;
            json(ledger.set_shared_spending(period, amount_arg(amount), &note_arg(rest))?)
        }
        "history" => json(ledger.spending_history()?),
        other => anyhow::bail!("Unknown spending action: {other}"),
    }
}

fn cli_settings(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    match args.first().map(String::as_str).unwrap_or("get") {
        "get" => json(ledger.settings()?),
        "set" => {
            let rest = args.get(1..).unwrap_or_default();
            let [first, second] = positional::<2>(rest, "settings set <first> <second>")?;
            json(ledger.set_settings(first, second)?)
        }
        other => anyhow::bail!("Unknown settings action: {other}"),
    }
}

fn cli_import(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let [sheet, file] = positional::<2>(args, "import <sheet> <file.csv>")?;
    let sheet: SheetName = sheet.parse().map_err(anyhow::Error::msg)?;
    let path = shellexpand(file);
    if !Path::new(&path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    json(ledger.import_sheet(sheet, Path::new(&path))?)
}

fn cli_export(args: &[String], ledger: &mut Ledger) -> Result<Value> {
    let [member, period] = positional::<2>(args, "export <member> <YYYY-MM> [path]")?;
    let period: Period = period.parse()?;
    let output_path = plain(args)
        .get(2)
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/sharedledger-{member}-{period}.csv")
        });

    let written = ledger.export_month(member, period, Path::new(&output_path))?;
    json(serde_json::json!({ "path": output_path, "written": written }))
}
