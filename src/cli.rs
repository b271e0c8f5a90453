//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_store::CsvStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::mirrored_store::MirroredStore;
use crate::adapters::typst_report::chart_svg::fmt_money;
use crate::adapters::typst_report::tables::{fmt_pct, fmt_ratio};
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::account::Account;
use crate::domain::achievement::newly_unlocked;
use crate::domain::config_validation::validate_journal_config;
use crate::domain::dashboard::Dashboard;
use crate::domain::error::JournalError;
use crate::domain::merge::{merge, MergePolicy};
use crate::domain::risk::RiskPlan;
use crate::domain::settings::JournalSettings;
use crate::domain::trade::{parse_flags, Direction, NewTrade};
use crate::ports::journal_store::JournalStore;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "tradejournal",
    version,
    about = "Trading journal with dashboards, streaks and a milestone risk plan"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true, default_value = "journal.ini")]
    pub config: PathBuf,

    /// Increase diagnostic logging (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a trading account
    InitAccount {
        name: String,
        #[arg(long)]
        capital: f64,
        /// Opening date (defaults to today)
        #[arg(long)]
        created: Option<NaiveDate>,
    },
    /// List accounts with their current capital
    Accounts,
    /// Log a closed trade
    Log {
        #[arg(short, long)]
        account: Option<String>,
        /// Trade date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        instrument: String,
        #[arg(short, long, default_value = "long")]
        direction: Direction,
        #[arg(long, allow_negative_numbers = true)]
        pnl: f64,
        /// Amount put at risk
        #[arg(long, default_value_t = 0.0)]
        risk: f64,
        /// Broken risk rules, e.g. "moved-stop;oversized"
        #[arg(long)]
        flags: Option<String>,
        /// What happened and why; required when flags are set
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Show logged trades, newest first
    Trades {
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Delete a trade by id
    Delete {
        #[arg(short, long)]
        account: Option<String>,
        id: u64,
    },
    /// Print the account dashboard
    Dashboard {
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Write a Typst dashboard report
    Report {
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Reconcile the spreadsheets with the mirror database
    Sync {
        #[arg(short, long)]
        account: Option<String>,
        /// Overrides [mirror] merge_policy
        #[arg(long)]
        policy: Option<MergePolicy>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the configuration file
    Validate,
    /// Start the web dashboard
    Serve {
        /// Overrides [web] listen
        #[arg(long)]
        listen: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let config = cli.config.as_path();
    match cli.command {
        Command::InitAccount {
            name,
            capital,
            created,
        } => finish(run_init_account(config, &name, capital, created)),
        Command::Accounts => finish(run_accounts(config)),
        Command::Log {
            account,
            date,
            instrument,
            direction,
            pnl,
            risk,
            flags,
            feedback,
        } => {
            let result = build_new_trade(
                date.unwrap_or_else(today),
                &instrument,
                direction,
                pnl,
                risk,
                flags.as_deref(),
                feedback.as_deref(),
            )
            .and_then(|trade| run_log(config, account.as_deref(), trade, today()));
            finish(result)
        }
        Command::Trades { account, limit } => finish(run_trades(config, account.as_deref(), limit)),
        Command::Delete { account, id } => finish(run_delete(config, account.as_deref(), id)),
        Command::Dashboard { account } => {
            finish(run_dashboard(config, account.as_deref(), today()))
        }
        Command::Report { account, output } => finish(run_report(
            config,
            account.as_deref(),
            output.as_deref(),
            today(),
        )),
        Command::Sync {
            account,
            policy,
            dry_run,
        } => finish(run_sync(config, account.as_deref(), policy, dry_run)),
        Command::Validate => finish(run_validate(config)),
        Command::Serve { listen } => run_serve(config, listen.as_deref()),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Prints the error and converts it to the process exit code.
fn finish(result: Result<(), JournalError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, JournalError> {
    info!(path = %path.display(), "loading config");
    let config = FileConfigAdapter::from_file(path)?;
    validate_journal_config(&config)?;
    Ok(config)
}

/// The CSV spreadsheets, wrapped with the SQLite mirror when one is enabled.
///
/// A mirror that cannot be opened is reported and skipped; the spreadsheets
/// alone are a complete journal.
pub fn build_store(settings: &JournalSettings) -> Result<Box<dyn JournalStore>, JournalError> {
    let csv = CsvStore::open(settings.data_dir.clone())?;
    if settings.mirror.is_none() {
        return Ok(Box::new(csv));
    }
    match open_mirror(settings) {
        Ok(mirror) => Ok(Box::new(MirroredStore::new(Box::new(csv), mirror))),
        Err(e) => {
            warn!(error = %e, "mirror unavailable, continuing with spreadsheets only");
            Ok(Box::new(csv))
        }
    }
}

pub fn open_mirror(settings: &JournalSettings) -> Result<Box<dyn JournalStore>, JournalError> {
    let mirror = settings
        .mirror
        .as_ref()
        .ok_or_else(|| JournalError::ConfigInvalid {
            section: "mirror".into(),
            key: "enabled".into(),
            reason: "the mirror is not enabled".into(),
        })?;

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_store::SqliteStore;
        let store = SqliteStore::from_settings(mirror).map_err(|e| JournalError::Mirror {
            reason: format!("cannot open {}: {}", mirror.path.display(), e),
        })?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        Err(JournalError::Mirror {
            reason: format!(
                "cannot open {}: built without the sqlite feature",
                mirror.path.display()
            ),
        })
    }
}

/// Config, settings and store for one command invocation.
pub struct Journal {
    pub config: FileConfigAdapter,
    pub settings: JournalSettings,
    pub store: Box<dyn JournalStore>,
}

impl Journal {
    pub fn open(config_path: &Path) -> Result<Self, JournalError> {
        let config = load_config(config_path)?;
        let settings = JournalSettings::from_config(&config);
        let store = build_store(&settings)?;
        Ok(Self {
            config,
            settings,
            store,
        })
    }

    pub fn risk_plan(&self, account: &Account) -> Result<RiskPlan, JournalError> {
        let plan = RiskPlan::from_config(&self.config, account.initial_capital);
        plan.validate()?;
        Ok(plan)
    }

    pub fn dashboard(&self, account: &str, today: NaiveDate) -> Result<Dashboard, JournalError> {
        let account = self.store.require_account(account)?;
        let trades = self.store.load_trades(&account.name)?;
        let plan = self.risk_plan(&account)?;
        Ok(Dashboard::build(account, trades, &plan, today)
            .with_recent_count(self.settings.recent_trades))
    }

    fn account_name(&self, explicit: Option<&str>) -> String {
        self.settings.resolve_account(explicit)
    }

    fn report_mirror_failures(&self) {
        if let Some(message) = mirror_warning(self.store.as_ref()) {
            eprintln!("warning: {message}");
        }
    }
}

/// Hint shown after a command whose writes did not all reach the mirror.
pub fn mirror_warning(store: &dyn JournalStore) -> Option<String> {
    match store.mirror_failures() {
        0 => None,
        n => Some(format!(
            "{n} mirror write(s) failed; the spreadsheets are up to date, run `tradejournal sync` to reconcile"
        )),
    }
}

pub fn build_new_trade(
    date: NaiveDate,
    instrument: &str,
    direction: Direction,
    pnl: f64,
    risk: f64,
    flags: Option<&str>,
    feedback: Option<&str>,
) -> Result<NewTrade, JournalError> {
    let trade = NewTrade {
        date,
        instrument: instrument.to_string(),
        direction,
        pnl,
        risk,
        flags: parse_flags(flags.unwrap_or_default())?,
        feedback: feedback.unwrap_or_default().to_string(),
    };
    trade.validate()?;
    Ok(trade)
}

pub fn run_init_account(
    config_path: &Path,
    name: &str,
    capital: f64,
    created: Option<NaiveDate>,
) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let account = Account::new(name, capital, created.unwrap_or_else(today))?;
    if journal.store.load_account(&account.name)?.is_some() {
        return Err(JournalError::DuplicateAccount {
            name: account.name,
        });
    }
    journal.store.save_account(&account)?;
    eprintln!(
        "Created account {} with {} starting capital",
        account.name,
        fmt_money(account.initial_capital)
    );
    journal.report_mirror_failures();
    Ok(())
}

pub fn run_accounts(config_path: &Path) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let accounts = journal.store.list_accounts()?;
    if accounts.is_empty() {
        eprintln!("No accounts yet. Create one with `tradejournal init-account <name> --capital <amount>`.");
        return Ok(());
    }
    println!(
        "{:<20} {:>14} {:>14} {:>8}",
        "ACCOUNT", "INITIAL", "CURRENT", "TRADES"
    );
    for account in accounts {
        let trades = journal.store.load_trades(&account.name)?;
        let net: f64 = trades.iter().map(|t| t.pnl).sum();
        let marker = if account.name == journal.settings.default_account {
            "*"
        } else {
            " "
        };
        println!(
            "{}{:<19} {:>14} {:>14} {:>8}",
            marker,
            account.name,
            fmt_money(account.initial_capital),
            fmt_money(account.initial_capital + net),
            trades.len()
        );
    }
    Ok(())
}

pub fn run_log(
    config_path: &Path,
    account: Option<&str>,
    trade: NewTrade,
    today: NaiveDate,
) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let name = journal.account_name(account);
    let before = journal.dashboard(&name, today)?;

    let entry = journal.store.append_trade(&name, trade)?;
    eprintln!(
        "Logged trade #{} in {}: {} {} {}",
        entry.id,
        name,
        entry.direction,
        entry.instrument,
        fmt_money(entry.pnl)
    );
    journal.report_mirror_failures();

    let after = journal.dashboard(&name, today)?;
    for achievement in newly_unlocked(&before.achievements, &after.achievements) {
        println!(
            "Achievement unlocked: {} ({})",
            achievement.title(),
            achievement.description()
        );
    }
    if after.risk.milestone > before.risk.milestone {
        println!(
            "Milestone {} reached at {}",
            after.risk.milestone,
            fmt_money(after.risk.milestone_capital)
        );
    }
    println!(
        "Streak: {}   Capital: {}   Next trade risk: {}",
        after.streaks.current,
        fmt_money(after.ledger.current_capital()),
        fmt_money(after.risk.risk_per_trade)
    );
    if !after.risk.risk_unlocked {
        println!(
            "Log {} more trades to unlock milestone {} risk",
            after.risk.trades_for_next_level,
            after.risk.milestone
        );
    }
    Ok(())
}

pub fn run_trades(
    config_path: &Path,
    account: Option<&str>,
    limit: Option<usize>,
) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let name = journal.account_name(account);
    journal.store.require_account(&name)?;
    let trades = journal.store.load_trades(&name)?;
    if trades.is_empty() {
        eprintln!("No trades logged in {name}.");
        return Ok(());
    }

    println!(
        "{:>5} {:<10} {:<10} {:<5} {:>12} {:>10}  FLAGS / FEEDBACK",
        "ID", "DATE", "INSTRUMENT", "SIDE", "P/L", "RISK"
    );
    for trade in trades.iter().rev().take(limit.unwrap_or(usize::MAX)) {
        let flags = trade
            .flags
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let notes = match (flags.is_empty(), trade.feedback.is_empty()) {
            (true, true) => String::new(),
            (true, false) => trade.feedback.clone(),
            (false, true) => format!("[{flags}]"),
            (false, false) => format!("[{flags}] {}", trade.feedback),
        };
        println!(
            "{:>5} {:<10} {:<10} {:<5} {:>12} {:>10}  {}",
            trade.id,
            trade.date,
            trade.instrument,
            trade.direction,
            fmt_money(trade.pnl),
            if trade.risk > 0.0 {
                fmt_money(trade.risk)
            } else {
                "-".to_string()
            },
            notes.replace('\n', " ")
        );
    }
    Ok(())
}

pub fn run_delete(config_path: &Path, account: Option<&str>, id: u64) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let name = journal.account_name(account);
    journal.store.require_account(&name)?;
    let removed = journal.store.delete_trade(&name, id)?;
    eprintln!(
        "Deleted trade #{} ({} {} on {})",
        removed.id,
        removed.instrument,
        fmt_money(removed.pnl),
        removed.date
    );
    journal.report_mirror_failures();
    Ok(())
}

pub fn print_dashboard(dashboard: &Dashboard) {
    let ledger = &dashboard.ledger;
    let stats = &dashboard.stats;
    let risk = &dashboard.risk;
    let streaks = &dashboard.streaks;

    println!("=== {} (as of {}) ===", ledger.account.name, dashboard.as_of);
    println!("Initial Capital:  {}", fmt_money(ledger.initial_capital()));
    println!("Current Capital:  {}", fmt_money(ledger.current_capital()));
    println!(
        "Net P/L:          {} ({})",
        fmt_money(ledger.net_pnl()),
        fmt_pct(stats.total_return)
    );

    println!("\n=== Performance ===");
    println!("Trades:           {}", stats.total_trades);
    println!("Win Rate:         {}", fmt_pct(stats.win_rate));
    println!("Profit Factor:    {}", fmt_ratio(stats.profit_factor));
    println!("Expectancy:       {}", fmt_money(stats.expectancy));
    println!("Avg Risk/Trade:   {}", fmt_money(stats.avg_risk_per_trade));
    println!("Avg R Multiple:   {:.2}R", stats.avg_r_multiple);
    println!("Max Drawdown:     -{}", fmt_pct(stats.max_drawdown));
    println!(
        "Discipline:       {} ({} flagged)",
        fmt_pct(stats.discipline_rate),
        stats.flagged_trades
    );

    println!("\n=== Risk Plan ===");
    println!(
        "Milestone:        {} (next at {}, {} to go)",
        risk.milestone,
        fmt_money(risk.next_milestone_capital),
        fmt_money(risk.capital_to_next)
    );
    println!("Risk Base:        {}", fmt_money(risk.risk_base));
    println!("Risk per Trade:   {}", fmt_money(risk.risk_per_trade));
    if risk.risk_unlocked {
        println!("Trade count:      on track ({} logged)", risk.trades_logged);
    } else {
        println!(
            "Trade count:      {} more trades before milestone risk applies",
            risk.trades_for_next_level
        );
    }

    println!("\n=== Streaks ===");
    println!("Current:          {}", streaks.current);
    println!(
        "Longest:          {} wins / {} losses",
        streaks.longest_win, streaks.longest_loss
    );
    println!(
        "Disciplined Run:  {} (best {})",
        streaks.discipline_current, streaks.discipline_longest
    );
    println!(
        "Journaling Days:  {} (best {})",
        streaks.journal_days_current, streaks.journal_days_longest
    );

    let unlocked: Vec<_> = dashboard.unlocked_achievements().collect();
    println!(
        "\n=== Achievements ({}/{}) ===",
        unlocked.len(),
        dashboard.achievements.len()
    );
    for status in unlocked {
        println!("  {}: {}", status.achievement.title(), status.achievement.description());
    }

    if !dashboard.flags.is_empty() {
        println!("\n=== Risk Rule Breaches ===");
        for flag in &dashboard.flags {
            println!(
                "  {:<20} {:>3}x  {}",
                flag.flag.label(),
                flag.occurrences,
                fmt_money(flag.net_pnl)
            );
        }
    }

    if !dashboard.instruments.is_empty() {
        println!("\n=== Instruments ===");
        for result in &dashboard.instruments {
            println!(
                "  {:<10} {:>4} trades, {} win rate, {}",
                result.instrument,
                result.total_trades,
                fmt_pct(result.win_rate),
                fmt_money(result.net_pnl)
            );
        }
    }
}

pub fn run_dashboard(
    config_path: &Path,
    account: Option<&str>,
    today: NaiveDate,
) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let name = journal.account_name(account);
    let dashboard = journal.dashboard(&name, today)?;
    print_dashboard(&dashboard);
    Ok(())
}

pub fn run_report(
    config_path: &Path,
    account: Option<&str>,
    output: Option<&Path>,
    today: NaiveDate,
) -> Result<(), JournalError> {
    let journal = Journal::open(config_path)?;
    let name = journal.account_name(account);
    let dashboard = journal.dashboard(&name, today)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{name}-report.typ")));
    let adapter = TypstReportAdapter::new(journal.settings.template_path.clone());
    adapter.write(&dashboard, &output.to_string_lossy())?;
    eprintln!("Report written to: {}", output.display());
    Ok(())
}

/// Merges the spreadsheets with the mirror, account by account.
///
/// Under `Manual` policy an account with conflicts is left untouched on both
/// sides and the command fails after reporting every conflict.
pub fn run_sync(
    config_path: &Path,
    account: Option<&str>,
    policy: Option<MergePolicy>,
    dry_run: bool,
) -> Result<(), JournalError> {
    let config = load_config(config_path)?;
    let settings = JournalSettings::from_config(&config);
    let local = CsvStore::open(settings.data_dir.clone())?;
    let remote = open_mirror(&settings)?;
    let policy = policy
        .or_else(|| settings.mirror.as_ref().map(|m| m.merge_policy))
        .unwrap_or_default();

    let names: Vec<String> = match account {
        Some(name) => vec![name.to_string()],
        None => {
            let mut names: Vec<String> = local
                .list_accounts()?
                .into_iter()
                .chain(remote.list_accounts()?)
                .map(|a| a.name)
                .collect();
            names.sort();
            names.dedup();
            names
        }
    };

    let mut unresolved = 0usize;
    for name in &names {
        let local_account = local.load_account(name)?;
        let remote_account = remote.load_account(name)?;
        match (&local_account, &remote_account) {
            (None, None) => {
                return Err(JournalError::UnknownAccount { name: name.clone() });
            }
            (Some(a), None) if !dry_run => remote.save_account(a)?,
            (None, Some(a)) if !dry_run => local.save_account(a)?,
            _ => {}
        }

        let local_trades = local.load_trades(name)?;
        let remote_trades = remote.load_trades(name)?;
        let outcome = merge(&local_trades, &remote_trades, policy);

        println!(
            "{}: {} identical, {} local only, {} remote only, {} conflicts",
            name,
            outcome.identical,
            outcome.local_only.len(),
            outcome.remote_only.len(),
            outcome.conflicts.len()
        );
        for conflict in &outcome.conflicts {
            println!(
                "  trade #{} differs in {}",
                conflict.id(),
                conflict.differing_fields().join(", ")
            );
        }

        if policy == MergePolicy::Manual && !outcome.is_clean() {
            unresolved += outcome.conflicts.len();
            continue;
        }
        if dry_run {
            continue;
        }
        if outcome.local_changed(policy) {
            local.replace_trades(name, &outcome.merged)?;
            info!(account = %name, trades = outcome.merged.len(), "updated spreadsheet");
        }
        if outcome.remote_changed(policy) {
            remote.replace_trades(name, &outcome.merged)?;
            info!(account = %name, trades = outcome.merged.len(), "updated mirror");
        }
    }

    if unresolved > 0 {
        return Err(JournalError::Mirror {
            reason: format!(
                "{unresolved} conflicting trades left untouched; rerun with --policy prefer-local or --policy prefer-remote"
            ),
        });
    }
    if dry_run {
        eprintln!("Dry run: nothing written");
    } else {
        eprintln!("Sync complete ({policy})");
    }
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), JournalError> {
    let config = load_config(config_path)?;
    let settings = JournalSettings::from_config(&config);
    let plan = RiskPlan::from_config(&config, 1.0);
    plan.validate()?;

    eprintln!("Config validated successfully");
    println!("data_dir:        {}", settings.data_dir.display());
    println!("default_account: {}", settings.default_account);
    println!(
        "risk:            {} per trade, milestone every {}, {} trades then +{} per level",
        fmt_pct(plan.risk_pct),
        fmt_pct(plan.milestone_step),
        plan.base_trades,
        plan.trades_step
    );
    match &settings.mirror {
        Some(mirror) => println!(
            "mirror:          {} (pool {}, {})",
            mirror.path.display(),
            mirror.pool_size,
            mirror.merge_policy
        ),
        None => println!("mirror:          disabled"),
    }
    if let Some(path) = &settings.template_path {
        println!("template:        {}", path.display());
    }
    Ok(())
}

fn run_serve(config_path: &Path, listen: Option<&str>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{serve, AppState};
        use std::sync::Arc;

        let journal = match Journal::open(config_path) {
            Ok(j) => j,
            Err(e) => return finish(Err(e)),
        };
        let plan = RiskPlan::from_config(&journal.config, 1.0);
        if let Err(e) = plan.validate() {
            return finish(Err(e));
        }
        let listen = listen
            .map(str::to_string)
            .unwrap_or_else(|| journal.settings.listen.clone());
        let state = AppState::new(Arc::from(journal.store), plan)
            .with_recent_trades(journal.settings.recent_trades);

        eprintln!("Starting web server on {listen}");
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return finish(Err(e.into())),
        };
        finish(runtime.block_on(serve(state, &listen)))
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config_path, listen);
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
