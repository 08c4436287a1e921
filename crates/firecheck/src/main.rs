//! `firecheck` - CLI for the fire extinguisher registry and inspections.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;
use tokio::sync::mpsc;

use firecheck::cli::{
    AddEquipment, CheckCommand, Cli, Command, ConfigCommand, ConfirmCommand, EditEquipment,
    EquipmentCommand, FilterArg, ScanCommand,
};
use firecheck::compliance::{category_breakdown, unit_status, InventoryFilter};
use firecheck::model::{Equipment, InspectionCriteria};
use firecheck::scan::{
    BothPolarities, ImageFiles, QrDecoder, ScanEvent, ScanExit, ScanHandle, ScanSettings, Scanner,
};
use firecheck::workflow::{OfficerCheck, Step, TechnicianConfirmation};
use firecheck::{
    init_logging, resolve, summarize, CodeRules, Config, EquipmentDraft, Fleet, HistoryStore,
    InspectionSession, Label, MonthPeriod, Storage,
};

/// Everything a registry or inspection command needs.
#[derive(Debug)]
struct App {
    store: Storage,
    rules: CodeRules,
    period: MonthPeriod,
    scan: ScanSettings,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    // These must work even when the configuration itself is broken.
    match &cli.command {
        Command::Config(ConfigCommand::Path) => {
            println!("{}", Config::default_config_path().display());
            return Ok(());
        }
        Command::Config(ConfigCommand::Validate { file }) => {
            validate_config(file.clone().or_else(|| cli.config.clone()));
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    if let Command::Config(ConfigCommand::Show { json }) = &cli.command {
        return show_config(&config, *json);
    }

    let database_path = config.database_path();
    let store = Storage::open(&database_path)
        .with_context(|| format!("failed to open {}", database_path.display()))?
        .with_key(config.storage.storage_key.clone());
    let app = App {
        store,
        rules: config.code_rules()?,
        period: MonthPeriod::current(),
        scan: ScanSettings::from(&config.scan),
    };

    match cli.command {
        Command::Status(cmd) => handle_status(&app, cmd.json),
        Command::Equipment(cmd) => handle_equipment(&app, cmd),
        Command::Resolve { code } => handle_resolve(&app, &code),
        Command::Scan(cmd) => handle_scan(&app, &cmd),
        Command::Check(cmd) => handle_check(&app, cmd),
        Command::Confirm(cmd) => handle_confirm(&app, cmd),
        Command::History { code, json } => handle_history(&app, &code, json),
        Command::Config(_) => Ok(()),
    }
}

fn handle_status(app: &App, json: bool) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let summary = summarize(&fleet, app.period);
    let categories = category_breakdown(&fleet);
    let stats = app.store.stats()?;

    if json {
        let status = serde_json::json!({
            "summary": summary,
            "fully_compliant": summary.is_fully_compliant(),
            "categories": categories,
            "store": stats,
            "database_path": app.store.path(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("firecheck status for {}", summary.period);
    println!("--------------------------");
    println!("Active:        {}", summary.active);
    println!("Checked:       {}", summary.checked);
    println!(
        "Pending:       {} ({} awaiting confirmation)",
        summary.pending, summary.awaiting_confirmation
    );
    println!("Retired:       {}", summary.retired);
    println!("Completion:    {}%", summary.completion_percent);
    if summary.is_fully_compliant() {
        println!("All active units are inspected and confirmed this month.");
    }
    if !categories.is_empty() {
        println!();
        println!("By category:");
        for (category, count) in &categories {
            println!("  {:<14} {count}", category.as_str());
        }
    }
    println!();
    println!("Database:      {}", app.store.path().display());
    println!("Size:          {}", stats.db_size_human());
    if let Some(updated) = stats.updated_at {
        println!("Last saved:    {}", updated.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

fn handle_equipment(app: &App, cmd: EquipmentCommand) -> anyhow::Result<()> {
    match cmd {
        EquipmentCommand::List {
            filter,
            search,
            json,
        } => list_equipment(app, filter, search.as_deref(), json),
        EquipmentCommand::Add(add) => add_equipment(app, add),
        EquipmentCommand::Edit(edit) => edit_equipment(app, edit),
        EquipmentCommand::Retire { code, date } => {
            let fleet = app.store.load()?;
            let unit = fleet.require_code(&code)?;
            let on = date.unwrap_or_else(|| Local::now().date_naive());
            let updated = fleet.retire(&unit.id, on)?;
            app.store.save(&updated)?;
            println!("Retired {} on {on}.", unit.code);
            Ok(())
        }
        EquipmentCommand::Label { code, out, size } => {
            let fleet = app.store.load()?;
            let unit = fleet.require_code(&code)?;
            let svg = Label::for_code(&unit.code)?.to_svg(size);
            match out {
                Some(path) => {
                    std::fs::write(&path, svg)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Wrote label for {} to {}.", unit.code, path.display());
                }
                None => println!("{svg}"),
            }
            Ok(())
        }
        EquipmentCommand::Delete { code, yes } => {
            let fleet = app.store.load()?;
            let unit = fleet.require_code(&code)?;
            if !yes {
                println!(
                    "This will delete {} and its {} inspection record(s).",
                    unit.code,
                    unit.inspections.len()
                );
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let updated = fleet.remove(&unit.id)?;
            app.store.save(&updated)?;
            println!("Deleted {}.", unit.code);
            Ok(())
        }
    }
}

fn list_equipment(
    app: &App,
    filter: Option<FilterArg>,
    search: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let filter = filter.map(InventoryFilter::from);
    let units: Vec<&Equipment> = fleet
        .search(search.unwrap_or_default())
        .filter(|unit| filter.map_or(true, |f| f.matches(unit, app.period)))
        .collect();

    if json {
        let rows: Vec<_> = units
            .iter()
            .map(|unit| {
                serde_json::json!({
                    "equipment": unit,
                    "monthly_status": unit_status(unit, app.period),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if units.is_empty() {
        println!("No fire extinguishers found.");
        return Ok(());
    }
    println!(
        "{:<10} {:<13} {:<24} {:<16} {:<22} LAST CONFIRMED",
        "CODE", "CATEGORY", "LOCATION", "DEPARTMENT", "STATUS"
    );
    for unit in units {
        let confirmed = unit.last_confirmed_at.map_or_else(
            || "-".to_string(),
            |at| at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        );
        println!(
            "{:<10} {:<13} {:<24} {:<16} {:<22} {confirmed}",
            unit.code,
            unit.category.as_str(),
            unit.location,
            unit.department,
            unit_status(unit, app.period).to_string(),
        );
    }
    Ok(())
}

fn add_equipment(app: &App, add: AddEquipment) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let draft = EquipmentDraft {
        code: add.code,
        category: add.category,
        location: add.location,
        department: add.department,
        capacity: add.capacity,
        status: add.status,
        installed_on: add.installed.unwrap_or_else(|| Local::now().date_naive()),
        retired_on: add.retired_on,
    };
    let (updated, id) = fleet.add(draft, &app.rules)?;
    app.store.save(&updated)?;
    if let Some(unit) = updated.get(&id) {
        println!("Registered {} ({}).", unit.code, unit.id);
    }
    Ok(())
}

fn edit_equipment(app: &App, edit: EditEquipment) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let unit = fleet.require_code(&edit.code)?;
    let mut draft = EquipmentDraft::from_equipment(unit);
    if let Some(code) = edit.new_code {
        draft.code = code;
    }
    if let Some(category) = edit.category {
        draft.category = category;
    }
    if let Some(location) = edit.location {
        draft.location = location;
    }
    if let Some(department) = edit.department {
        draft.department = department;
    }
    if let Some(capacity) = edit.capacity {
        draft.capacity = capacity;
    }
    if let Some(installed) = edit.installed {
        draft.installed_on = installed;
    }
    if let Some(status) = edit.status {
        draft.status = status;
    }
    if edit.retired_on.is_some() {
        draft.retired_on = edit.retired_on;
    }

    let updated = fleet.update(&unit.id, draft, &app.rules)?;
    app.store.save(&updated)?;
    if let Some(unit) = updated.get(&unit.id) {
        println!("Updated {}.", unit.code);
    }
    Ok(())
}

fn handle_resolve(app: &App, code: &str) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let resolution = resolve(code, &fleet, app.period)?;
    println!("{}: {}", resolution.code, resolution.stage);
    Ok(())
}

fn handle_scan(app: &App, cmd: &ScanCommand) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let device = ImageFiles::from_path(&cmd.source)
        .with_context(|| format!("failed to open {}", cmd.source.display()))?;
    let timeout = Duration::from_secs(cmd.timeout);
    let exit = scan_frames(app, &fleet, &device, timeout)?;

    let mut session = InspectionSession::new();
    let stage = session
        .accept_scan(exit)
        .context("scanning unavailable, enter the code with `firecheck check` or `firecheck confirm`")?;
    match (stage, session.step()) {
        (Some(stage), Step::Inspect { code, .. }) => {
            println!("{code}: {stage}");
        }
        _ => println!("No registered code recognized within {}s.", cmd.timeout),
    }
    Ok(())
}

/// Run one scan over still frames, printing rejected codes as they occur.
fn scan_frames(
    app: &App,
    fleet: &Fleet,
    device: &ImageFiles,
    timeout: Duration,
) -> anyhow::Result<ScanExit> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start scan runtime")?;

    let exit = runtime.block_on(async {
        let handle = ScanHandle::new();
        let (events, mut rx) = mpsc::channel(16);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let ScanEvent::Rejected { raw, error } = event {
                    println!("{raw}: {error}");
                }
            }
        });
        let deadline = tokio::spawn({
            let handle = handle.clone();
            async move {
                tokio::time::sleep(timeout).await;
                handle.stop();
            }
        });

        let decoder = BothPolarities::new(QrDecoder);
        let exit = Scanner::new(app.scan)
            .run(device, &decoder, fleet, app.period, &handle, &events)
            .await;
        drop(events);
        deadline.abort();
        printer.await.ok();
        exit
    });
    Ok(exit)
}

fn handle_check(app: &App, cmd: CheckCommand) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let criteria = InspectionCriteria::from_form(
        cmd.hose.as_deref(),
        cmd.lever.as_deref(),
        cmd.body.as_deref(),
        cmd.pressure.as_deref(),
        cmd.obstruction.as_deref(),
    )?;

    let mut session = InspectionSession::new();
    session.identify(&cmd.code, &fleet, app.period)?;
    let check = OfficerCheck {
        criteria,
        officer_name: cmd.officer,
        note: cmd.note,
    };
    let updated = session.submit_officer_check(&fleet, check, Utc::now())?;
    app.store.save(&updated)?;

    let verdict = criteria.verdict();
    println!(
        "Officer check recorded for {} (verdict: {verdict}); awaiting technician confirmation.",
        firecheck::model::normalize_code(&cmd.code)
    );
    Ok(())
}

fn handle_confirm(app: &App, cmd: ConfirmCommand) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let mut session = InspectionSession::new();
    session.identify(&cmd.code, &fleet, app.period)?;
    let confirmation = TechnicianConfirmation {
        technician_name: cmd.technician,
        verdict: cmd.verdict,
        note: cmd.note,
    };
    let updated = session.submit_confirmation(&fleet, confirmation, Utc::now())?;
    app.store.save(&updated)?;

    println!(
        "Inspection of {} confirmed (verdict: {}).",
        firecheck::model::normalize_code(&cmd.code),
        cmd.verdict
    );
    Ok(())
}

fn handle_history(app: &App, code: &str, json: bool) -> anyhow::Result<()> {
    let fleet = app.store.load()?;
    let unit = fleet.require_code(code)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&unit.inspections)?);
        return Ok(());
    }

    println!("{} - {} ({})", unit.code, unit.location, unit.status);
    if unit.inspections.is_empty() {
        println!("No inspections recorded.");
        return Ok(());
    }
    for record in &unit.inspections {
        let inspected = record.inspected_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        println!();
        println!(
            "{inspected}  officer {} - {}",
            record.officer_name, record.officer_verdict
        );
        let c = &record.criteria;
        println!(
            "  hose {}, lever {}, body {}, pressure {}, obstruction {}",
            c.hose, c.lever, c.body, c.pressure, c.obstruction
        );
        if let Some(note) = &record.officer_note {
            println!("  note: {note}");
        }
        match &record.technician {
            Some(signoff) => {
                println!(
                    "  confirmed by {} on {} - {}",
                    signoff.name,
                    signoff.confirmed_at.with_timezone(&Local).format("%Y-%m-%d"),
                    signoff.verdict
                );
                if let Some(note) = &signoff.note {
                    println!("  technician note: {note}");
                }
            }
            None => println!("  awaiting technician confirmation"),
        }
    }
    Ok(())
}

fn show_config(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Storage]");
    println!("  Database path:      {}", config.database_path().display());
    println!("  Storage key:        {}", config.storage.storage_key);
    println!();
    println!("[Scan]");
    println!("  Tick interval (ms): {}", config.scan.tick_interval_ms);
    println!("  Decode rate (Hz):   {}", config.scan.decode_rate_hz);
    println!("  ROI fraction:       {}", config.scan.roi_fraction);
    println!("  Sample size:        {}", config.scan.sample_size);
    println!("  Both polarities:    {}", config.scan.try_both_polarities);
    println!();
    println!("[Inspection]");
    println!(
        "  Code pattern:       {}",
        config.inspection.code_pattern.as_deref().unwrap_or("(any)")
    );
    Ok(())
}

fn validate_config(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}
