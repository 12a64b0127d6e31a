//
// cli.rs
// Dicom-Catalog-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the corresponding components.
//
// Thales Matheus Mendonça Santos - November 2025

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::catalog::CatalogBrowser;
use crate::config::ScanConfigManager;
use crate::export::ExportCoordinator;
use crate::history::ScanHistory;
use crate::models::{
    NewFilterRule, NewScanConfig, ScanConfigPatch, ScanRun, ScheduleType, SeriesRecord,
};
use crate::query::{FilterPatch, QueryState};
use crate::rules::FilterRuleManager;
use crate::selection::SelectionSet;
use crate::stats::StatsAggregator;

/// Command-line interface glue code: defines the available verbs and
/// dispatches to components.
#[derive(Parser)]
#[command(name = "dicom-catalog")]
#[command(about = "Catálogo de séries DICOM em Rust", long_about = None)]
pub struct Cli {
    /// Base URL of the catalog service
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse the series catalog with filters and pagination
    Series {
        #[arg(long)]
        patient_id: Option<String>,
        #[arg(long)]
        patient_name: Option<String>,
        #[arg(long)]
        modality: Option<String>,
        #[arg(long)]
        protocol_name: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one series record in full
    Show { id: String },
    /// Export series by identifier into a target directory
    Export {
        #[arg(short, long)]
        target_dir: String,
        /// Series identifiers (duplicates collapse)
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Manage scan-source configurations
    Configs {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Trigger a scan for a configured source
    Scan { config_id: i64 },
    /// Show scan run history
    Scans {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Manage per-modality filter rules
    Rules {
        #[command(subcommand)]
        command: RuleCommands,
    },
    /// Show modality/date statistics
    Stats,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// List all scan configs
    List,
    /// Register a new scan path
    Add {
        scan_path: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, value_enum, default_value_t = Schedule::Manual)]
        schedule: Schedule,
    },
    /// Update an existing config (unset fields keep their value)
    Update {
        id: i64,
        #[arg(long)]
        scan_path: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        schedule: Option<Schedule>,
    },
    /// Delete a config (its scan history is kept)
    Remove { id: i64 },
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// List all filter rules
    List,
    /// Create a rule for a modality
    Add {
        modality: String,
        #[arg(long)]
        min_slice_thickness: Option<f64>,
        #[arg(long)]
        min_image_count: Option<u64>,
    },
    /// Delete a rule
    Remove { id: i64 },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Schedule {
    Manual,
    Weekly,
}

impl From<Schedule> for ScheduleType {
    fn from(value: Schedule) -> Self {
        match value {
            Schedule::Manual => ScheduleType::Manual,
            Schedule::Weekly => ScheduleType::Weekly,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse the raw CLI arguments once and dispatch to a subcommand handler.
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Series {
            patient_id,
            patient_name,
            modality,
            protocol_name,
            page,
        } => {
            let mut query = QueryState::default();
            query.set_filters(FilterPatch {
                patient_id,
                patient_name,
                modality,
                protocol_name,
            });
            query.set_page(page);
            browse_series(&api, &query).await?;
        }
        Commands::Show { id } => {
            let browser = CatalogBrowser::new(api);
            let record = browser.get(&id).await?;
            print_series_detail(&record);
        }
        Commands::Export { target_dir, ids } => {
            let selection: SelectionSet = ids.into_iter().collect();
            let coordinator = ExportCoordinator::new(api);
            let outcome = coordinator.export(&selection, &target_dir).await?;
            println!(
                "Exported {} series to {}",
                outcome.exported_count, outcome.target_dir
            );
            if !outcome.message.is_empty() {
                println!("  {}", outcome.message);
            }
        }
        Commands::Configs { command } => {
            let manager = ScanConfigManager::new(api);
            match command {
                ConfigCommands::List => {
                    for config in manager.list().await? {
                        println!(
                            "{:>4}  {:<40} {:<8} last scan: {}",
                            config.id,
                            config.scan_path,
                            schedule_label(config.schedule_type),
                            config.last_scan_at.as_deref().unwrap_or("never")
                        );
                        if let Some(description) = &config.description {
                            println!("      {}", description);
                        }
                    }
                }
                ConfigCommands::Add {
                    scan_path,
                    description,
                    schedule,
                } => {
                    let created = manager
                        .create(NewScanConfig {
                            scan_path,
                            description,
                            schedule_type: schedule.into(),
                            filter_rules: None,
                        })
                        .await?;
                    println!("Created config {} for {}", created.id, created.scan_path);
                }
                ConfigCommands::Update {
                    id,
                    scan_path,
                    description,
                    schedule,
                } => {
                    let updated = manager
                        .update(
                            id,
                            ScanConfigPatch {
                                scan_path,
                                description: description.map(Some),
                                schedule_type: schedule.map(Into::into),
                                filter_rules: None,
                            },
                        )
                        .await?;
                    println!("Updated config {} ({})", updated.id, updated.scan_path);
                }
                ConfigCommands::Remove { id } => {
                    manager.delete(id).await?;
                    println!("Deleted config {}", id);
                }
            }
        }
        Commands::Scan { config_id } => {
            let manager = ScanConfigManager::new(api);
            println!("Scanning... (this may take a while)");
            let run = manager.run_scan(config_id).await?;
            print_scan_run(&run);
        }
        Commands::Scans { page } => {
            let history = ScanHistory::new(api);
            for run in history.page(page).await? {
                print_scan_run(&run);
            }
        }
        Commands::Rules { command } => {
            let manager = FilterRuleManager::new(api);
            match command {
                RuleCommands::List => {
                    for rule in manager.list().await? {
                        println!(
                            "{:>4}  {:<6} min thickness: {:<8} min images: {:<6} {}",
                            rule.id,
                            rule.modality,
                            rule.min_slice_thickness
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            rule.min_image_count
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            if rule.is_active { "active" } else { "inactive" }
                        );
                    }
                }
                RuleCommands::Add {
                    modality,
                    min_slice_thickness,
                    min_image_count,
                } => {
                    let created = manager
                        .create(NewFilterRule {
                            modality,
                            min_slice_thickness,
                            min_image_count,
                        })
                        .await?;
                    println!("Created rule {} for {}", created.id, created.modality);
                }
                RuleCommands::Remove { id } => {
                    manager.delete(id).await?;
                    println!("Deleted rule {}", id);
                }
            }
        }
        Commands::Stats => {
            let aggregator = StatsAggregator::new(api);
            let dashboard = aggregator.dashboard().await?;
            println!("Total series: {}", dashboard.total);
            println!("By modality:");
            for share in &dashboard.modalities {
                println!(
                    "  {:<8} {:>8}  {:>5.1}%",
                    share.modality, share.count, share.percent
                );
            }
            println!("By study date (most recent):");
            for stat in &dashboard.dates {
                println!("  {:<12} {:>8}", stat.date, stat.count);
            }
        }
    }

    Ok(())
}

async fn browse_series(api: &ApiClient, query: &QueryState) -> anyhow::Result<()> {
    let browser = CatalogBrowser::new(api.clone());
    browser.fetch(query).await?;
    let view = browser.view().await;

    for entry in &view.entries {
        println!(
            "{:<14} {:<20} {:<4} {:<24} {:<10} {:>5}",
            entry.id,
            entry.patient_name.as_deref().unwrap_or("-"),
            entry.modality.as_deref().unwrap_or("-"),
            entry.protocol_name.as_deref().unwrap_or("-"),
            entry.study_date.as_deref().unwrap_or("-"),
            entry.file_count.unwrap_or(0)
        );
    }
    if view.entries.is_empty() {
        println!("(no series match the current filters)");
    }

    // Same page control as the web UI: position label plus prev/next hints.
    let pagination = query.page.paginate(view.total);
    println!(
        "{}  共 {} 条记录  上一页{}  下一页{}",
        pagination.label(),
        pagination.total,
        if pagination.has_prev { "" } else { "(禁用)" },
        if pagination.has_next { "" } else { "(禁用)" }
    );
    Ok(())
}

fn print_series_detail(record: &SeriesRecord) {
    println!("Series {}", record.id);
    let fields: [(&str, Option<&str>); 10] = [
        ("Patient Name", record.patient_name.as_deref()),
        ("Patient ID", record.patient_id.as_deref()),
        ("Sex", record.patient_sex.as_deref()),
        ("Birth Date", record.patient_birth_date.as_deref()),
        ("Modality", record.modality.as_deref()),
        ("Protocol", record.protocol_name.as_deref()),
        ("Study Date", record.study_date.as_deref()),
        ("Description", record.series_description.as_deref()),
        ("Manufacturer", record.manufacturer.as_deref()),
        ("Model", record.manufacturer_model.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {:<14} {}", label, value);
        }
    }
    if let Some(count) = record.file_count {
        println!("  {:<14} {}", "Files", count);
    }
    if let Some(size) = record.file_size_total {
        println!("  {:<14} {}", "Total bytes", size);
    }
    if let Some(path) = record.file_path.as_deref() {
        println!("  {:<14} {}", "Path", path);
    }
}

fn print_scan_run(run: &ScanRun) {
    println!(
        "{:<14} {:<30} {:<10} found: {:<5} new: {:<5} dup: {:<5} {}",
        run.id,
        run.scan_path,
        format!("{:?}", run.status).to_lowercase(),
        run.series_found,
        run.series_new,
        run.series_duplicated,
        run.started_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );
}

fn schedule_label(schedule: ScheduleType) -> &'static str {
    match schedule {
        ScheduleType::Manual => "manual",
        ScheduleType::Weekly => "weekly",
    }
}
