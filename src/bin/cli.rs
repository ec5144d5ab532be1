//! Hydrocult CLI
//!
//! Command-line client for a running Hydrocult server:
//! - Log and delete drinks
//! - Show today's progress and reports
//! - Manage the goal, reminders, notifications and display settings
//! - Export data or delete the account

use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use hydrocult::storage::{DrinkLog, DrinkType, LogStatus, ReminderMode, Theme, Units};
use hydrocult::tracker::validation::parse_time_of_day;
use hydrocult::tracker::{format_amount, local_date, local_to_utc, offset_from_minutes};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hydrocult")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track your daily water intake")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, env = "HYDROCULT_URL", default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// User id sent in the identity header
    #[arg(short, long, env = "HYDROCULT_USER", global = true)]
    pub user: Option<String>,

    /// Name of the identity header the server trusts
    #[arg(long, default_value = "x-user-id", global = true)]
    pub identity_header: String,

    /// Offset from UTC in minutes used to cut days (default: local offset)
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub tz_offset: Option<i32>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log a drink
    Log {
        /// Amount in milliliters
        amount: u32,
        /// Drink type (water, coffee, tea, juice)
        #[arg(short, long, default_value = "water")]
        drink: DrinkType,
        /// When: "now", HH:MM today, or RFC 3339
        #[arg(short, long)]
        time: Option<String>,
        /// Explicit log id, makes retries safe
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a log
    Delete {
        /// Log id
        id: String,
    },

    /// Show progress and logs for a day
    Today {
        /// Day to show (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show or set the daily goal
    Goal {
        /// New goal in milliliters
        amount: Option<u32>,
    },

    /// Show a 7 or 30 day report
    Report {
        /// Range (7d, 30d)
        #[arg(short, long, default_value = "7d")]
        range: String,
    },

    /// Manage reminders
    Remind {
        #[command(subcommand)]
        action: RemindCommand,
    },

    /// Show or change notification preferences
    Notify(NotifyArgs),

    /// Show or change display settings
    Settings {
        /// Display units (ml, oz)
        #[arg(long)]
        units: Option<Units>,
        /// Theme (system, light, dark)
        #[arg(long)]
        theme: Option<Theme>,
    },

    /// List achievements
    Achievements,

    /// Show server status
    Status,

    /// Export every log
    Export {
        /// Export format (csv, json)
        #[arg(long, default_value = "csv")]
        as_format: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete the account and every record of it
    DeleteAccount {
        /// Type DELETE to confirm
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
pub enum RemindCommand {
    /// Show the reminder schedule
    Show,
    /// Change the schedule
    Set {
        /// Mode (interval, custom)
        #[arg(long)]
        mode: Option<ReminderMode>,
        /// Minutes between reminders in interval mode
        #[arg(long)]
        interval: Option<u32>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
        /// Quiet hours as HH:MM-HH:MM
        #[arg(long, conflicts_with = "no_quiet")]
        quiet: Option<String>,
        /// Remove quiet hours
        #[arg(long)]
        no_quiet: bool,
    },
    /// Add a custom reminder time (HH:MM)
    Add { time: String },
    /// Remove a custom reminder time (HH:MM)
    Remove { time: String },
    /// When the next reminder is due
    Next,
}

#[derive(Args)]
pub struct NotifyArgs {
    #[arg(long)]
    goal_completed: Option<bool>,
    #[arg(long)]
    reminder_alerts: Option<bool>,
    #[arg(long)]
    streak_milestones: Option<bool>,
    #[arg(long)]
    missed_goal_summary: Option<bool>,
}

/// Thin wrapper adding the identity header and error decoding
struct ApiClient {
    http: reqwest::Client,
    base: String,
    user: Option<String>,
    header: String,
    offset: FixedOffset,
}

impl ApiClient {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let minutes = cli
            .tz_offset
            .unwrap_or_else(|| Local::now().offset().local_minus_utc() / 60);
        let offset = offset_from_minutes(minutes)
            .with_context(|| format!("Offset out of range: {} minutes", minutes))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base: cli.api_url.trim_end_matches('/').to_string(),
            user: cli.user.clone(),
            header: cli.identity_header.clone(),
            offset,
        })
    }

    fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    fn request(&self, method: reqwest::Method, path: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        let user = self
            .user
            .as_deref()
            .context("No user set. Pass --user or set HYDROCULT_USER")?;

        Ok(self
            .http
            .request(method, format!("{}/api/v1{}", self.base, path))
            .header(self.header.as_str(), user))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> anyhow::Result<Value> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Cannot connect to Hydrocult API at {}", self.base))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(text);
            bail!("Request failed ({}): {}", status, message);
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).context("Invalid JSON response")
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(reqwest::Method::GET, path)?).await
    }

    async fn put(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        self.send(self.request(reqwest::Method::PUT, path)?.json(&body))
            .await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli)?;
    let as_json = cli.format == "json";

    match cli.command {
        Commands::Log {
            amount,
            drink,
            time,
            id,
        } => {
            let timestamp = parse_log_time(time.as_deref(), client.offset)?;
            let mut log = DrinkLog::new(amount, drink)
                .at(timestamp)
                .with_status(LogStatus::Pending);
            if let Some(id) = id {
                log = log.with_id(id);
            }

            let body = json!({
                "id": log.id,
                "amount": log.amount,
                "drink_type": log.drink_type,
                "timestamp": log.timestamp,
                "tz_offset_minutes": client.offset_minutes(),
            });
            let request = client.request(reqwest::Method::POST, "/logs")?.json(&body);

            match client.send(request).await {
                Ok(created) if as_json => print_json(&created)?,
                Ok(created) => {
                    println!(
                        "Logged {} ml of {} ({})",
                        created["amount"].as_u64().unwrap_or(amount as u64),
                        created["drink_type"].as_str().unwrap_or(drink.as_str()),
                        created["id"].as_str().unwrap_or("-")
                    );
                    if let Some(advice) = created["advice"].as_str() {
                        println!("Note: {}", advice);
                    }
                }
                Err(e) => {
                    log = log.with_status(LogStatus::Error);
                    eprintln!(
                        "Log {} ({} ml {}) status: {}",
                        log.id,
                        log.amount,
                        log.drink_type,
                        log.status.as_str()
                    );
                    return Err(e);
                }
            }
        }

        Commands::Delete { id } => {
            let path = format!("/logs/{}", urlencoding::encode(&id));
            client
                .send(client.request(reqwest::Method::DELETE, &path)?)
                .await?;
            println!("Deleted log {}", id);
        }

        Commands::Today { date } => {
            let mut query = format!("?tz_offset_minutes={}", client.offset_minutes());
            if let Some(date) = date {
                query.push_str(&format!("&date={}", urlencoding::encode(&date.to_string())));
            }

            let progress = client.get(&format!("/progress{}", query)).await?;
            let logs = client.get(&format!("/logs{}", query)).await?;

            if as_json {
                print_json(&json!({"progress": progress, "logs": logs}))?;
            } else {
                print_today(&progress, &logs, client.offset);
            }
        }

        Commands::Goal { amount } => {
            let goal = match amount {
                Some(amount) => client.put("/goal", json!({"amount": amount})).await?,
                None => client.get("/goal").await?,
            };

            if as_json {
                print_json(&goal)?;
            } else {
                println!("Daily goal: {} ml", goal["amount"].as_u64().unwrap_or(0));
            }
        }

        Commands::Report { range } => {
            let path = format!(
                "/reports?range={}&tz_offset_minutes={}",
                urlencoding::encode(&range),
                client.offset_minutes()
            );
            let report = client.get(&path).await?;

            if as_json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }

        Commands::Remind { action } => {
            let result = match action {
                RemindCommand::Show => client.get("/reminders").await?,
                RemindCommand::Set {
                    mode,
                    interval,
                    enable,
                    disable,
                    quiet,
                    no_quiet,
                } => {
                    let mut patch = serde_json::Map::new();
                    if let Some(mode) = mode {
                        patch.insert("mode".into(), json!(mode));
                    }
                    if let Some(interval) = interval {
                        patch.insert("interval_minutes".into(), json!(interval));
                    }
                    if enable || disable {
                        patch.insert("enabled".into(), json!(enable));
                    }
                    if let Some(quiet) = quiet {
                        let (start, end) = quiet
                            .split_once('-')
                            .context("Quiet hours must look like 22:00-07:00")?;
                        patch.insert("quiet_hours".into(), json!({"start": start, "end": end}));
                    } else if no_quiet {
                        patch.insert("quiet_hours".into(), Value::Null);
                    }
                    client.put("/reminders", Value::Object(patch)).await?
                }
                RemindCommand::Add { time } => {
                    let request = client
                        .request(reqwest::Method::POST, "/reminders/times")?
                        .json(&json!({ "time": time }));
                    client.send(request).await?
                }
                RemindCommand::Remove { time } => {
                    let path = format!("/reminders/times/{}", urlencoding::encode(&time));
                    client
                        .send(client.request(reqwest::Method::DELETE, &path)?)
                        .await?
                }
                RemindCommand::Next => {
                    let next = client
                        .get(&format!(
                            "/reminders/next?tz_offset_minutes={}",
                            client.offset_minutes()
                        ))
                        .await?;
                    if as_json {
                        print_json(&next)?;
                    } else {
                        match next["next_at"].as_str().and_then(|s| s.parse().ok()) {
                            Some(at) => println!("Next reminder: {}", format_local(at, client.offset)),
                            None => println!("No reminder scheduled"),
                        }
                    }
                    return Ok(());
                }
            };

            if as_json {
                print_json(&result)?;
            } else {
                print_reminders(&result);
            }
        }

        Commands::Notify(args) => {
            let mut patch = serde_json::Map::new();
            for (key, value) in [
                ("goal_completed", args.goal_completed),
                ("reminder_alerts", args.reminder_alerts),
                ("streak_milestones", args.streak_milestones),
                ("missed_goal_summary", args.missed_goal_summary),
            ] {
                if let Some(value) = value {
                    patch.insert(key.into(), json!(value));
                }
            }

            let notifications = if patch.is_empty() {
                client.get("/notifications").await?
            } else {
                client.put("/notifications", Value::Object(patch)).await?
            };

            if as_json {
                print_json(&notifications)?;
            } else if let Some(flags) = notifications.as_object() {
                for (name, enabled) in flags {
                    let state = if enabled.as_bool().unwrap_or(false) { "on" } else { "off" };
                    println!("{:<22} {}", name, state);
                }
            }
        }

        Commands::Settings { units, theme } => {
            let settings = if units.is_none() && theme.is_none() {
                client.get("/settings").await?
            } else {
                let mut patch = serde_json::Map::new();
                if let Some(units) = units {
                    patch.insert("units".into(), json!(units));
                }
                if let Some(theme) = theme {
                    patch.insert("theme".into(), json!(theme));
                }
                client.put("/settings", Value::Object(patch)).await?
            };

            if as_json {
                print_json(&settings)?;
            } else {
                println!("Units: {}", settings["units"].as_str().unwrap_or("-"));
                println!("Theme: {}", settings["theme"].as_str().unwrap_or("-"));
            }
        }

        Commands::Achievements => {
            let data = client.get("/achievements").await?;

            if as_json {
                print_json(&data)?;
            } else {
                println!(
                    "Unlocked {} of {}",
                    data["unlocked"].as_u64().unwrap_or(0),
                    data["total"].as_u64().unwrap_or(0)
                );
                println!();
                for achievement in data["achievements"].as_array().into_iter().flatten() {
                    let mark = if achievement["unlocked"].as_bool().unwrap_or(false) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    println!(
                        "{} {:<16} {}",
                        mark,
                        achievement["title"].as_str().unwrap_or("-"),
                        achievement["description"].as_str().unwrap_or("")
                    );
                }
            }
        }

        Commands::Status => {
            let response = client
                .http
                .get(format!("{}/health", client.base))
                .send()
                .await
                .with_context(|| {
                    format!(
                        "Cannot connect to Hydrocult API at {}. Start it with: cargo run --bin hydrocult",
                        client.base
                    )
                })?;

            if !response.status().is_success() {
                bail!("API returned error: {}", response.status());
            }
            let health: Value = response.json().await?;

            if as_json {
                print_json(&health)?;
            } else {
                println!(
                    "Hydrocult v{}",
                    health["version"].as_str().unwrap_or(env!("CARGO_PKG_VERSION"))
                );
                println!();
                println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                println!("Storage:    {}", health["storage"].as_str().unwrap_or("unknown"));
                println!("Scheduler:  {}", health["scheduler"].as_str().unwrap_or("unknown"));
                println!(
                    "WebSocket connections: {}",
                    health["websocket_connections"].as_u64().unwrap_or(0)
                );
                if let Some(uptime) = health["uptime_seconds"].as_u64() {
                    println!();
                    println!("Uptime: {}", format_duration(uptime));
                }
            }
        }

        Commands::Export { as_format, output } => {
            let path = format!("/export?format={}", urlencoding::encode(&as_format));
            let response = client
                .request(reqwest::Method::GET, &path)?
                .send()
                .await
                .with_context(|| format!("Cannot connect to Hydrocult API at {}", client.base))?;

            if !response.status().is_success() {
                bail!("Export failed: {}", response.status());
            }
            let data = response.text().await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &data)?;
                    println!("Exported to {:?}", path);
                }
                None => {
                    print!("{}", data);
                }
            }
        }

        Commands::Config { output } => {
            let config = hydrocult::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }

        Commands::DeleteAccount { confirm } => {
            let request = client
                .request(reqwest::Method::DELETE, "/account")?
                .json(&json!({ "confirm": confirm }));
            let result = client.send(request).await?;

            if as_json {
                print_json(&result)?;
            } else {
                println!(
                    "Account deleted: {} logs, {} documents, {} achievements removed",
                    result["deleted"]["logs"].as_u64().unwrap_or(0),
                    result["deleted"]["documents"].as_u64().unwrap_or(0),
                    result["deleted"]["achievements"].as_u64().unwrap_or(0)
                );
            }
        }
    }

    Ok(())
}

/// `now`, `HH:MM` today in `offset`, or an RFC 3339 timestamp
fn parse_log_time(value: Option<&str>, offset: FixedOffset) -> anyhow::Result<DateTime<Utc>> {
    let now = Utc::now();
    match value {
        None | Some("now") => Ok(now),
        Some(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            let time = parse_time_of_day(s)
                .map_err(|_| anyhow::anyhow!("Invalid time: {}. Use now, HH:MM or RFC 3339", s))?;
            Ok(local_to_utc(local_date(now, offset).and_time(time), offset))
        }
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_local(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
}

fn print_today(progress: &Value, logs: &Value, offset: FixedOffset) {
    let units = match progress["units"].as_str() {
        Some("oz") => Units::Oz,
        _ => Units::Ml,
    };
    let total = progress["total_ml"].as_u64().unwrap_or(0) as u32;
    let goal = progress["goal_ml"].as_u64().unwrap_or(0) as u32;
    let percent = progress["visual_percent"].as_u64().unwrap_or(0) as usize;

    println!("{}", progress["date"].as_str().unwrap_or("-"));
    println!(
        "[{:<20}] {}",
        "#".repeat(percent / 5),
        progress["summary"].as_str().unwrap_or("")
    );
    println!(
        "{} of {}",
        format_amount(total, units),
        format_amount(goal, units)
    );

    let rows = logs["logs"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if rows.is_empty() {
        println!();
        println!("No drinks logged yet.");
        println!();
        println!("Log your first drink with:");
        println!("  hydrocult-cli log 250");
        return;
    }

    println!();
    println!("{:<8} {:<10} {:<8} {}", "Time", "Amount", "Type", "ID");
    println!("{}", "-".repeat(64));
    for log in rows {
        let time = log["timestamp"]
            .as_str()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
            .map(|ts| ts.with_timezone(&offset).format("%H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let amount = log["amount"].as_u64().unwrap_or(0) as u32;

        println!(
            "{:<8} {:<10} {:<8} {}",
            time,
            format_amount(amount, units),
            log["drink_type"].as_str().unwrap_or("-"),
            log["id"].as_str().unwrap_or("-")
        );
    }
}

fn print_report(report: &Value) {
    if !report["enough_data"].as_bool().unwrap_or(false) {
        println!("Not Enough Data Yet");
        println!("Log drinks on at least 3 days to see trends.");
        println!();
    }

    println!("{:<12} | {:<8} | {:<8} | Met", "Date", "Intake", "Goal");
    println!("{}", "-".repeat(42));
    for day in report["days"].as_array().into_iter().flatten() {
        println!(
            "{:<12} | {:<8} | {:<8} | {}",
            day["date"].as_str().unwrap_or("-"),
            day["intake"].as_u64().unwrap_or(0),
            day["goal"].as_u64().unwrap_or(0),
            if day["goal_met"].as_bool().unwrap_or(false) { "yes" } else { "" }
        );
    }

    println!();
    println!("Average intake: {} ml", report["average_intake"].as_u64().unwrap_or(0));
    println!("Goals met:      {}", report["goals_met"].as_u64().unwrap_or(0));
    println!("Current streak: {} days", report["current_streak"].as_u64().unwrap_or(0));
    println!("Longest streak: {} days", report["longest_streak"].as_u64().unwrap_or(0));
    println!("Trend:          {:+} ml vs goal", report["trend"].as_i64().unwrap_or(0));
    if let Some(insight) = report["insight"].as_str() {
        println!();
        println!("{}", insight);
    }
}

fn print_reminders(settings: &Value) {
    let enabled = settings["enabled"].as_bool().unwrap_or(false);
    println!("Reminders: {}", if enabled { "on" } else { "off" });
    println!("Mode:      {}", settings["mode"].as_str().unwrap_or("-"));
    println!(
        "Interval:  {} min",
        settings["interval_minutes"].as_u64().unwrap_or(0)
    );

    let times: Vec<&str> = settings["custom_times"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    println!("Times:     {}", if times.is_empty() { "-".to_string() } else { times.join(" ") });

    match (
        settings["quiet_hours"]["start"].as_str(),
        settings["quiet_hours"]["end"].as_str(),
    ) {
        (Some(start), Some(end)) => println!("Quiet:     {}-{}", start, end),
        _ => println!("Quiet:     none"),
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
