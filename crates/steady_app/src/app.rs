use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, info, warn};

use steady_core::{
    achievement::{badges_for, StreakRank},
    completion::{HttpCompletionClient, DEFAULT_API_URL},
    habit::{DayTone, MarkHistory},
    quote,
    responder::{Responder, ReplyTag},
    service::HabitService,
    storage::DirStore,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) api_key: Option<String>,
    pub(crate) api_url: Option<String>,
    pub(crate) model: Option<String>,
    pub(crate) rules_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = env::var("STEADY_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        config.api_key = env::var("STEADY_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        config.api_url = env::var("STEADY_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        config.model = env::var("STEADY_MODEL")
            .ok()
            .filter(|model| !model.trim().is_empty());
        config.rules_file = env::var("STEADY_RULES_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".steady"),
            api_key: None,
            api_url: None,
            model: None,
            rules_file: None,
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    if command == Some("chat") {
        return chat(&config, &rest(&args));
    }

    let today = Local::now().date_naive();
    info!(data_dir = %config.data_dir.display(), %today, "opening habit store");

    let store = DirStore::open(&config.data_dir).with_context(|| {
        format!(
            "unable to open data directory {}",
            config.data_dir.display()
        )
    })?;
    let mut service = HabitService::builder()
        .with_store(Box::new(store))
        .build(today);
    service.reconcile_day(today);

    match command {
        None | Some("list") => print_overview(&service, today),
        Some("add") => {
            let name = rest(&args);
            if name.is_empty() {
                bail!("usage: steady add <name>");
            }
            service.add(&name);
            print_overview(&service, today);
        }
        Some("remove") => {
            let name = rest(&args);
            if name.is_empty() {
                bail!("usage: steady remove <name>");
            }
            service.remove(&name);
            print_overview(&service, today);
        }
        Some("toggle") => {
            let name = rest(&args);
            if name.is_empty() {
                bail!("usage: steady toggle <name>");
            }
            let (_, mark) = service.toggle(&name);
            if mark.is_none() {
                println!("No habit named \"{name}\".");
            }
            print_overview(&service, today);
        }
        Some("badges") => print_badges(&service),
        Some(other) => {
            bail!("unknown command `{other}`; expected list, add, remove, toggle, badges or chat")
        }
    }
    Ok(())
}

fn rest(args: &[String]) -> String {
    args.get(1..).unwrap_or(&[]).join(" ").trim().to_string()
}

fn print_overview(service: &HabitService, today: NaiveDate) {
    let snapshot = service.snapshot();
    let quote = quote::random_quote();

    println!("\"{}\" - {}", quote.text, quote.author);
    println!();
    print!("{}", render_month(&snapshot.marks, today));
    println!();
    println!("Current streak: {} days", snapshot.streak);
    println!();
    if snapshot.habits.is_empty() {
        println!("No habits yet. `steady add <name>` to get started.");
    } else {
        println!("Today's habits:");
        for habit in &snapshot.habits {
            let check = if habit.completed { "x" } else { " " };
            println!("  [{check}] {}", habit.name);
        }
    }
}

fn print_badges(service: &HabitService) {
    let streak = service.snapshot().streak;
    let rank = StreakRank::for_days(streak);
    println!("Habit streak: {streak} days ({} rank)", rank.label());
    println!();
    for badge in badges_for(streak) {
        let check = if badge.earned { "x" } else { " " };
        println!("  [{check}] {} - {}", badge.title, badge.description);
    }
}

/// One month of the calendar as text: `#` fully completed, `o` partial.
fn render_month(marks: &MarkHistory, today: NaiveDate) -> String {
    let first = today.with_day(1).unwrap_or(today);
    let mut out = String::new();
    out.push_str(&format!("{:^28}\n", first.format("%B %Y")));
    for name in ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"] {
        out.push_str(&format!("{name:>3} "));
    }
    out.push('\n');

    let mut line = String::new();
    for _ in 0..first.weekday().num_days_from_sunday() {
        line.push_str("    ");
    }
    let mut cursor = first;
    while cursor.month() == first.month() {
        let symbol = match marks.get(&cursor).map(|mark| mark.tone) {
            Some(DayTone::Completed) => '#',
            Some(DayTone::Partial) => 'o',
            None => ' ',
        };
        line.push_str(&format!("{:>3}{symbol}", cursor.day()));
        if cursor.weekday().num_days_from_sunday() == 6 {
            line.push('\n');
            out.push_str(&line);
            line.clear();
        }
        match cursor.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    if !line.is_empty() {
        line.push('\n');
        out.push_str(&line);
    }
    out
}

fn chat(config: &AppConfig, message: &str) -> Result<()> {
    if message.is_empty() {
        bail!("usage: steady chat <message>");
    }

    let mut responder = Responder::new();
    if let Some(path) = &config.rules_file {
        match fs::read_to_string(path) {
            Ok(raw) => match responder.extend_from_pairs(&raw) {
                Ok(count) => debug!(count, "loaded rule pairs"),
                Err(err) => warn!(%err, "rule dataset is unreadable; continuing with built-ins"),
            },
            Err(err) => {
                warn!(%err, path = %path.display(), "unable to read rule dataset; continuing with built-ins");
            }
        }
    }
    if let Some(api_key) = &config.api_key {
        let base_url = config.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let mut client = HttpCompletionClient::with_base_url(base_url, api_key);
        if let Some(model) = &config.model {
            client = client.with_model(model);
        }
        responder = responder.with_client(Box::new(client));
    }

    let reply = responder.respond(message);
    let speaker = match reply.tag {
        ReplyTag::Crisis => "Crisis Support",
        ReplyTag::Rule | ReplyTag::Ai => "Chatbot",
    };
    println!("{speaker}: {}", reply.text);
    Ok(())
}
