//! bubble-runner: headless runner for the bubble risk scoring engine.
//!
//! Usage:
//!   bubble-runner --db data/signals.db --out score.json --speech
//!   bubble-runner --db data/signals.db --status
//!   bubble-runner --db data/signals.db --build-entries
//!   bubble-runner --db data/signals.db --ipc-mode

use anyhow::Result;
use bubble_core::{
    engine::{open_store, BubbleEngine},
    enrichment::{breakdown, build_entries, write_entries},
    heuristic::HeuristicStrategy,
    presentation::{format_for_speech, to_bubble_state, BubbleAnalysisView},
    qualitative::load_entries,
    registry::BubbleRegistry,
    store::SignalStore,
    CompositeResult, ScoringInputs,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Score {
        #[serde(default = "default_bubble_id")]
        bubble_id: String,
    },
    GetState {
        #[serde(default = "default_bubble_id")]
        bubble_id: String,
    },
    List,
    Quit,
}

fn default_bubble_id() -> String {
    "market".to_string()
}

struct Paths {
    db:      PathBuf,
    entries: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = arg_str(&args, "--data-dir").unwrap_or("./data").to_string();
    let paths = Paths {
        db:      PathBuf::from(arg_str(&args, "--db").unwrap_or("./data/signals.db")),
        entries: arg_str(&args, "--entries")
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(&data_dir).join("outputs").join("bubble_data.json")),
    };
    let bubble_id = arg_str(&args, "--bubble-id").unwrap_or("market").to_string();
    let ipc_mode = has_flag(&args, "--ipc-mode");

    if !ipc_mode {
        println!("bubble-runner");
        println!("  db:        {}", paths.db.display());
        println!("  entries:   {}", paths.entries.display());
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let engine = BubbleEngine::load(&data_dir)?;

    if has_flag(&args, "--status") {
        return print_status(&paths);
    }
    if has_flag(&args, "--build-entries") {
        return rebuild_entries(&engine, &paths);
    }
    if ipc_mode {
        return run_ipc_loop(&engine, &paths);
    }

    let result = score_once(&engine, &paths, has_flag(&args, "--heuristic"))?;
    print_summary(&bubble_id, &result);

    if has_flag(&args, "--speech") {
        println!();
        println!("{}", format_for_speech(&result));
    }
    if let Some(out) = arg_str(&args, "--out") {
        let body = if has_flag(&args, "--legacy") {
            serde_json::to_string_pretty(&BubbleAnalysisView::from(&result))?
        } else {
            serde_json::to_string_pretty(&result)?
        };
        std::fs::write(out, body)?;
        println!();
        println!("Saved to {out}");
    }
    Ok(())
}

/// Open the store and entries fresh, then score.
fn score_once(engine: &BubbleEngine, paths: &Paths, force_heuristic: bool) -> Result<CompositeResult> {
    let store = open_store(&paths.db)?;
    let entries = load_entries(&paths.entries)?;
    let inputs = ScoringInputs::new(store.as_ref(), &entries);
    let result = if force_heuristic {
        engine.score_with(&HeuristicStrategy, &inputs, chrono::Utc::now())?
    } else {
        engine.score(&inputs)?
    };
    Ok(result)
}

fn run_ipc_loop(engine: &BubbleEngine, paths: &Paths) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut registry = BubbleRegistry::new();
    log::info!("ipc mode: reading commands from stdin");

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unparseable command: {}", buffer.trim());
                write_json(&mut stdout, &serde_json::json!({ "error": e.to_string() }))?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Score { bubble_id } => match score_once(engine, paths, false) {
                Ok(result) => {
                    let state = registry.publish(&bubble_id, result.clone());
                    serde_json::json!({ "bubble_id": bubble_id, "state": state, "result": result })
                }
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            IpcCommand::GetState { bubble_id } => match registry.state(&bubble_id) {
                Ok(state) => serde_json::json!({ "bubble_id": bubble_id, "state": state }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            IpcCommand::List => serde_json::json!({ "bubble_ids": registry.ids() }),
        };
        write_json(&mut stdout, &reply)?;
    }
    Ok(())
}

fn write_json(out: &mut impl Write, value: &serde_json::Value) -> Result<()> {
    writeln!(out, "{value}")?;
    out.flush()?;
    Ok(())
}

fn rebuild_entries(engine: &BubbleEngine, paths: &Paths) -> Result<()> {
    let Some(store) = open_store(&paths.db)? else {
        anyhow::bail!("no signal store at {}", paths.db.display());
    };
    let today = chrono::Utc::now().date_naive();
    let entries = build_entries(&store, engine.config(), today)?;
    write_entries(&paths.entries, &entries)?;
    println!("Wrote {} entries to {}", entries.len(), paths.entries.display());
    Ok(())
}

fn print_status(paths: &Paths) -> Result<()> {
    println!("=== SIGNAL STORE ===");
    match open_store(&paths.db)? {
        Some(store) => print_tables(&store)?,
        None => println!("  (not created yet)"),
    }

    println!();
    println!("=== ENTRIES ===");
    let entries = load_entries(&paths.entries)?;
    let b = breakdown(&entries);
    println!("  total:          {}", b.total);
    for (category, n) in &b.by_category {
        println!("  {category:<15} {n}");
    }
    for (label, n) in &b.by_sentiment {
        println!("  {label:<15} {n}");
    }
    Ok(())
}

fn print_tables(store: &SignalStore) -> Result<()> {
    for t in store.table_status()? {
        let rows = if t.exists { t.rows.to_string() } else { "missing".to_string() };
        println!("  {:<24} {rows}", t.table);
    }
    Ok(())
}

fn print_summary(bubble_id: &str, result: &CompositeResult) {
    let state = to_bubble_state(result);
    println!("=== BUBBLE SCORE ({bubble_id}) ===");
    println!("  overall:     {:.1}/100", result.overall_score);
    println!("  state:       {}", result.state);
    println!("  risk level:  {:?}", state.risk_level);
    println!("  confidence:  {:.0}%", result.confidence * 100.0);
    println!("  coverage:    {}", result.data_coverage);
    println!("  method:      {}", result.methodology);
    println!();
    for (category, r) in &result.categories {
        println!(
            "  {:<12} {:>5.1}/100  {:<20} {}/{} metrics",
            category.as_str().to_uppercase(),
            r.score,
            r.descriptor,
            r.n_available,
            r.n_total
        );
    }
    println!();
    println!("  warnings:");
    for w in &result.warning_signals {
        println!("    - {w}");
    }
}

fn arg_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
