use std::env;

use anyhow::Result;
use serde_json::json;

use medkb_cli::{init_tracing, App};

const USAGE: &str = "Usage: medkb <ingest [dir] | query \"<q>\" | explain \"<q>\" | stats> [--dir <dir>]";

struct Args {
    cmd: String,
    positional: Option<String>,
    dir: Option<String>,
}

fn parse_args() -> Args {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    let mut positional = None;
    let mut dir = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" | "-d" => {
                if let Some(d) = args.get(i + 1) {
                    dir = Some(d.clone());
                    i += 1;
                } else {
                    eprintln!("Error: --dir requires a path");
                    std::process::exit(1);
                }
            }
            a if !a.starts_with('-') && positional.is_none() => positional = Some(a.to_string()),
            _ => {}
        }
        i += 1;
    }
    Args { cmd, positional, dir }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_query(query: Option<String>, cmd: &str) -> String {
    query.unwrap_or_else(|| {
        eprintln!("Usage: medkb {cmd} \"<query>\"");
        std::process::exit(1)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args();
    let app = App::bootstrap()?;

    match args.cmd.as_str() {
        "ingest" => {
            let dir = app.knowledge_dir(args.positional.as_deref().or(args.dir.as_deref()))?;
            let report = app.ingest_dir(&dir, true).await;
            print_json(&json!({ "dir": dir.display().to_string(), "report": report, "stats": app.kb.stats() }))?;
        }
        "query" => {
            let query = require_query(args.positional, "query");
            let dir = app.knowledge_dir(args.dir.as_deref())?;
            app.ingest_dir(&dir, false).await;
            print_json(&app.kb.search(&query).await)?;
        }
        "explain" => {
            let query = require_query(args.positional, "explain");
            let dir = app.knowledge_dir(args.dir.as_deref())?;
            app.ingest_dir(&dir, false).await;
            let candidates = app.kb.explain(&query).await?;
            print_json(&json!({ "query": query, "floor": app.settings.retrieval.relevance_floor, "candidates": candidates }))?;
        }
        "stats" => {
            let dir = app.knowledge_dir(args.positional.as_deref().or(args.dir.as_deref()))?;
            app.ingest_dir(&dir, false).await;
            print_json(&app.kb.stats())?;
        }
        other => {
            eprintln!("Unknown command: {other}\n{USAGE}");
            std::process::exit(1);
        }
    }
    Ok(())
}
