use std::env;
use std::io::{self, BufRead, Write};

use anyhow::Result;

use medkb_cli::{init_tracing, App};
use medkb_core::loader::load_directory;

const HELP: &str = ":stats  :reload  :explain <q>  :quit  (anything else is a query)";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let app = App::bootstrap()?;
    let dir = app.knowledge_dir(env::args().nth(1).as_deref())?;
    let report = app.ingest_dir(&dir, true).await;
    println!("medkb-repl: {} chunks from {} documents ({} rejected)", report.accepted, report.documents, report.rejected);
    println!("{HELP}");

    let stdin = io::stdin();
    let mut out = io::stdout();
    print!("> ");
    out.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => {}
            ":quit" | ":q" => break,
            ":help" => println!("{HELP}"),
            ":stats" => println!("{}", serde_json::to_string_pretty(&app.kb.stats())?),
            ":reload" => {
                let report = app.kb.reload(&load_directory(&dir)).await;
                println!("reloaded: {} accepted, {} rejected", report.accepted, report.rejected);
            }
            _ => {
                if let Some(q) = line.strip_prefix(":explain ") {
                    match app.kb.explain(q.trim()).await {
                        Ok(candidates) => println!("{}", serde_json::to_string_pretty(&candidates)?),
                        Err(e) => eprintln!("explain failed: {e}"),
                    }
                } else {
                    let response = app.kb.search(line).await;
                    if let Some(msg) = &response.message {
                        println!("{msg}");
                    }
                    if let Some(err) = &response.error {
                        eprintln!("search failed: {err}");
                    }
                    for (i, r) in response.results.iter().enumerate() {
                        println!(
                            "\n  {}. heuristic={:.1} vector={:.4} id={} title={}",
                            i + 1,
                            r.heuristic_score,
                            r.vector_score,
                            r.chunk.id,
                            r.chunk.metadata.title.as_deref().unwrap_or("-")
                        );
                        println!("     {}", r.chunk.text.replace('\n', " "));
                    }
                }
            }
        }
        print!("> ");
        out.flush()?;
    }
    Ok(())
}
