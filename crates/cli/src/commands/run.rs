//! `taskscout run`: plan an objective and execute its tasks.

use std::io::Write;

use taskscout_agent::{AgentRunner, ContextBuilder, LanguageModel, RunEvent};
use taskscout_config::{AppConfig, ContextMode};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

pub async fn run(
    objective: Option<String>,
    mode: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(mode) = mode {
        config.pipeline.context_mode = mode.parse::<ContextMode>()?;
    }

    // Local models need no key
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY=sk-...          (OpenAI)");
        eprintln!("    OPENROUTER_API_KEY=sk-or-...   (with TASKSCOUT_PROVIDER=openrouter)");
        eprintln!("    TASKSCOUT_API_KEY=...          (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = taskscout_providers::router::build_from_config(&config)?;
    let provider = router.default().ok_or("No default provider configured")?;
    let llm = LanguageModel::from_config(provider, &config);
    info!(
        provider = %config.default_provider,
        model = llm.model(),
        mode = ?config.pipeline.context_mode,
        "Agent configured"
    );

    let context = match taskscout_tools::search_from_config(&config) {
        Ok(search) => {
            let fetcher = taskscout_tools::fetcher_from_config(&config);
            Some(ContextBuilder::from_config(search, fetcher, llm.clone(), &config))
        }
        Err(e) => {
            warn!(error = %e, "Web search disabled");
            None
        }
    };

    let objective = match objective {
        Some(objective) => objective,
        None => ask_objective()?,
    };

    let mut runner = AgentRunner::new(llm, context);
    let printer = if json {
        None
    } else {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        runner = runner.with_events(tx);
        Some(tokio::spawn(print_events(rx)))
    };

    let report = runner.run(&objective).await;
    drop(runner);
    if let Some(printer) = printer {
        printer.await?;
    }
    let report = report?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print!("{report}");
    }

    Ok(())
}

fn ask_objective() -> Result<String, Box<dyn std::error::Error>> {
    println!("\nPlease provide your objective:\n");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let objective = line.trim().to_string();
    if objective.is_empty() {
        return Err("No objective given.".into());
    }
    Ok(objective)
}

async fn print_events(mut rx: UnboundedReceiver<RunEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Planned { tasks } => {
                println!("\nTask List:");
                for (i, task) in tasks.iter().enumerate() {
                    println!("{}. {task}", i + 1);
                }
            }
            RunEvent::TaskStarted { description, .. } => {
                println!("\nExecuting task: {description}\n");
            }
            RunEvent::SearchDecided {
                needed: true,
                query: Some(query),
                ..
            } => println!("  Searching the web: {query}"),
            RunEvent::SearchDecided { .. } => {}
            RunEvent::ContextAttached { chars, .. } => {
                println!("  Added {chars} characters of web context");
            }
            RunEvent::ContextFailed { reason, .. } => {
                println!("  Continuing without web context ({reason})");
            }
            RunEvent::TaskCompleted { result, .. } => println!("\nResult: {result}"),
            RunEvent::TaskFailed { error, .. } => println!("\nTask failed: {error}"),
        }
    }
}
