//! `taskscout doctor`: diagnose configuration and credentials.

use taskscout_config::AppConfig;
use taskscout_core::provider::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("TaskScout Doctor - System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, using defaults (run `taskscout onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    println!(
        "  Provider: {}  Model: {}  Embeddings: {}",
        config.default_provider, config.default_model, config.embedding_model
    );

    if config.has_api_key() || config.default_provider == "ollama" {
        println!("  ✅ Model API key configured");
    } else {
        println!("  ❌ No model API key: set api_key or OPENAI_API_KEY");
        issues += 1;
    }

    if config.has_search_credentials() {
        println!("  ✅ Web search configured ({} results per query)", config.search.results);
    } else {
        println!("  ⚠️  No search credentials: tasks will run without web context");
        issues += 1;
    }

    match taskscout_providers::router::build_from_config(&config) {
        Ok(router) => {
            if let Some(provider) = router.default() {
                issues += check_provider(provider.as_ref(), &config).await;
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    println!("  Context mode: {:?}", config.pipeline.context_mode);

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Reachability and model availability. Returns the number of issues found.
async fn check_provider(provider: &dyn Provider, config: &AppConfig) -> usize {
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
        Ok(false) => {
            println!("  ⚠️  Provider '{}' answered but reported unhealthy", provider.name());
            return 1;
        }
        Err(e) => {
            println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
            return 1;
        }
    }

    let models = match provider.list_models().await {
        Ok(models) if !models.is_empty() => models,
        // Some compatible servers don't list models
        _ => return 0,
    };

    let mut issues = 0;
    for model in [&config.default_model, &config.embedding_model] {
        if models.iter().any(|m| m == model) {
            println!("  ✅ Model '{model}' available");
        } else {
            println!("  ❌ Model '{model}' not offered by '{}'", provider.name());
            issues += 1;
        }
    }
    issues
}
