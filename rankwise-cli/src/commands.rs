//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use crate::render;
use anyhow::Context;
use rankwise_core::catalog::{active_verticals, require_product, require_vertical};
use rankwise_core::comparison::{canonical_comparisons, resolve_comparison};
use rankwise_core::faq::{comparison_faq, product_faq};
use rankwise_core::probe::RunOutcome;
use rankwise_core::ranking::{alternatives, products_by_vertical, summarize, top_rated};
use rankwise_core::{Catalog, ComparisonRoute, InMemoryCatalog, LeakProbe, RankwiseConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Global flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Catalog file overriding `catalog.path`.
    pub catalog: Option<PathBuf>,
    pub json: bool,
}

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    options: &Options,
) -> anyhow::Result<()> {
    let output = match command {
        Commands::Config { action } => return handle_config(action, workspace).await,
        Commands::LeakTest => {
            let config = load(workspace, options)?;
            return handle_leak_test(config, options).await;
        }
        Commands::Verticals => Session::open(workspace, options)?.verticals(),
        Commands::Products { vertical } => Session::open(workspace, options)?.products(&vertical),
        Commands::Alternatives {
            vertical,
            product,
            limit,
        } => Session::open(workspace, options)?.alternatives(&vertical, &product, limit),
        Commands::Pairs { vertical } => Session::open(workspace, options)?.pairs(&vertical),
        Commands::Compare { vertical, segment } => {
            Session::open(workspace, options)?.compare(&vertical, &segment)
        }
        Commands::Faq { vertical, product } => {
            Session::open(workspace, options)?.faq(&vertical, &product)
        }
        Commands::Stats { vertical } => Session::open(workspace, options)?.stats(&vertical),
    }?;
    println!("{output}");
    Ok(())
}

fn load(workspace: &Path, options: &Options) -> anyhow::Result<RankwiseConfig> {
    let mut config = rankwise_core::config::load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(path) = &options.catalog {
        config.catalog.path = Some(path.clone());
    }
    Ok(config)
}

/// Open the configured catalog file, or the bundled seed catalog.
///
/// Relative paths are resolved against the workspace.
fn open_catalog(config: &RankwiseConfig, workspace: &Path) -> anyhow::Result<InMemoryCatalog> {
    match &config.catalog.path {
        Some(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                workspace.join(path)
            };
            InMemoryCatalog::from_path(&path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))
        }
        None => {
            debug!("No catalog configured, using the bundled seed catalog");
            Ok(InMemoryCatalog::seed()?)
        }
    }
}

fn emit<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// A loaded catalog plus the settings that shape its output.
struct Session {
    catalog: InMemoryCatalog,
    config: RankwiseConfig,
    json: bool,
}

impl Session {
    fn open(workspace: &Path, options: &Options) -> anyhow::Result<Self> {
        let config = load(workspace, options)?;
        let catalog = open_catalog(&config, workspace)?;
        Ok(Self {
            catalog,
            config,
            json: options.json,
        })
    }

    fn placeholder(&self) -> &str {
        &self.config.ranking.price_placeholder
    }

    fn verticals(&self) -> anyhow::Result<String> {
        let verticals = active_verticals(&self.catalog);
        if self.json {
            emit(&verticals)
        } else {
            Ok(render::verticals(&verticals))
        }
    }

    fn products(&self, vertical: &str) -> anyhow::Result<String> {
        require_vertical(&self.catalog, vertical)?;
        let ranked = products_by_vertical(&self.catalog, vertical);
        if self.json {
            emit(&ranked)
        } else {
            Ok(render::product_table(&ranked, self.placeholder()))
        }
    }

    fn alternatives(
        &self,
        vertical: &str,
        product: &str,
        limit: Option<usize>,
    ) -> anyhow::Result<String> {
        let current = require_product(&self.catalog, vertical, product)?;
        let limit = limit.unwrap_or(self.config.ranking.alternatives_limit);
        let alts = alternatives(&self.catalog.products(vertical), current, limit);
        if self.json {
            emit(&alts)
        } else {
            Ok(format!(
                "Alternatives to {}\n{}",
                current.name,
                render::product_table(&alts, self.placeholder())
            ))
        }
    }

    fn pairs(&self, vertical: &str) -> anyhow::Result<String> {
        require_vertical(&self.catalog, vertical)?;
        let comparisons = canonical_comparisons(&self.catalog.products(vertical));
        if self.json {
            return emit(&comparisons);
        }
        if comparisons.is_empty() {
            return Ok("No comparisons.".to_string());
        }
        Ok(comparisons
            .iter()
            .map(|c| format!("{}  ({} wins)", c.slug, c.winner.name))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn compare(&self, vertical: &str, segment: &str) -> anyhow::Result<String> {
        match resolve_comparison(&self.catalog, vertical, segment)? {
            ComparisonRoute::Page(comparison) => {
                let faq = comparison_faq(&comparison);
                if self.json {
                    emit(&serde_json::json!({ "comparison": comparison, "faq": faq }))
                } else {
                    Ok(format!(
                        "{}\n\n{}",
                        render::comparison(&comparison, self.placeholder()),
                        render::faq(&faq)
                    ))
                }
            }
            ComparisonRoute::Redirect { canonical_slug } => {
                info!(segment, canonical = %canonical_slug, "Non-canonical comparison segment");
                if self.json {
                    emit(&serde_json::json!({ "redirect": canonical_slug }))
                } else {
                    Ok(format!("Redirect: /{vertical}/{canonical_slug}"))
                }
            }
        }
    }

    fn faq(&self, vertical: &str, product: &str) -> anyhow::Result<String> {
        let product = require_product(&self.catalog, vertical, product)?;
        let entries = product_faq(product, self.placeholder());
        if self.json {
            emit(&entries)
        } else {
            Ok(render::faq(&entries))
        }
    }

    fn stats(&self, vertical: &str) -> anyhow::Result<String> {
        let v = require_vertical(&self.catalog, vertical)?;
        let ranked = products_by_vertical(&self.catalog, vertical);
        let summary = summarize(&ranked);
        let top = top_rated(&ranked, self.config.ranking.top_rated_limit);
        if self.json {
            emit(&summary)
        } else {
            Ok(render::summary(&v.name, &summary, &top))
        }
    }
}

async fn handle_leak_test(config: RankwiseConfig, options: &Options) -> anyhow::Result<()> {
    let probe = LeakProbe::from_config(config.probe)?;

    let mut updates = probe.subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let label = updates.borrow_and_update().label();
            debug!(state = label, "Leak probe state changed");
        }
    });

    if !options.json {
        eprintln!("Running leak test...");
    }
    let outcome = probe.run().await;
    drop(probe);
    let _ = watcher.await;

    let state = match outcome {
        RunOutcome::Applied(state) => state,
        RunOutcome::Superseded { run, latest } => {
            anyhow::bail!("Leak test run {run} was superseded by run {latest}")
        }
    };

    if options.json {
        println!("{}", emit(&state)?);
    } else {
        println!("{}", render::probe_state(&state));
    }

    match state {
        rankwise_core::ProbeState::Error { message, .. } => {
            anyhow::bail!("Leak test failed: {message}")
        }
        _ => Ok(()),
    }
}

async fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".rankwise");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let default_config = RankwiseConfig::default();
            let toml_str = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = rankwise_core::config::load_config(Some(workspace), None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}
