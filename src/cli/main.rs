// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Luotain - Cloud Directory Reconnaissance Toolkit
 * Standalone CLI for tenant and directory-graph reconnaissance
 *
 * Features:
 * - Unauthenticated tenant domain enumeration
 * - DNS / mail-delegation / federation probing per domain
 * - Desktop-SSO capability detection
 * - Authenticated directory graph crawling (users, groups, roles)
 * - JSON export of structured results
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};

use luotain_recon::auth::{EnvTokenProvider, StaticTokenProvider, TokenProvider};
use luotain_recon::config::ReconConfig;
use luotain_recon::graph::{DirectoryClient, DirectoryCrawler};
use luotain_recon::report::{CrawlSummary, TenantSummary};
use luotain_recon::tenant::TenantRecon;
use luotain_recon::types::{SeedSpec, TraversalPolicy};

/// Luotain - Cloud Directory Reconnaissance Toolkit
#[derive(Parser)]
#[command(name = "luotain")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Tenant and directory-graph recon built for actual engagements. Fast, bounded, Rust.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - only show errors and results
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate and probe a tenant's verified domains (unauthenticated)
    Domains {
        /// Seed domain registered with the directory service
        domain: String,

        /// Probe only the seed domain, skip tenant-wide enumeration
        #[arg(long)]
        single: bool,

        /// Concurrent domain probes
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Write the full structured profile to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Crawl the directory graph from a seed user or group (authenticated)
    Crawl {
        /// Seed user principal name
        #[arg(long, conflicts_with = "group")]
        user: Option<String>,

        /// Seed group id (shallow member fan-out, no expansion)
        #[arg(long)]
        group: Option<String>,

        /// Expand group memberships
        #[arg(long, default_value = "true")]
        groups: bool,

        /// Resolve member and owner lists for discovered groups
        #[arg(long)]
        members: bool,

        /// Expand directory-role memberships
        #[arg(long)]
        roles: bool,

        /// Fetch the seed user's manager
        #[arg(long)]
        manager: bool,

        /// Fetch direct reports for known users
        #[arg(long)]
        subordinates: bool,

        /// Cap on merged results per collection
        #[arg(long, default_value = "1000")]
        max_results: usize,

        /// Bearer token for the directory API (or set LUOTAIN_ACCESS_TOKEN)
        #[arg(short, long, env = "LUOTAIN_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Write the full structured result to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    if !cli.quiet {
        print_banner();
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let started = Instant::now();

    match cli.command {
        Commands::Domains {
            domain,
            single,
            concurrency,
            output,
        } => {
            let mut config = ReconConfig::from_env()?;
            config.probe.concurrency = concurrency;
            config.validate_all()?;

            let recon = TenantRecon::new(config)?;
            let profile = recon.collect(&domain, single).await?;

            let summary = TenantSummary::new(&profile);
            println!("{}", summary);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&profile)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Profile written to {}", path.display());
            }
        }

        Commands::Crawl {
            user,
            group,
            groups,
            members,
            roles,
            manager,
            subordinates,
            max_results,
            token,
            output,
        } => {
            let seed = match (user, group) {
                (Some(upn), None) => SeedSpec::UserPrincipal(upn),
                (None, Some(id)) => SeedSpec::GroupId(id),
                _ => anyhow::bail!("Provide exactly one of --user or --group"),
            };

            let policy = TraversalPolicy::default()
                .with_groups(groups)
                .with_group_members(members)
                .with_roles(roles)
                .with_manager(manager)
                .with_subordinates(subordinates)
                .with_max_results(max_results);

            let config = ReconConfig::from_env()?;

            let provider: Arc<dyn TokenProvider> = match token {
                Some(token) => Arc::new(StaticTokenProvider::new(token)),
                None => Arc::new(EnvTokenProvider::default()),
            };

            let client = DirectoryClient::new(&config, provider)?;
            let crawler = DirectoryCrawler::new(client);
            let result = crawler.crawl(&seed, &policy).await?;

            let summary = CrawlSummary::new(&seed, &result);
            println!("{}", summary);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Result written to {}", path.display());
            }
        }
    }

    info!("Completed in {:.2}s", started.elapsed().as_secs_f64());

    Ok(())
}

fn print_banner() {
    println!();
    println!("  luotain {} - Cloud Directory Recon", env!("CARGO_PKG_VERSION"));
    println!("  (c) 2026 Bountyy Oy");
    println!();
}
