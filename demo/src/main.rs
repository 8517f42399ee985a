//! lineage reference host — demo CLI
//!
//! Loads the bundled graph declarations and prints the answers the engine
//! gives for a handful of capability questions.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- forum
//!   cargo run -p demo -- plans
//!   cargo run -p demo -- inspect path/to/graph.toml

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lineage_contracts::{error::LineageResult, query::ConstraintQuery};
use lineage_core::{constraints_for, CapabilityHolder};
use lineage_policy::{ActionHolder, Directory, FeatureHolder};

const FORUM_GRAPH: &str = include_str!("../../crates/lineage-policy/graphs/forum.toml");
const PLANS_GRAPH: &str = include_str!("../../crates/lineage-policy/graphs/plans.json");

// ── CLI definition ────────────────────────────────────────────────────────────

/// lineage — hierarchical capability resolution demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "lineage capability resolution demo",
    long_about = "Resolves bundled role and plan graphs and prints capability answers,\n\
                  including constrained grants, inheritance, and the superuser bypass."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run both bundled scenarios in sequence.
    RunAll,
    /// Forum roles: blanket and constrained moderator actions.
    Forum,
    /// Subscription plans: storage tiers and inherited features.
    Plans,
    /// Load a graph file (TOML, or JSON by extension) and list every holder's capabilities.
    Inspect {
        /// Path to the graph declaration.
        path: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug to watch resolution and cache events.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => run_forum().and_then(|()| run_plans()),
        Command::Forum => run_forum(),
        Command::Plans => run_plans(),
        Command::Inspect { path } => run_inspect(path),
    };

    if let Err(e) = result {
        eprintln!("demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

fn answer(question: &str, granted: bool) {
    println!("  {:<48} {}", question, if granted { "yes" } else { "no" });
}

fn run_forum() -> LineageResult<()> {
    let directory = Directory::from_toml_str(FORUM_GRAPH)?;
    info!("forum scenario");
    println!("Forum roles");
    println!("===========");

    if let Some(alice) = directory.user("alice") {
        answer(
            "alice: deploy",
            alice.can_perform("deploy", ConstraintQuery::RequireUnconstrained)?,
        );
        answer("alice: ban_user in forum_x", alice.can_perform("ban_user", "forum_x")?);
        answer("alice: ban_user in forum_y", alice.can_perform("ban_user", "forum_y")?);
        answer(
            "alice: ban_user anywhere",
            alice.can_perform("ban_user", ConstraintQuery::AnyConstraint)?,
        );
        answer("alice: assigned to devs", alice.assigned_to("devs"));
        answer("alice: inherits from devs", alice.inherits_from("devs")?);
    }
    if let Some(bob) = directory.user("bob") {
        answer("bob: edit_post (own)", bob.can_perform("edit_post", "own")?);
        answer("bob: edit_post (pinned)", bob.can_perform("edit_post", "pinned")?);
        answer("bob: ban_user in forum_x", bob.can_perform("ban_user", "forum_x")?);
    }
    if let Some(root) = directory.user("root") {
        answer(
            "root: launch_missiles (superuser)",
            root.can_perform("launch_missiles", ConstraintQuery::RequireUnconstrained)?,
        );
        answer("root: inherits from devs", root.inherits_from("devs")?);
    }
    println!();
    Ok(())
}

fn run_plans() -> LineageResult<()> {
    let directory = Directory::from_json_str(PLANS_GRAPH)?;
    info!("plans scenario");
    println!("Subscription plans");
    println!("==================");

    for customer in directory.customers() {
        let storage = constraints_for(&**customer, "storage")?
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!("  {:<12} storage: {}", customer.name(), storage);
        answer(
            &format!("{}: sso", customer.name()),
            customer.has_feature("sso", ConstraintQuery::RequireUnconstrained)?,
        );
        answer(
            &format!("{}: storage at 10gb", customer.name()),
            customer.has_feature("storage", "10gb")?,
        );
        answer(&format!("{}: inherits basic", customer.name()), customer.inherits_plan("basic")?);
    }
    println!();
    Ok(())
}

fn run_inspect(path: PathBuf) -> LineageResult<()> {
    let directory = Directory::from_file(&path)?;

    for role in directory.roles() {
        println!("role {:<16} {}", role.name(), role.actions()?.collect::<Vec<_>>().join(", "));
    }
    for user in directory.users() {
        let marker = if user.is_superuser() { " (superuser)" } else { "" };
        let actions = user.actions()?.collect::<Vec<_>>().join(", ");
        println!("user {:<16} {}{}", user.name(), actions, marker);
    }
    for plan in directory.plans() {
        println!("plan {:<16} {}", plan.name(), plan.features()?.collect::<Vec<_>>().join(", "));
    }
    for customer in directory.customers() {
        let features = customer.features()?.collect::<Vec<_>>().join(", ");
        println!("customer {:<12} {}", customer.name(), features);
    }
    Ok(())
}
