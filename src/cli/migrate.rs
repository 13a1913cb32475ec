//! Migration command for moving override files from `~/.overrides/` to `~/.external-properties/`.

use crate::defaults::{DefaultLocations, LEGACY_OVERRIDE_DIR, OVERRIDE_DIR};
use crate::types::OverrideMove;
use crate::unit::UnitTree;
use anyhow::{Context, Result};
use clap::Args;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the migrate command.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Perform migration without prompting for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would be migrated without making changes.
    #[arg(long)]
    pub dry_run: bool,
}

/// What a migration run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub moved: Vec<OverrideMove>,
    /// Moves not made because the target already exists.
    pub skipped: Vec<OverrideMove>,
}

/// Run the migration command for every unit in the tree.
pub fn run_migrate(
    args: &MigrateArgs,
    tree: &UnitTree,
    locations: &DefaultLocations,
) -> Result<MigrationSummary> {
    if locations.home.is_none() {
        println!("No migration possible: home directory is unknown. Use --home to set it.");
        return Ok(MigrationSummary::default());
    }

    let pending = locations.pending_migrations(tree, tree.iter());
    if pending.is_empty() {
        println!("No migration needed: no files under '{}/'.", LEGACY_OVERRIDE_DIR);
        return Ok(MigrationSummary::default());
    }

    // Units with the same name share one legacy file.
    let mut sharers: HashMap<PathBuf, usize> = HashMap::new();
    for entry in &pending {
        *sharers.entry(entry.from.clone()).or_default() += 1;
    }

    let (ready, blocked): (Vec<_>, Vec<_>) = pending.into_iter().partition(|m| !m.to.exists());

    // Show what will be migrated
    println!("Migration plan:");
    for entry in &ready {
        println!("  {}", entry.unit_name);
        println!("    From: {}", entry.from.display());
        println!("    To:   {}", entry.to.display());
        if sharers[&entry.from] > 1 {
            println!("    (shared by {} units, copied to each)", sharers[&entry.from]);
        }
    }
    for entry in &blocked {
        println!(
            "  {} (skipped: '{}' already exists)",
            entry.unit_name,
            entry.to.display()
        );
    }
    println!();

    let mut summary = MigrationSummary {
        moved: Vec::new(),
        skipped: blocked,
    };

    if ready.is_empty() {
        println!("Nothing to move. Merge the skipped files by hand.");
        return Ok(summary);
    }

    if args.dry_run {
        println!("Dry run: No changes made.");
        return Ok(summary);
    }

    // Confirm unless --yes
    if !args.yes {
        println!(
            "This will move {} file(s) from '{}/' to '{}/'.",
            ready.len(),
            LEGACY_OVERRIDE_DIR,
            OVERRIDE_DIR
        );
        print!("Continue? [y/N] ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Migration cancelled.");
            return Ok(summary);
        }
    }

    println!("Migrating...");
    for entry in ready {
        if let Some(parent) = entry.to.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        // Skipped units keep their share, so the legacy file stays for them.
        let remaining = sharers.get_mut(&entry.from).map_or(0, |count| {
            *count -= 1;
            *count
        });
        if remaining > 0 {
            fs::copy(&entry.from, &entry.to).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.from.display(),
                    entry.to.display()
                )
            })?;
        } else {
            fs::rename(&entry.from, &entry.to).with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    entry.from.display(),
                    entry.to.display()
                )
            })?;
            // The per-unit legacy directory is usually empty now.
            if let Some(old_dir) = entry.from.parent() {
                let _ = fs::remove_dir(old_dir);
            }
        }
        info!(
            unit = %entry.unit_name,
            from = %entry.from.display(),
            to = %entry.to.display(),
            "Moved override file"
        );
        summary.moved.push(entry);
    }

    println!("Migration complete! Moved {} file(s).", summary.moved.len());
    Ok(summary)
}
