//! Command implementations for rbsync CLI.
//!
//! Main commands:
//! - run: export, rewrite and mirror (all-in-one)
//! - init / check: manage the config file
//! - translate: try the path translator on ad-hoc values

use crate::cli::RunArgs;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use rbsync::config::{default_config_path, Config, MirrorBackend, PhaseSwitches, Settings};
use rbsync::{
    ExportOutcome, LocalMirror, Mirror, MirrorStatus, Orchestrator, Rhythmbox, RsyncMirror,
    RewriteResult, RunReport,
};
use std::path::{Path, PathBuf};

fn resolve_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(default_config_path)
}

fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        bail!(
            "No config at {} (run `rbsync init` to create one)",
            path.display()
        );
    }
    let config = Config::load(path)?;
    Settings::from_config(&config).with_context(|| format!("Invalid config {}", path.display()))
}

/// Fold command-line switches into the configured phases.
fn apply_overrides(phases: &mut PhaseSwitches, args: &RunArgs) {
    if args.dry_run {
        phases.dry_run = true;
    }
    if args.no_dry_run {
        phases.dry_run = false;
    }
    if args.keep_workspace {
        phases.keep_workspace = true;
    }
    if args.library {
        phases.sync_library = true;
    }
    phases.export &= !args.skip_export;
    phases.sync_library &= !args.skip_library;
    phases.sync_media &= !args.skip_media;
    phases.sync_playlists &= !args.skip_playlists;
}

fn build_mirror(settings: &Settings) -> Result<Box<dyn Mirror>> {
    Ok(match settings.remote.backend {
        MirrorBackend::Rsync => Box::new(
            RsyncMirror::for_target(&settings.remote)
                .context("The rsync backend needs remote.host")?,
        ),
        MirrorBackend::Local => Box::new(LocalMirror::new("/")),
    })
}

/// Export, rewrite and mirror according to the config.
pub fn run(config: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let mut settings = load_settings(&resolve_path(config))?;
    apply_overrides(&mut settings.phases, &args);

    if settings.phases.dry_run {
        println!("{}", "Dry run: mirror commands are only logged".yellow());
    }

    let mut player = Rhythmbox::new();
    let mut mirror = build_mirror(&settings)?;
    let report = Orchestrator::new(&settings, &mut player, mirror.as_mut()).run()?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    if let Some(export) = &report.export {
        println!("{}", "Export".cyan().bold());
        for (playlist, outcome) in &export.entries {
            let status = match outcome {
                ExportOutcome::Succeeded => "exported".green(),
                ExportOutcome::SkippedByPolicy => "skipped".dimmed(),
                ExportOutcome::FailedTransient(_) => "failed (player restarted)".yellow(),
                ExportOutcome::FailedFatal(_) => "failed".red(),
            };
            println!("  {} [{}]", playlist.name.white().bold(), status);
        }
        if export.halted {
            println!("  {}", "Export stopped early".red());
        }
    }

    for (label, stats) in [("Library", report.library), ("Playlists", report.playlists)] {
        if let Some(stats) = stats {
            let unmatched = stats.unmatched.to_string();
            println!(
                "{} {} rewritten, {} unmatched",
                format!("{}:", label).cyan().bold(),
                stats.rewritten.to_string().green(),
                if stats.unmatched > 0 {
                    unmatched.red()
                } else {
                    unmatched.normal()
                }
            );
        }
    }

    if !report.mirrors.is_empty() {
        println!("{}", "Mirror".cyan().bold());
    }
    for record in &report.mirrors {
        let status = match &record.status {
            MirrorStatus::Skipped => "dry run".yellow(),
            MirrorStatus::Completed(_) => "✓".green(),
            MirrorStatus::Failed(reason) => format!("failed: {}", reason).red(),
        };
        println!("  [{}] {} {}", record.phase, record.label, status);
        if let Some(command) = &record.command {
            println!("     {}", command.dimmed());
        }
    }

    println!();
    if report.mirror_failures() == 0 {
        println!("{}", "Sync complete!".green().bold());
    } else {
        println!(
            "{}",
            format!("Sync finished with {} failed mirror job(s)", report.mirror_failures())
                .red()
                .bold()
        );
    }
}

/// Write a config with defaults for the current user.
pub fn init(config: Option<PathBuf>, force: bool) -> Result<()> {
    let path = resolve_path(config);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut config = Config::default();
    config.local.user = std::env::var("USER").ok();
    config.remote.user = config.local.user.clone();
    config.remote.host = Some("remote-host".to_string());
    config.remote.media_dir = Some("/srv/media/Music".to_string());
    config.remote.playlists_dir = Some("/srv/media/Playlists".to_string());
    config.save(&path)?;

    println!("  {} Wrote {}", "✓".green(), path.display());
    println!("Edit the [remote] section before running {}", "rbsync run".cyan());
    Ok(())
}

/// Validate the config and show how paths will be translated.
pub fn check(config: Option<PathBuf>) -> Result<()> {
    let path = resolve_path(config);
    let settings = load_settings(&path)?;
    println!("  {} {} is valid\n", "✓".green(), path.display());

    println!("{}", "Base paths".cyan().bold());
    for (idx, base) in settings.base_paths.iter().enumerate() {
        println!(
            "  {}. {} -> {}",
            (idx + 1).to_string().cyan(),
            base.white().bold(),
            settings.remote.media_dir
        );
    }

    println!("\n{}", "Media directories".cyan().bold());
    let translator = settings.translator();
    for dir in &settings.media_dirs {
        let local = dir.display().to_string();
        let exists = if dir.is_dir() { "".normal() } else { " (missing)".red() };
        println!(
            "  {}{} -> {}",
            local,
            exists,
            translator.translate(&local).value().dimmed()
        );
    }

    let remote = &settings.remote;
    let host = remote.host.as_deref().unwrap_or("localhost");
    println!("\n{}", "Remote".cyan().bold());
    println!("  host:      {}", host);
    println!("  library:   {}", remote.library_dir);
    println!("  covers:    {}", remote.cover_art_dir);
    println!("  playlists: {}", remote.playlists_dir);

    let p = settings.phases;
    println!("\n{}", "Phases".cyan().bold());
    for (name, on) in [
        ("export", p.export),
        ("library", p.sync_library),
        ("media", p.sync_media),
        ("playlists", p.sync_playlists),
        ("dry run", p.dry_run),
        ("keep workspace", p.keep_workspace),
    ] {
        let mark = if on { "on".green() } else { "off".dimmed() };
        println!("  {:<15} {}", name, mark);
    }
    println!();
    Ok(())
}

/// Print how each value would be translated.
pub fn translate(config: Option<PathBuf>, values: &[String]) -> Result<()> {
    let settings = load_settings(&resolve_path(config))?;
    let translator = settings.translator();
    for value in values {
        match translator.translate(value) {
            RewriteResult::Rewritten { original, translated } => {
                println!("{} {}\n  -> {}", "✓".green(), original, translated.green());
            }
            RewriteResult::Unmatched { original } => {
                println!("{} {} {}", "✗".red(), original, "(no base path matched)".yellow());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_disable_phases() {
        let mut phases = PhaseSwitches::default();
        let args = RunArgs {
            skip_media: true,
            no_dry_run: true,
            library: true,
            ..RunArgs::default()
        };
        apply_overrides(&mut phases, &args);
        assert!(!phases.sync_media);
        assert!(!phases.dry_run);
        assert!(phases.sync_library);
        assert!(phases.export);
        assert!(phases.sync_playlists);
    }

    #[test]
    fn test_skip_wins_over_config() {
        let mut phases = PhaseSwitches {
            sync_library: true,
            ..PhaseSwitches::default()
        };
        let args = RunArgs {
            skip_library: true,
            skip_export: true,
            keep_workspace: true,
            ..RunArgs::default()
        };
        apply_overrides(&mut phases, &args);
        assert!(!phases.sync_library);
        assert!(!phases.export);
        assert!(phases.keep_workspace);
        assert!(phases.dry_run);
    }
}
