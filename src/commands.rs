use crate::{OutputMode, emit_success};
use anyhow::Context;
use indicatif::HumanDuration;
use owo_colors::OwoColorize;
use phrasebook::config::{self, PhrasebookConfig, ResolvedPaths};
use phrasebook::import::{self, ImportOutcome};
use phrasebook::session;
use phrasebook::ui::{self, Icons, Spinner, header, info, section, success, summary_row, timing, warn};
use phrasebook::{Level, Phrase, PhraseStore, StudyQueries};
use std::path::Path;

fn open_store(paths: &ResolvedPaths) -> anyhow::Result<PhraseStore> {
    PhraseStore::open(&paths.database)
        .with_context(|| format!("cannot open phrase store {}", paths.database.display()))
}

fn print_phrase(phrase: &Phrase) {
    println!(
        "{} {} {}",
        Icons::BOOK,
        ui::muted(&format!("[{} #{}]", phrase.level, phrase.id)),
        phrase.source_text.style(ui::theme().prompt.clone())
    );
    println!("   {}", phrase.target_text.style(ui::theme().answer.clone()));
}

pub fn run_init(output_mode: OutputMode, path: &Path, base: &Path, force: bool) -> anyhow::Result<()> {
    let config = PhrasebookConfig {
        database: Some(config::default_database_path_in(base).display().to_string()),
        import_file: Some(config::default_import_path_in(base).display().to_string()),
    };
    config::write_config(path, &config, force)?;

    if output_mode.is_human() {
        success(&format!("Wrote config to {}", path.display()));
    } else {
        emit_success(output_mode, "init", serde_json::json!({ "path": path, "config": config }))?;
    }
    Ok(())
}

pub fn run_import(output_mode: OutputMode, paths: &ResolvedPaths) -> anyhow::Result<()> {
    let mut store = open_store(paths)?;

    if output_mode.is_human() {
        header("Importing phrases");
        info("Source", &paths.import_file.display().to_string());
        info("Database", &paths.database.display().to_string());
    }

    let spinner = Spinner::new("Importing...");
    let outcome = import::import_phrases(&mut store, &paths.import_file)
        .with_context(|| format!("import from {} failed", paths.import_file.display()))?;
    spinner.finish_and_clear();

    report_import(output_mode, "import", &outcome)?;
    store.shutdown()?;
    Ok(())
}

pub fn run_seed(output_mode: OutputMode, paths: &ResolvedPaths) -> anyhow::Result<()> {
    let written = phrasebook::seed::write_sample_file(&paths.import_file)
        .with_context(|| format!("cannot write sample file {}", paths.import_file.display()))?;

    if output_mode.is_human() {
        if written {
            info("Created sample file", &paths.import_file.display().to_string());
        } else {
            info("Using existing file", &paths.import_file.display().to_string());
        }
    }

    let mut store = open_store(paths)?;
    let outcome = import::import_phrases(&mut store, &paths.import_file)?;
    report_import(output_mode, "seed", &outcome)?;
    store.shutdown()?;
    Ok(())
}

fn report_import(output_mode: OutputMode, command: &str, outcome: &ImportOutcome) -> anyhow::Result<()> {
    if !output_mode.is_human() {
        return emit_success(output_mode, command, serde_json::to_value(outcome)?);
    }

    match outcome {
        ImportOutcome::Imported(report) => {
            success(&outcome.to_string());
            summary_row("Inserted:", &report.inserted.to_string());
            summary_row("Skipped:", &report.skipped.to_string());
            if report.dropped > 0 {
                summary_row("Dropped:", &report.dropped.to_string());
            }
        }
        ImportOutcome::NoValidCandidates { .. } => warn(&outcome.to_string()),
    }
    Ok(())
}

pub fn run_next(output_mode: OutputMode, paths: &ResolvedPaths, level: Option<Level>) -> anyhow::Result<()> {
    let mut store = open_store(paths)?;
    let next = StudyQueries::new(&store).next_due(level)?;

    if output_mode.is_human() {
        match &next {
            Some(phrase) => print_phrase(phrase),
            None => success("Nothing left to study. Well done!"),
        }
    } else {
        emit_success(output_mode, "next", serde_json::json!({ "phrase": next }))?;
    }

    store.shutdown()?;
    Ok(())
}

pub fn run_mark(output_mode: OutputMode, paths: &ResolvedPaths, id: i64, completed: bool) -> anyhow::Result<()> {
    let mut store = open_store(paths)?;
    let changed = StudyQueries::new(&store).set_completed(id, completed)?;

    if changed == 0 {
        tracing::warn!(id, "No phrase with this id");
    }

    if output_mode.is_human() {
        match (changed, completed) {
            (0, _) => warn(&format!("No phrase with id {}", id)),
            (_, true) => success(&format!("Phrase #{} marked as learned", id)),
            (_, false) => success(&format!("Phrase #{} marked as not learned", id)),
        }
    } else {
        let command = if completed { "done" } else { "undo" };
        emit_success(
            output_mode,
            command,
            serde_json::json!({ "id": id, "completed": completed, "changed": changed }),
        )?;
    }

    store.shutdown()?;
    Ok(())
}

pub fn run_stats(output_mode: OutputMode, paths: &ResolvedPaths) -> anyhow::Result<()> {
    let mut store = open_store(paths)?;
    let stats = StudyQueries::new(&store).stats_by_level()?;
    store.shutdown()?;

    let total: usize = stats.iter().map(|s| s.total).sum();
    let completed: usize = stats.iter().map(|s| s.completed).sum();

    if !output_mode.is_human() {
        return emit_success(
            output_mode,
            "stats",
            serde_json::json!({
                "levels": stats,
                "total": total,
                "completed": completed,
                "remaining": total - completed,
            }),
        );
    }

    println!("{} Phrasebook progress ({})", Icons::STATS, paths.database.display());
    if stats.is_empty() {
        warn("No phrases yet. Run `phrasebook seed` or `phrasebook import`.");
        return Ok(());
    }

    println!("{}", ui::level_table(&stats));
    Ok(())
}

pub fn run_study(output_mode: OutputMode, paths: &ResolvedPaths, level: Option<Level>) -> anyhow::Result<()> {
    let mut store = open_store(paths)?;

    if output_mode.is_human() {
        header("Study session");
        if let Some(level) = level {
            info("Level", level.as_str());
        }
    }

    let summary = {
        let queries = StudyQueries::new(&store);
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut out = std::io::stdout();
        session::run_session(&queries, level, &mut input, &mut out)?
    };
    store.shutdown()?;

    if output_mode.is_human() {
        section("Session summary");
        summary_row("Shown:", &summary.shown.to_string());
        summary_row("Learned:", &summary.learned.to_string());
        summary_row("Skipped:", &summary.skipped.to_string());
        timing(&HumanDuration(summary.elapsed).to_string());
        if summary.exhausted {
            println!("{} {}", Icons::STAR, "Everything here is learned!".style(ui::theme().success.clone()));
        }
    } else {
        let mut data = serde_json::to_value(&summary)?;
        data["elapsed_secs"] = serde_json::json!(summary.elapsed.as_secs_f64());
        emit_success(output_mode, "study", data)?;
    }
    Ok(())
}

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        println!(
            "{} {} {}",
            Icons::BOOK,
            "Phrasebook".bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).style(ui::theme().dim.clone())
        );
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}
