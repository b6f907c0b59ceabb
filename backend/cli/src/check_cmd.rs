//! `labelcheck check`: intake, both remote phases, report and export.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use labelcheck_client::{HttpCheckService, HttpOptions};
use labelcheck_config::LabelCheckConfig;
use labelcheck_core::{CheckEvent, CheckEventKind, Locale, Phase};
use labelcheck_logging::CheckEventLogger;
use labelcheck_orchestrator::{
    CheckOrchestrator, ExportError, OrchestratorConfig, SubmitOutcome, TickerSettings,
};

use crate::intake_cmd;
use crate::report_view::render_report;
use crate::terminal_output::{
    note_error, note_info, note_success, note_warn, progress_bar, redraw_line, supports_color,
};

pub async fn run(config: &LabelCheckConfig, file: &Path, export: Option<&Path>, json: bool) -> Result<ExitCode> {
    let locale = config.locale();
    let Some(artifact) = intake_cmd::select(file, locale).await? else {
        return Ok(ExitCode::from(2));
    };

    let service = HttpCheckService::new(
        config.base_url(),
        HttpOptions {
            timeout: config.timeout(),
            user_agent: config.user_agent().to_string(),
        },
    )?;
    let orchestrator = CheckOrchestrator::new(
        Arc::new(service),
        OrchestratorConfig {
            ticker: TickerSettings {
                interval: config.tick_interval(),
                step: config.tick_step(),
                ceiling: config.tick_ceiling(),
            },
            locale,
            ..Default::default()
        },
    );

    let event_logger = CheckEventLogger::spawn(orchestrator.subscribe());
    let progress = (!json && std::io::stderr().is_terminal())
        .then(|| tokio::spawn(show_progress(BroadcastStream::new(orchestrator.subscribe()), locale)));

    info!(file = %file.display(), base_url = config.base_url(), "Checking label");
    let outcome = tokio::select! {
        outcome = orchestrator.submit(artifact) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            orchestrator.reset().await;
            SubmitOutcome::Abandoned
        }
    };

    let exit = match &outcome {
        SubmitOutcome::Complete(report) => {
            finish_progress(progress).await;
            if json {
                print_snapshot(&orchestrator).await?;
            } else {
                print!("{}", render_report(report, locale, supports_color()));
                println!("\n{}", report.share_summary(locale));
            }
            if let Some(target) = export {
                export_report(&orchestrator, target).await?;
            }
            if report.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        SubmitOutcome::Failed(error) => {
            finish_progress(progress).await;
            if json {
                print_snapshot(&orchestrator).await?;
            }
            note_error(&error.message);
            ExitCode::from(2)
        }
        SubmitOutcome::Abandoned => {
            finish_progress(progress).await;
            note_warn(match locale {
                Locale::Uk => "Перевірку скасовано",
                Locale::En => "Check cancelled",
            });
            ExitCode::from(2)
        }
    };

    drop(orchestrator);
    event_logger.join().await;
    Ok(exit)
}

/// Draw a live progress line until the session leaves the in-flight states.
async fn show_progress(mut events: BroadcastStream<CheckEvent>, locale: Locale) {
    let mut stderr = std::io::stderr();
    while let Some(event) = events.next().await {
        let Ok(event) = event else { continue };
        match event.kind {
            CheckEventKind::Progress { phase, progress } => {
                let label = match (locale, phase) {
                    (Locale::Uk, Phase::Extraction) => "Розпізнавання",
                    (Locale::Uk, Phase::Validation) => "Перевірка    ",
                    (Locale::En, Phase::Extraction) => "Extracting",
                    (Locale::En, Phase::Validation) => "Validating",
                };
                let _ = redraw_line(&mut stderr, &format!("{label} {}", progress_bar(progress, 30)));
            }
            CheckEventKind::StateChanged { state } if !state.is_in_flight() => {
                break;
            }
            _ => {}
        }
    }
    let _ = redraw_line(&mut stderr, "");
}

async fn finish_progress(progress: Option<tokio::task::JoinHandle<()>>) {
    if let Some(handle) = progress {
        let _ = handle.await;
    }
}

async fn print_snapshot(orchestrator: &CheckOrchestrator) -> Result<()> {
    let snapshot = orchestrator.snapshot().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("Failed to serialize check result")?
    );
    Ok(())
}

async fn export_report(orchestrator: &CheckOrchestrator, target: &Path) -> Result<()> {
    match orchestrator.export_report().await {
        Ok(export) => {
            let path: PathBuf = if tokio::fs::metadata(target).await.is_ok_and(|m| m.is_dir()) {
                target.join(&export.file_name)
            } else {
                target.to_path_buf()
            };
            tokio::fs::write(&path, &export.data)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            note_success(&path.display().to_string());
            Ok(())
        }
        Err(ExportError::Failed { message, .. }) => {
            note_error(&message);
            Ok(())
        }
        Err(e @ ExportError::NotReady { .. }) => {
            warn!(error = %e, "Export requested without a completed check");
            note_info(&e.to_string());
            Ok(())
        }
    }
}
