//! Round-trip every note and emit diagnostics.

use anyhow::{bail, Context, Result};
use pulm_core::{
    check_round_trip, decode_note, ConvertConfig, Diagnostic, DiagnosticSeverity, IdAllocator,
    NoteId, RoundTripReport,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteReport {
    note_id: NoteId,
    title: String,
    blocks: usize,
    /// Problems found while reading the stored blocks
    decode_diagnostics: Vec<Diagnostic>,
    round_trip: RoundTripReport,
}

impl NoteReport {
    fn passed(&self) -> bool {
        self.round_trip.is_lossless()
    }

    fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.decode_diagnostics
            .iter()
            .chain(&self.round_trip.diagnostics)
    }
}

#[derive(Serialize)]
struct VerificationSummary<'a> {
    notes: usize,
    failed: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    reports: &'a [NoteReport],
}

/// Convert each note forward and back and report anything lost.
pub fn verify_notes(config: &ConvertConfig, notes_path: &Path, json: bool) -> Result<()> {
    let raw = super::read_json(notes_path)?;
    let Value::Array(entries) = raw else {
        bail!("{} must hold a JSON array of notes", notes_path.display());
    };

    let mut reports = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let mut ids = IdAllocator::new(&config.ids);
        let (note, decode_diagnostics) = decode_note(entry, &mut ids)
            .with_context(|| format!("Note {} in {} could not be read", index, notes_path.display()))?
            .into_parts();
        let round_trip = check_round_trip(&note.blocks, config)
            .with_context(|| format!("Failed to convert note {}", note.id))?;

        reports.push(NoteReport {
            note_id: note.id,
            title: note.title,
            blocks: note.blocks.len(),
            decode_diagnostics,
            round_trip,
        });
    }

    let count = |severity: DiagnosticSeverity| {
        reports
            .iter()
            .flat_map(NoteReport::diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let summary = VerificationSummary {
        notes: reports.len(),
        failed: reports.iter().filter(|r| !r.passed()).count(),
        errors: count(DiagnosticSeverity::Error),
        warnings: count(DiagnosticSeverity::Warning),
        infos: count(DiagnosticSeverity::Info),
        reports: &reports,
    };

    if json {
        let payload = serde_json::to_string_pretty(&summary)?;
        println!("{}", payload);
    } else {
        println!(
            "Verification complete: {} notes, {} failed, {} errors, {} warnings, {} info",
            summary.notes, summary.failed, summary.errors, summary.warnings, summary.infos
        );
        for report in &reports {
            let status = if report.passed() { "ok" } else { "LOSSY" };
            println!("{} {} ({} blocks) {}", status, report.note_id, report.blocks, report.title);
            if let Some(index) = report.round_trip.first_mismatch {
                println!("  first mismatch at block {}", index);
            }
            for diag in report.diagnostics() {
                let block = diag
                    .block_id
                    .as_ref()
                    .map(|b| format!(" [{}]", b))
                    .unwrap_or_default();
                println!("  - {:?} {}{}: {}", diag.severity, diag.code, block, diag.message);
            }
        }
    }

    if summary.failed > 0 {
        bail!("{} of {} notes did not round-trip", summary.failed, summary.notes);
    }
    Ok(())
}
