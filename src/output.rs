//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! Found 3 images in 'photos'
//! Output folder: 'resized'
//! Target size: 800xauto
//! Maintain aspect ratio: true
//! ------------------------------------------------------------
//! ✓ Resized: beach.png (1600x900 → 800x450)
//!     Output: thumb_beach.jpg
//! ✗ Error processing photos/broken.jpg: cannot decode image: ...
//! ✓ Resized: sunset.png (1200x1200 → 800x800)
//!     Output: thumb_sunset.jpg
//! ------------------------------------------------------------
//!
//! Completed: 2 images resized successfully
//! Failed: 1 images
//! ```
//!
//! Progress lines appear in completion order; the summary lists are sorted.
//!
//! ## Check
//!
//! ```text
//! 2 images in 'photos'
//!     beach.png → thumb_beach.jpg
//!     sunset.png → thumb_sunset.jpg
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::process::{BatchSummary, PlannedImage, ProcessEvent};
use std::path::Path;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn side(value: Option<u32>) -> String {
    value.map_or_else(|| "auto".to_string(), |v| v.to_string())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "image" } else { "images" }
}

// ============================================================================
// Resize progress
// ============================================================================

/// Format a single progress event as display lines.
///
/// A batch with no images prints no header; the summary reports that case.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { total: 0, .. } => Vec::new(),
        ProcessEvent::BatchStarted {
            total,
            input_dir,
            output_dir,
            width,
            height,
            maintain_aspect,
        } => vec![
            format!(
                "Found {} {} in '{}'",
                total,
                plural(*total),
                input_dir.display()
            ),
            format!("Output folder: '{}'", output_dir.display()),
            format!("Target size: {}x{}", side(*width), side(*height)),
            format!("Maintain aspect ratio: {}", maintain_aspect),
            rule(),
        ],
        ProcessEvent::ImageResized(resized) => vec![
            format!(
                "\u{2713} Resized: {} ({} \u{2192} {})",
                file_name(&resized.source),
                resized.original,
                resized.resized
            ),
            format!("{}Output: {}", indent(1), file_name(&resized.output)),
        ],
        ProcessEvent::ImageFailed(failure) => vec![format!(
            "\u{2717} Error processing {}: {}",
            failure.path.display(),
            failure.message
        )],
    }
}

/// Format the end-of-run summary.
pub fn format_summary(summary: &BatchSummary, input_dir: &Path) -> Vec<String> {
    if summary.is_empty() {
        return vec![format!("No images found in '{}'", input_dir.display())];
    }

    let mut lines = vec![
        rule(),
        String::new(),
        format!(
            "Completed: {} {} resized successfully",
            summary.success,
            plural(summary.success)
        ),
    ];
    if summary.has_failures() {
        lines.push(format!(
            "Failed: {} {}",
            summary.failed,
            plural(summary.failed)
        ));
        for failure in &summary.failures {
            lines.push(format!(
                "{}{} ({})",
                indent(1),
                file_name(&failure.path),
                failure.kind
            ));
        }
    }
    lines
}

/// Print the end-of-run summary to stdout.
pub fn print_summary(summary: &BatchSummary, input_dir: &Path) {
    for line in format_summary(summary, input_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Check (dry run)
// ============================================================================

/// Format the dry-run listing: every image with its planned output name.
pub fn format_check_output(planned: &[PlannedImage], input_dir: &Path) -> Vec<String> {
    if planned.is_empty() {
        return vec![format!("No images found in '{}'", input_dir.display())];
    }

    let mut lines = vec![format!(
        "{} {} in '{}'",
        planned.len(),
        plural(planned.len()),
        input_dir.display()
    )];
    for image in planned {
        let target = image
            .output_name
            .as_deref()
            .unwrap_or("(named after decoding)");
        let marker = if image.conflict {
            "  [name conflict]"
        } else {
            ""
        };
        lines.push(format!(
            "{}{} \u{2192} {}{}",
            indent(1),
            file_name(&image.source),
            target,
            marker
        ));
    }

    let conflicts = planned.iter().filter(|p| p.conflict).count();
    if conflicts > 0 {
        lines.push(format!(
            "{} {} share an output name; only one of each group will be written",
            conflicts,
            plural(conflicts)
        ));
    }
    lines
}

/// Print the dry-run listing to stdout.
pub fn print_check_output(planned: &[PlannedImage], input_dir: &Path) {
    for line in format_check_output(planned, input_dir) {
        println!("{}", line);
    }
}
