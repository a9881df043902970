//! Training and results summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::metrics::{ClassMetrics, ClassificationReport};
use crate::pipeline::train::TrainingSummary;
use crate::results::ResultSummary;

fn section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn bold_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

fn metric_cell(value: f64) -> Cell {
    Cell::new(format!("{:.3}", value)).set_alignment(CellAlignment::Right)
}

fn metric_row(label: &str, metrics: &ClassMetrics) -> Vec<Cell> {
    vec![
        Cell::new(label),
        metric_cell(metrics.precision),
        metric_cell(metrics.recall),
        metric_cell(metrics.f1_score),
        Cell::new(metrics.support).set_alignment(CellAlignment::Right),
    ]
}

/// Per-class metrics followed by accuracy and the two averages
pub fn classification_table(report: &ClassificationReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(bold_header(&["Class", "Precision", "Recall", "F1-score", "Support"]));

    for (name, metrics) in &report.per_class {
        table.add_row(metric_row(name, metrics));
    }

    let accuracy_color = if report.accuracy >= 0.8 {
        Color::Green
    } else if report.accuracy >= 0.6 {
        Color::Yellow
    } else {
        Color::Red
    };
    table.add_row(vec![
        Cell::new("accuracy").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        metric_cell(report.accuracy)
            .fg(accuracy_color)
            .add_attribute(Attribute::Bold),
        Cell::new(report.weighted_avg.support).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(metric_row("macro avg", &report.macro_avg));
    table.add_row(metric_row("weighted avg", &report.weighted_avg));

    table
}

/// Row counts, feature set and booster size of one run
pub fn training_table(summary: &TrainingSummary) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(bold_header(&["Metric", "Value"]));

    let dropped = summary.cleaning.rows_dropped;
    table.add_row(vec![
        Cell::new("📁 Records loaded"),
        Cell::new(summary.cleaning.rows_before),
    ]);
    table.add_row(vec![
        Cell::new("🗑️  Empty rows dropped"),
        Cell::new(dropped).fg(if dropped == 0 { Color::White } else { Color::Red }),
    ]);
    table.add_row(vec![
        Cell::new("🩹 Cells imputed"),
        Cell::new(summary.cleaning.total_filled()),
    ]);
    if summary.unlabelled_rows > 0 {
        table.add_row(vec![
            Cell::new("❔ Unlabelled rows"),
            Cell::new(summary.unlabelled_rows).fg(Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("🏋️  Training rows"),
        Cell::new(summary.train_rows),
    ]);
    table.add_row(vec![
        Cell::new("🔍 Validation rows"),
        Cell::new(summary.validation_rows),
    ]);
    table.add_row(vec![
        Cell::new("🧮 Features"),
        Cell::new(format!(
            "{} ({} encoded)",
            summary.feature_columns.len(),
            summary.feature_names.len()
        )),
    ]);
    table.add_row(vec![
        Cell::new("🌲 Boosting rounds"),
        Cell::new(summary.rounds),
    ]);
    table.add_row(vec![
        Cell::new("⏱  Fit time"),
        Cell::new(format!("{:.2}s", summary.fit_time.as_secs_f64()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
    ]);

    table
}

/// Stored results, in the order given
pub fn results_table(results: &[ResultSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(bold_header(&["ID", "Created", "Accuracy", "Classes"]));

    for result in results {
        table.add_row(vec![
            Cell::new(&result.id),
            Cell::new(&result.created_at),
            metric_cell(result.accuracy),
            Cell::new(result.classes.join(", ")),
        ]);
    }

    table
}

pub fn display_training_summary(summary: &TrainingSummary) {
    section_header("📋", "TRAINING SUMMARY");
    print_indented(&training_table(summary));

    if !summary.cleaning.unfillable.is_empty() {
        println!();
        println!(
            "      {} {}:",
            style("Columns without any observed value").yellow(),
            style(format!("({})", summary.cleaning.unfillable.len())).dim()
        );
        for column in &summary.cleaning.unfillable {
            println!("        {} {}", style("•").dim(), column);
        }
    }
}

pub fn display_classification_report(report: &ClassificationReport) {
    section_header("📊", "CLASSIFICATION REPORT");
    print_indented(&classification_table(report));
}

pub fn display_results(results: &[ResultSummary]) {
    section_header("📜", "STORED RESULTS");
    if results.is_empty() {
        println!("      {}", style("No results stored yet").dim());
        return;
    }
    print_indented(&results_table(results));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table_lists_every_row() {
        let classes = vec!["Demented".to_string(), "Nondemented".to_string()];
        let report = ClassificationReport::from_predictions(&[0, 1, 1], &[0, 1, 0], &classes).unwrap();
        let rendered = classification_table(&report).to_string();

        for label in ["Demented", "Nondemented", "accuracy", "macro avg", "weighted avg"] {
            assert!(rendered.contains(label), "missing row {}", label);
        }
        assert!(rendered.contains("0.667"));
    }

    #[test]
    fn test_results_table_joins_classes() {
        let rows = vec![ResultSummary {
            id: "3f2b".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            accuracy: 0.5,
            classes: vec!["A".to_string(), "B".to_string()],
        }];
        let rendered = results_table(&rows).to_string();
        assert!(rendered.contains("A, B"));
        assert!(rendered.contains("0.500"));
    }

    #[test]
    fn test_training_table_hides_zero_unlabelled() {
        let summary = TrainingSummary::default();
        assert!(!training_table(&summary).to_string().contains("Unlabelled"));
    }
}
