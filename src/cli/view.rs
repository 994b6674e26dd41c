//! View commands: list, matrix and timeline renderings of a schedule

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::projection::{self, Endpoint, MatrixCell, Span};
use crate::domain::ScheduleId;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum ViewCommands {
    /// Flat list of dependencies with item names
    List,

    /// Predecessor x successor matrix
    ///
    /// Cells show the relationship badge and lag, '+' where a dependency
    /// could be added, 'x' where adding one would create a cycle.
    Matrix,

    /// Predecessor -> successor cards in dependency order
    Timeline,
}

pub fn run(cmd: ViewCommands, output: &Output, schedule: Option<ScheduleId>) -> Result<()> {
    let project = Project::open_current()?;
    let schedule = project.schedule_or_default(schedule);
    let repo = project.load(&schedule)?;
    let store = repo.store();

    output.verbose_ctx(
        "view",
        &format!(
            "Schedule {}: {} items, {} dependencies",
            schedule,
            store.item_count(),
            store.edge_count()
        ),
    );

    match cmd {
        ViewCommands::List => {
            let rows = projection::list_view(store);
            if output.is_json() {
                output.data(&rows);
            } else if rows.is_empty() {
                println!("No dependencies in schedule {}", schedule);
            } else {
                output.table_header(&format!(
                    "{:<12} {:<24} {:<24} {:<4} LAG",
                    "ID", "PREDECESSOR", "SUCCESSOR", "TYPE"
                ));
                for row in rows {
                    println!(
                        "{:<12} {:<24} {:<24} {:<4} {}",
                        row.id,
                        truncate(&row.predecessor.name, 24),
                        truncate(&row.successor.name, 24),
                        row.dep_type.badge(),
                        row.lag
                    );
                }
            }
        }

        ViewCommands::Matrix => {
            let matrix = projection::matrix_view(store);
            if output.is_json() {
                output.data(&matrix);
            } else if matrix.items.is_empty() {
                println!("No items in schedule {}", schedule);
            } else {
                let width = column_width(&matrix.items);

                print!("{:<width$}", "", width = width + 1);
                for item in &matrix.items {
                    print!(" {:>width$}", item.id, width = width);
                }
                println!();

                for (row, item) in matrix.items.iter().enumerate() {
                    print!("{:<width$} ", item.id, width = width);
                    for cell in &matrix.cells[row] {
                        print!(" {:>width$}", cell_label(cell), width = width);
                    }
                    println!();
                }
            }
        }

        ViewCommands::Timeline => {
            let cards = projection::timeline_view(store);
            if output.is_json() {
                output.data(&cards);
            } else if cards.is_empty() {
                println!("No dependencies in schedule {}", schedule);
            } else {
                for card in cards {
                    println!(
                        "[{}] {} {}  --{} +{}-->  [{}] {} {}",
                        card.predecessor.id,
                        card.predecessor.name,
                        span_label(card.predecessor_span),
                        card.badge,
                        card.lag,
                        card.successor.id,
                        card.successor.name,
                        span_label(card.successor_span)
                    );
                }
            }
        }
    }

    Ok(())
}

/// Width of a matrix column in characters, wide enough for any id or cell
fn column_width(items: &[Endpoint]) -> usize {
    items
        .iter()
        .map(|i| i.id.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max(7)
}

fn cell_label(cell: &MatrixCell) -> String {
    match cell {
        MatrixCell::Diagonal => "-".to_string(),
        MatrixCell::Linked { dep_type, lag, .. } => format!("{}+{}", dep_type.badge(), lag.days()),
        MatrixCell::Empty { creatable: true } => "+".to_string(),
        MatrixCell::Empty { creatable: false } => "x".to_string(),
    }
}

fn span_label(span: Option<Span>) -> String {
    match span {
        Some(s) if s.start == s.end => format!("({})", s.start),
        Some(s) => format!("({} .. {})", s.start, s.end),
        None => "(unknown item)".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
