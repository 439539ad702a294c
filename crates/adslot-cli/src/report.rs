//! Terminal tables and JSON output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use adslot_core::{AD_FORMATS, LoaderFlags, LoaderPhase, PlaceholderIcon};

use crate::run::Simulation;

/// The format catalog.
pub fn formats_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Format"),
        header_cell("Name"),
        header_cell("Width"),
        header_cell("Height"),
        header_cell("Shape"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for format in &AD_FORMATS {
        let shape = match PlaceholderIcon::for_size(format.width, format.height) {
            PlaceholderIcon::Banner => "banner",
            PlaceholderIcon::Tile => "tile",
        };
        table.add_row(vec![
            Cell::new(format.kind.key())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(format.display_name),
            Cell::new(format.width),
            Cell::new(format.height),
            dim_cell(shape),
        ]);
    }
    table
}

/// Phase changes from a simulated run.
pub fn transitions_table(simulation: &Simulation) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("At (ms)"),
        header_cell("From"),
        header_cell("To"),
        header_cell("Failures"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (index, step) in simulation.transitions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(step.at.as_millis()),
            dim_cell(step.transition.from),
            phase_cell(step.transition.to),
            Cell::new(step.transition.attempts),
        ]);
    }
    table
}

/// Flags as pretty JSON, keyed the way page diagnostics expect.
pub fn flags_json(flags: &LoaderFlags) -> serde_json::Result<String> {
    serde_json::to_string_pretty(flags)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn phase_cell(phase: LoaderPhase) -> Cell {
    let color = match phase {
        LoaderPhase::Idle => Color::DarkGrey,
        LoaderPhase::Loading => Color::Yellow,
        LoaderPhase::Loaded => Color::Green,
        LoaderPhase::Failed => Color::Red,
    };
    Cell::new(phase).fg(color)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
