use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn mean_cell(mean: f64) -> Cell {
    Cell::new(format!("{mean:.2}")).fg(TableColor::Yellow)
}

/// Green when the step succeeded, red otherwise.
pub fn status_cell(ok: bool, text: impl ToString) -> Cell {
    let color = if ok { TableColor::Green } else { TableColor::Red };
    Cell::new(text.to_string()).fg(color)
}
