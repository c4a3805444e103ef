use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use patgen_tuner::setting::{Setting, UNSCORED};
use patgen_tuner::validator::CrossValidationReport;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn ratio(value: f64) -> String {
    if value <= UNSCORED {
        "-".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn align_right(table: &mut Table, columns: std::ops::RangeInclusive<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn print_population(population: &[Setting], f_weight: f64) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Run").add_attribute(Attribute::Bold),
        Cell::new("Lvl"),
        Cell::new("Prev"),
        Cell::new("Start"),
        Cell::new("Finish"),
        Cell::new("Good"),
        Cell::new("Bad"),
        Cell::new("Thr"),
        Cell::new("Patterns").fg(Color::Cyan),
        Cell::new("Prec").fg(Color::Green),
        Cell::new("Recall").fg(Color::Green),
        Cell::new(format!("F{}", f_weight)).add_attribute(Attribute::Bold),
    ]);

    for s in population {
        table.add_row(vec![
            Cell::new(s.run_id.map_or_else(|| "-".to_string(), |id| id.to_string()))
                .add_attribute(Attribute::Bold),
            Cell::new(s.level),
            Cell::new(s.prev),
            Cell::new(s.pat_start),
            Cell::new(s.pat_finish),
            Cell::new(s.good_weight),
            Cell::new(s.bad_weight),
            Cell::new(s.threshold),
            Cell::new(s.n_patterns.map_or_else(|| "-".to_string(), |n| n.to_string()))
                .fg(Color::Cyan),
            Cell::new(ratio(s.precision())).fg(Color::Green),
            Cell::new(ratio(s.recall())).fg(Color::Green),
            Cell::new(ratio(s.f_score(f_weight))).add_attribute(Attribute::Bold),
        ]);
    }
    align_right(&mut table, 1..=11);
    println!("\n{}", table);
}

pub fn print_fold_report(report: &CrossValidationReport) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Fold").add_attribute(Attribute::Bold),
        Cell::new("Good"),
        Cell::new("Bad").fg(Color::Red),
        Cell::new("Missed").fg(Color::Red),
        Cell::new("Prec").fg(Color::Green),
        Cell::new("Recall").fg(Color::Green),
        Cell::new("Patterns"),
    ]);

    for f in &report.folds {
        table.add_row(vec![
            Cell::new(f.fold).add_attribute(Attribute::Bold),
            Cell::new(f.stats.tp),
            Cell::new(f.stats.fp).fg(Color::Red),
            Cell::new(f.stats.fn_).fg(Color::Red),
            Cell::new(format!("{:.4}", f.precision)).fg(Color::Green),
            Cell::new(format!("{:.4}", f.recall)).fg(Color::Green),
            Cell::new(f.patterns.display()),
        ]);
    }
    table.add_row(vec![
        Cell::new("Mean").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.4}", report.precision)).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", report.recall)).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    align_right(&mut table, 1..=5);
    println!("\n{}", table);
}
