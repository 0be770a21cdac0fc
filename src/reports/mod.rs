use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use gearforge::character::CharacterContext;
use gearforge::data::GameData;
use gearforge::optimizer::MaximizerResult;
use gearforge::scorer::Evaluator;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn format_bound(v: f64) -> String {
    if v.is_finite() {
        format!("{:.2}", v)
    } else {
        "-".to_string()
    }
}

pub fn print_loadout(result: &MaximizerResult) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Slot").add_attribute(Attribute::Bold),
        Cell::new("Item").add_attribute(Attribute::Bold),
        Cell::new("Change"),
    ]);

    for a in &result.slots {
        let item = a.item.clone().unwrap_or_else(|| "(none)".to_string());
        let (mark, color) = if a.changed {
            ("*", Color::Yellow)
        } else {
            ("", Color::Reset)
        };
        table.add_row(vec![
            Cell::new(a.slot.to_string()).add_attribute(Attribute::Bold),
            Cell::new(item).fg(color),
            Cell::new(mark).fg(color),
        ]);
    }

    let extras = [
        ("familiar", &result.familiar),
        ("crown-of-thrones", &result.enthroned),
        ("buddy-bjorn", &result.bjorned),
        ("card-sleeve", &result.card),
        ("outfit", &result.outfit),
    ];
    for (label, value) in extras {
        if let Some(v) = value {
            table.add_row(vec![
                Cell::new(label).add_attribute(Attribute::Bold),
                Cell::new(v).fg(Color::Cyan),
                Cell::new(""),
            ]);
        }
    }
    for (item, choice) in &result.item_options {
        table.add_row(vec![
            Cell::new(item).add_attribute(Attribute::Bold),
            Cell::new(choice).fg(Color::Cyan),
            Cell::new(""),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_highlights(result: &MaximizerResult) {
    if result.highlights.is_empty() {
        return;
    }
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Modifier").add_attribute(Attribute::Bold),
        Cell::new("Value").fg(Color::Green),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    for h in &result.highlights {
        table.add_row(vec![
            Cell::new(&h.axis),
            Cell::new(format!("{:.2}", h.value)).fg(Color::Green),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_weights(ev: &Evaluator, data: &GameData, ctx: &CharacterContext) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Modifier").add_attribute(Attribute::Bold),
        Cell::new("Weight").fg(Color::Cyan),
        Cell::new("Min").fg(Color::Red),
        Cell::new("Max").fg(Color::Green),
        Cell::new("Now"),
    ]);
    for i in 1..=4 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for &axis in ev.active_axes() {
        table.add_row(vec![
            Cell::new(axis.to_string()).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.2}", ev.weight[axis])).fg(Color::Cyan),
            Cell::new(format_bound(ev.min[axis])).fg(Color::Red),
            Cell::new(format_bound(ev.max[axis])).fg(Color::Green),
            Cell::new(format!("{:.2}", ev.derived_value(axis, &ctx.modifiers, ctx))),
        ]);
    }
    println!("\n{}", table);

    let names = |ids: Vec<String>| if ids.is_empty() { "-".to_string() } else { ids.join(", ") };
    let items = |set: &std::collections::BTreeSet<gearforge::data::ItemId>| {
        names(
            set.iter()
                .filter_map(|id| data.item(*id))
                .map(|i| i.name.clone())
                .collect(),
        )
    };
    println!("📌 Equip: {}", items(&ev.pos_equip));
    println!("🚫 Avoid: {}", items(&ev.neg_equip));
    println!(
        "👔 Outfits: {}",
        names(
            ev.pos_outfits
                .iter()
                .filter_map(|o| data.outfit(*o))
                .map(|o| o.name.clone())
                .collect()
        )
    );
    println!(
        "🐾 Switch: {}",
        names(
            ev.familiars
                .iter()
                .filter_map(|f| data.familiar(f.id))
                .map(|f| f.race.clone())
                .collect()
        )
    );
    println!(
        "⚙️  Current: {}   Null score: {:.2}",
        ev.current,
        ev.null_score(ctx)
    );
}
