use color_eyre::eyre::Result;

use crate::tips::{self, TipCategory};

pub fn run(compact: bool, category: Option<TipCategory>) -> Result<()> {
    let selected = tips::select(compact, category);

    match category {
        Some(category) => println!("Battery Health Tips: {}", category),
        None => println!("Battery Health Tips"),
    }
    println!("{}", "=".repeat(50));

    if selected.is_empty() {
        println!("No tips in this category.");
        if compact {
            println!("Drop --compact to see the full list.");
        }
        return Ok(());
    }

    for tip in selected {
        println!("\n{}. {} [{}]", tip.id, tip.title, tip.category);
        println!("   {}", tip.description);
    }

    Ok(())
}
