// Preset listing

use anyhow::Result;

use crate::output::{print_table_header, print_table_row, OutputFormat};
use crate::preset::PresetBook;

pub fn run(book: &PresetBook, output: OutputFormat) -> Result<()> {
    if !output.is_text() {
        return output.print_value(&book.presets());
    }

    print_table_header(&[
        ("ID", 16),
        ("NAME", 20),
        ("PARSER", 6),
        ("WIDTH", 5),
        ("INDENT", 7),
        ("MINIFY", 20),
    ]);
    for preset in book.presets() {
        let format = &preset.format;
        let indent = if format.use_tabs {
            "tabs".to_string()
        } else {
            format!("{} sp", format.tab_width)
        };
        let minify = match (preset.minify.remove_comments, preset.minify.collapse_whitespace) {
            (true, true) => "comments+whitespace",
            (true, false) => "comments",
            (false, true) => "whitespace",
            (false, false) => "off",
        };

        let parser = format.parser.to_string();
        let width = format.print_width.to_string();

        print_table_row(&[
            (preset.id.as_str(), 16),
            (preset.name.as_str(), 20),
            (parser.as_str(), 6),
            (width.as_str(), 5),
            (indent.as_str(), 7),
            (minify, 20),
        ]);
    }
    Ok(())
}
