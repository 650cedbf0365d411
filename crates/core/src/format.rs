use crate::types::StudyNotes;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size with at most two decimals, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Plain-text export of study notes.
pub fn format_notes_text(notes: &StudyNotes) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n\n{}\n\n", notes.title, notes.summary));

    let sections = notes
        .sections
        .iter()
        .map(|section| {
            let mut block = section.heading.clone();
            for line in &section.content {
                block.push_str(&format!("\n• {}", line));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    output.push_str(&sections);

    output.push_str("\n\nKey Points:\n");
    let points = notes
        .key_points
        .iter()
        .map(|point| format!("• {}", point))
        .collect::<Vec<_>>()
        .join("\n");
    output.push_str(&points);

    output
}
