use anyhow::Result;

pub const GENRE_BAR_HEIGHT: u16 = 5;
pub const FOOTER_HEIGHT: u16 = 3;

/// Rows visible inside the bordered movie list for the current terminal.
pub fn get_movielist_height() -> Result<usize> {
    let (_cols, rows) = crossterm::terminal::size()?;
    Ok(rows.saturating_sub(GENRE_BAR_HEIGHT + FOOTER_HEIGHT + 2) as usize) // 2 lines for border
}

/// True once the bottom of the viewport has passed `threshold` of the
/// content. Content that fits entirely counts as crossed.
pub fn crossed_scroll_threshold(offset: usize, viewport: usize, content: usize, threshold: f64) -> bool {
    let bottom = offset + viewport.max(1);
    if bottom >= content {
        return true;
    }
    bottom as f64 / content as f64 >= threshold
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
