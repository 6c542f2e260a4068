//! Screen renderer using crossterm
//!
//! Draws the base screen (status line and decoded-event log) and overlays the
//! visible modal surfaces. Rendering never routes input.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, SetAttribute},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use unicode_width::UnicodeWidthStr;

use super::context_menu::MenuState;
use super::selector::SelectorState;

/// What the base screen shows.
pub struct Screen<'a> {
    pub title: &'a str,
    pub status: &'a str,
    /// Oldest first
    pub log: &'a [String],
}

/// Terminal renderer
pub struct Renderer {
    initialized: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self { initialized: false }
    }

    /// Enter the alternate screen with the cursor hidden
    pub fn init(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        self.initialized = true;
        Ok(())
    }

    /// Restore the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.initialized {
            let mut stdout = io::stdout();
            execute!(stdout, SetAttribute(Attribute::Reset), Show, LeaveAlternateScreen)?;
            self.initialized = false;
        }
        Ok(())
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    pub fn render(
        &self,
        screen: &Screen<'_>,
        menu: Option<&MenuState>,
        selector: Option<&SelectorState>,
    ) -> io::Result<()> {
        let (cols, rows) = Self::size()?;
        let mut stdout = io::stdout().lock();

        queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        queue!(stdout, SetAttribute(Attribute::Reverse))?;
        write!(stdout, "{}", pad(screen.title, cols as usize))?;
        queue!(stdout, SetAttribute(Attribute::Reset), MoveTo(0, 1))?;
        write!(stdout, "{}", clip(screen.status, cols as usize))?;

        let log_rows = rows.saturating_sub(3) as usize;
        let start = screen.log.len().saturating_sub(log_rows);
        for (i, line) in screen.log[start..].iter().enumerate() {
            queue!(stdout, MoveTo(0, 3 + i as u16))?;
            write!(stdout, "{}", clip(line, cols as usize))?;
        }

        if let Some(menu) = menu.filter(|m| m.visible) {
            Self::render_menu(&mut stdout, menu)?;
        }
        if let Some(selector) = selector.filter(|s| s.visible) {
            Self::render_selector(&mut stdout, selector, cols, rows)?;
        }

        stdout.flush()
    }

    fn render_menu<W: Write>(out: &mut W, menu: &MenuState) -> io::Result<()> {
        let width = menu.content_width() as usize;
        let (x, y) = (menu.x, menu.y);

        queue!(out, MoveTo(x, y))?;
        write!(out, "┌{}┐", "─".repeat(width))?;

        for (i, item) in menu.items.iter().enumerate() {
            queue!(out, MoveTo(x, y + 1 + i as u16))?;
            write!(out, "│")?;
            if i == menu.selected {
                queue!(out, SetAttribute(Attribute::Reverse))?;
            }
            let shortcut = item
                .shortcut
                .map(|key| format!(" ({})", key as char))
                .unwrap_or_default();
            write!(out, "{}", pad(&format!(" {}{}", item.label, shortcut), width))?;
            queue!(out, SetAttribute(Attribute::Reset))?;
            write!(out, "│")?;
        }

        queue!(out, MoveTo(x, y + 1 + menu.items.len() as u16))?;
        write!(out, "└{}┘", "─".repeat(width))?;
        Ok(())
    }

    fn render_selector<W: Write>(out: &mut W, selector: &SelectorState, cols: u16, rows: u16) -> io::Result<()> {
        let width = (cols as usize).saturating_sub(4).min(60);
        let height = selector.max_visible as u16 + 3;
        let x = (cols.saturating_sub(width as u16 + 2)) / 2;
        let y = (rows.saturating_sub(height)) / 2;

        queue!(out, MoveTo(x, y))?;
        write!(out, "┌{}┐", "─".repeat(width))?;
        queue!(out, MoveTo(x, y + 1))?;
        write!(out, "│{}│", pad(&format!(" > {}", selector.query), width))?;

        let items = selector.visible_items();
        for row in 0..selector.max_visible {
            queue!(out, MoveTo(x, y + 2 + row as u16))?;
            write!(out, "│")?;
            match items.get(row) {
                Some((index, entry, selected)) => {
                    if *selected {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    let pickable = selector.query.is_empty() && selector.scroll_offset == 0;
                    let number = if pickable && *index < 9 {
                        format!("{}", index + 1)
                    } else {
                        " ".to_string()
                    };
                    write!(out, "{}", pad(&format!(" {} {}", number, entry), width))?;
                    queue!(out, SetAttribute(Attribute::Reset))?;
                }
                None => write!(out, "{}", pad("", width))?,
            }
            write!(out, "│")?;
        }

        queue!(out, MoveTo(x, y + 2 + selector.max_visible as u16))?;
        write!(out, "└{}┘", "─".repeat(width))?;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Truncate `text` to at most `width` display columns
fn clip(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Clip and right-pad `text` to exactly `width` display columns
fn pad(text: &str, width: usize) -> String {
    let clipped = clip(text, width);
    let fill = width.saturating_sub(clipped.width());
    format!("{}{:fill$}", clipped, "", fill = fill)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_and_clip_use_display_width() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(clip("abcdef", 3), "abc");
        // Wide characters take two columns
        assert_eq!(clip("日本語", 5), "日本");
        assert_eq!(pad("日本語", 5), "日本 ");
    }
}
