use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Submit, // Enter pressed
    Cancel, // Esc pressed
}

/// Single-line text input wrapping tui-textarea, used for dialog entries and path prompts.
pub struct TextInput {
    textarea: TextArea<'static>,
    value: String,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut input = Self {
            textarea: TextArea::default(),
            value: String::new(),
            focused: false,
        };
        input.apply_style();
        input
    }

    fn sync_from_textarea(&mut self) {
        self.value = self.textarea.lines().first().cloned().unwrap_or_default();
    }

    fn apply_style(&mut self) {
        let style = Style::default();
        self.textarea.set_style(style);
        // No underline on the cursor line
        self.textarea.set_cursor_line_style(Style::default());
        let cursor_style = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            // Same as the text style hides the cursor
            style
        };
        self.textarea.set_cursor_style(cursor_style);
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value.into());
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_style();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the content; the cursor moves to the end.
    pub fn set_value(&mut self, value: String) {
        let single_line = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![single_line]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
        self.sync_from_textarea();
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => TextInputEvent::Submit,
            KeyCode::Esc => TextInputEvent::Cancel,
            _ => {
                let input = key_event_to_input(event);
                if matches!(input.key, Key::Char('\n') | Key::Char('\r')) {
                    return TextInputEvent::None;
                }
                self.textarea.input(input);
                self.sync_from_textarea();
                TextInputEvent::None
            }
        }
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Esc,
        _ => Key::Null,
    };
    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let style = cell.style().remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_updates_value() {
        let mut input = TextInput::new();
        for c in "data.csv".chars() {
            assert_eq!(input.handle_key(&key(KeyCode::Char(c))), TextInputEvent::None);
        }
        assert_eq!(input.value(), "data.csv");
        input.handle_key(&key(KeyCode::Backspace));
        assert_eq!(input.value(), "data.cs");
    }

    #[test]
    fn test_enter_and_esc() {
        let mut input = TextInput::new().with_value("x");
        assert_eq!(input.handle_key(&key(KeyCode::Enter)), TextInputEvent::Submit);
        assert_eq!(input.handle_key(&key(KeyCode::Esc)), TextInputEvent::Cancel);
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn test_set_value_appends_at_end() {
        let mut input = TextInput::new();
        input.set_value("ab".to_string());
        input.handle_key(&key(KeyCode::Char('c')));
        assert_eq!(input.value(), "abc");
        input.clear();
        assert!(input.is_empty());
    }
}
