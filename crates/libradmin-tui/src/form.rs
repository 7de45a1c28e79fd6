//! Text form state shared by the login, signup, add-book, transaction and
//! report views.
//!
//! Focus walks the fields first and then the buttons. Keys are translated
//! into a `FormAction` the owning view acts on.

use crossterm::event::{KeyCode, KeyEvent};

/// Default maximum length for a text field.
/// 128 chars accommodates password managers and long titles.
pub const MAX_FIELD_LENGTH: usize = 128;

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
    pub hint: Option<&'static str>,
    pub max_len: usize,
}

impl Field {
    pub fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
            hint: None,
            max_len: MAX_FIELD_LENGTH,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::text(label)
        }
    }

    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Value as it should be drawn
    pub fn display_value(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// What a key press asked the owning view to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    /// Button `n` was activated (Enter on a field activates button 0)
    Activate(usize),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub buttons: Vec<&'static str>,
    pub focus: usize,
    pub editing: bool,
}

impl Form {
    pub fn new(fields: Vec<Field>, buttons: Vec<&'static str>) -> Self {
        Self {
            fields,
            buttons,
            focus: 0,
            editing: true,
        }
    }

    fn slots(&self) -> usize {
        self.fields.len() + self.buttons.len()
    }

    pub fn focus_next(&mut self) {
        if self.slots() > 0 {
            self.focus = (self.focus + 1) % self.slots();
        }
    }

    pub fn focus_prev(&mut self) {
        if self.slots() > 0 {
            self.focus = (self.focus + self.slots() - 1) % self.slots();
        }
    }

    pub fn focused_field(&self) -> Option<usize> {
        (self.focus < self.fields.len()).then_some(self.focus)
    }

    pub fn focused_button(&self) -> Option<usize> {
        self.focus.checked_sub(self.fields.len())
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
    }

    /// Append a character to the focused field if it fits
    pub fn insert_char(&mut self, c: char) {
        if let Some(i) = self.focused_field() {
            let field = &mut self.fields[i];
            if can_add_char(field.value.chars().count(), field.max_len, c) {
                field.value.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(i) = self.focused_field() {
            self.fields[i].value.pop();
        }
    }

    /// Empty every field and return focus to the first one
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
        self.editing = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => {
                self.focus_next();
                FormAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_prev();
                FormAction::None
            }
            KeyCode::Enter => FormAction::Activate(self.focused_button().unwrap_or(0)),
            KeyCode::Backspace => {
                self.backspace();
                FormAction::None
            }
            KeyCode::Char(c) => {
                self.insert_char(c);
                FormAction::None
            }
            _ => FormAction::None,
        }
    }
}

/// Check if a character should be accepted into a field of `max_len`
pub fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && !c.is_control()
}
