//! Task add/edit form state.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use reminder_core::dates::parse_date_key;
use reminder_core::{Recurrence, Slot, SlotFlags, Task, TaskDraft, TaskId};

/// Focused form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Slots,
    Repeat,
    StartDate,
    EndDate,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Name,
        FormField::Slots,
        FormField::Repeat,
        FormField::StartDate,
        FormField::EndDate,
    ];

    fn step(self, delta: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(index + delta).rem_euclid(len) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "이름",
            FormField::Slots => "시간대",
            FormField::Repeat => "주기",
            FormField::StartDate => "시작일",
            FormField::EndDate => "종료일",
        }
    }
}

/// What a key press did to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Keep editing.
    Continue,
    /// Close without saving.
    Cancel,
    /// Save the draft.
    Submit(TaskDraft),
}

/// Editing state for one task.
#[derive(Debug, Clone)]
pub struct TaskForm {
    /// Task being edited, `None` when adding.
    pub task_id: Option<TaskId>,
    pub name: String,
    pub times: SlotFlags,
    pub recurrence: Recurrence,
    pub start_input: String,
    pub end_input: String,
    pub focus: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    /// Empty form for a new task starting `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            task_id: None,
            name: String::new(),
            times: SlotFlags::of(&[Slot::Morning]),
            recurrence: Recurrence::Daily,
            start_input: today.to_string(),
            end_input: String::new(),
            focus: FormField::Name,
            error: None,
        }
    }

    /// Form prefilled from `task`.
    pub fn edit(task: &Task) -> Self {
        let draft = TaskDraft::from_task(task);
        Self {
            task_id: Some(task.id.clone()),
            name: draft.name,
            times: draft.times,
            recurrence: draft.recurrence,
            start_input: draft.start_date.to_string(),
            end_input: draft.end_date.map(|d| d.to_string()).unwrap_or_default(),
            focus: FormField::Name,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.task_id.is_some() {
            "할 일 수정"
        } else {
            "할 일 추가"
        }
    }

    /// Text currently being typed into, if the focused field takes text.
    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::StartDate => Some(&mut self.start_input),
            FormField::EndDate => Some(&mut self.end_input),
            FormField::Slots | FormField::Repeat => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return self.submit(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.step(1),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.step(-1),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => self.handle_char(c),
            _ => {}
        }
        FormAction::Continue
    }

    fn handle_char(&mut self, c: char) {
        match self.focus {
            FormField::Slots => match c {
                '1' => {
                    self.times.toggle(Slot::Morning);
                }
                '2' => {
                    self.times.toggle(Slot::Noon);
                }
                '3' => {
                    self.times.toggle(Slot::Evening);
                }
                _ => {}
            },
            FormField::Repeat => match c {
                'd' => self.recurrence = Recurrence::Daily,
                'w' if !self.recurrence.is_weekly() => {
                    self.recurrence = Recurrence::Weekly { days: Vec::new() };
                }
                '0'..='6' => {
                    if let Some(day) = c.to_digit(10) {
                        self.recurrence.toggle_weekday(day as u8);
                    }
                }
                _ => {}
            },
            _ => {
                if let Some(text) = self.text_mut() {
                    text.push(c);
                }
            }
        }
    }

    fn submit(&mut self) -> FormAction {
        match self.draft() {
            Ok(draft) => match draft.validate() {
                Ok(()) => FormAction::Submit(draft),
                Err(e) => {
                    self.error = Some(e.user_message().to_string());
                    FormAction::Continue
                }
            },
            Err(message) => {
                self.error = Some(message);
                FormAction::Continue
            }
        }
    }

    /// Draft from the current inputs; date fields must parse.
    pub fn draft(&self) -> Result<TaskDraft, String> {
        let start = parse_date_key(&self.start_input)
            .ok_or_else(|| "시작일 형식이 올바르지 않습니다. (YYYY-MM-DD)".to_string())?;
        let mut draft = TaskDraft::new(self.name.clone(), self.times, start)
            .with_recurrence(self.recurrence.clone());
        if !self.end_input.trim().is_empty() {
            let end = parse_date_key(&self.end_input)
                .ok_or_else(|| "종료일 형식이 올바르지 않습니다. (YYYY-MM-DD)".to_string())?;
            draft = draft.with_end_date(end);
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut TaskForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_submit_daily_task() {
        let mut form = TaskForm::new(today());
        type_text(&mut form, "Vitamin");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "3");

        let FormAction::Submit(draft) = form.handle_key(key(KeyCode::Enter)) else {
            panic!("expected submit");
        };
        assert_eq!(draft.name, "Vitamin");
        assert_eq!(draft.times, SlotFlags::of(&[Slot::Morning, Slot::Evening]));
        assert_eq!(draft.start_date, today());
        assert_eq!(draft.recurrence, Recurrence::Daily);
    }

    #[test]
    fn test_validation_errors_stay_in_form() {
        let mut form = TaskForm::new(today());
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Continue);
        assert_eq!(form.error.as_deref(), Some("할 일을 입력해주세요."));

        type_text(&mut form, "Gym");
        form.focus = FormField::Repeat;
        type_text(&mut form, "w");
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Continue);
        assert_eq!(
            form.error.as_deref(),
            Some("주기를 선택해주세요. 매주 반복할 요일을 선택해주세요.")
        );

        type_text(&mut form, "15");
        let FormAction::Submit(draft) = form.handle_key(key(KeyCode::Enter)) else {
            panic!("expected submit");
        };
        assert_eq!(draft.recurrence, Recurrence::weekly([1, 5]));
    }

    #[test]
    fn test_bad_dates_are_reported() {
        let mut form = TaskForm::new(today());
        type_text(&mut form, "Walk");
        form.focus = FormField::EndDate;
        type_text(&mut form, "2024-13-01");
        form.handle_key(key(KeyCode::Enter));
        assert!(form.error.as_deref().unwrap().starts_with("종료일"));

        form.end_input = "2024-01-01".into();
        form.handle_key(key(KeyCode::Enter));
        assert_eq!(
            form.error.as_deref(),
            Some("기간이 올바르지 않습니다. 종료일이 시작일보다 빠릅니다.")
        );
    }

    #[test]
    fn test_edit_prefills_and_cycles_focus() {
        let task = Task::new("Read", SlotFlags::of(&[Slot::Noon]), today())
            .with_end_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let mut form = TaskForm::edit(&task);
        assert_eq!(form.title(), "할 일 수정");
        assert_eq!(form.end_input, "2024-02-01");

        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus, FormField::EndDate);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focus, FormField::Name);
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
    }
}
