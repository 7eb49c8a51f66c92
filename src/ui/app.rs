use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info};
use tui_widgets::popup::PopupState;

use crate::config::{Config, TopBarAction, TopBarButton, UiColors};
use crate::contact::Contact;
use crate::store::{ContactStore, StoreError};
use crate::validate;

use super::draw;
use super::form::{ContactForm, FormField, PendingEdit};

/// Which widget receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(FormField),
    List,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Field(field) => field.next().map(Focus::Field).unwrap_or(Focus::List),
            Focus::List => Focus::Field(FormField::Name),
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Field(field) => field.prev().map(Focus::Field).unwrap_or(Focus::List),
            Focus::List => Focus::Field(FormField::Dob),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Warning { title: String, message: String },
    Details { contact: Contact },
}

impl Modal {
    fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Modal::Warning {
            title: title.into(),
            message: message.into(),
        }
    }
}

const INPUT_ERROR_TITLE: &str = "Input Error";
const SELECTION_ERROR_TITLE: &str = "Selection Error";

pub struct App<'a> {
    store: &'a mut ContactStore,
    config: &'a Config,
    pub form: ContactForm,
    pub focus: Focus,
    pub selected: Option<usize>,
    pending_edit: Option<PendingEdit>,
    pub modal: Option<Modal>,
    pub modal_popup: PopupState,
    pub status: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(store: &'a mut ContactStore, config: &'a Config) -> Self {
        Self {
            store,
            config,
            form: ContactForm::default(),
            focus: Focus::Field(FormField::Name),
            selected: None,
            pending_edit: None,
            modal: None,
            modal_popup: PopupState::default(),
            status: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        let teardown = restore_terminal(&mut terminal);
        self.finish(result, teardown)
    }

    /// Put back any unfinished edit, then surface the first error from the
    /// loop, the terminal teardown, or the restore itself.
    fn finish(&mut self, result: Result<()>, teardown: Result<()>) -> Result<()> {
        let restored = self.restore_pending_edit();
        result?;
        teardown?;
        restored
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn store(&self) -> &ContactStore {
        self.store
    }

    pub fn state(&self) -> FormState {
        if self.pending_edit.is_some() {
            FormState::Editing
        } else {
            FormState::Idle
        }
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.pending_edit.as_ref()
    }

    /// Names shown in the list, in store order.
    pub fn list_names(&self) -> Vec<String> {
        self.store.names()
    }

    /// Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }

        if self.modal.is_some() {
            if key_matches_any(&key, &self.config.keys.modal.dismiss) {
                self.close_modal();
            }
            return Ok(false);
        }

        if let Some(action) = self.top_bar_action_for_key(&key) {
            self.perform_action(action)?;
            return Ok(false);
        }

        let global = &self.config.keys.global;
        if key_matches_any(&key, &global.quit) {
            return Ok(true);
        }
        if key_matches_any(&key, &global.next_focus) {
            self.focus = self.focus.next();
            return Ok(false);
        }
        if key_matches_any(&key, &global.prev_focus) {
            self.focus = self.focus.prev();
            return Ok(false);
        }

        match self.focus {
            Focus::Field(field) => {
                self.handle_form_key(field, key)?;
                Ok(false)
            }
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_form_key(&mut self, field: FormField, key: KeyEvent) -> Result<()> {
        let form_keys = &self.config.keys.form;

        if key_matches_any(&key, &form_keys.submit) {
            return self.add_contact();
        }

        if key_matches_any(&key, &form_keys.cancel_edit) {
            return self.cancel_edit();
        }

        self.form.handle_key_event(field, key);
        Ok(())
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Result<bool> {
        let list = &self.config.keys.list;

        if key_matches_any(&key, &list.quit) {
            return Ok(true);
        }
        if key_matches_any(&key, &list.next) {
            self.move_selection(1);
        } else if key_matches_any(&key, &list.prev) {
            self.move_selection(-1);
        } else if key_matches_any(&key, &list.view) {
            self.view_contact();
        } else if key_matches_any(&key, &list.edit) {
            self.edit_contact()?;
        } else if key_matches_any(&key, &list.delete) {
            self.delete_contact()?;
        } else if key_matches_any(&key, &list.clear) {
            self.selected = None;
        }
        Ok(false)
    }

    pub fn perform_action(&mut self, action: TopBarAction) -> Result<()> {
        debug!(?action, "button pressed");
        match action {
            TopBarAction::Add => self.add_contact(),
            TopBarAction::View => {
                self.view_contact();
                Ok(())
            }
            TopBarAction::Edit => self.edit_contact(),
            TopBarAction::Delete => self.delete_contact(),
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Validate the form and append it to the store.
    pub fn add_contact(&mut self) -> Result<()> {
        let contact = self.form.to_contact();
        if let Err(err) = validate::validate(&contact) {
            debug!(%err, "rejected contact");
            self.modal = Some(Modal::warning(INPUT_ERROR_TITLE, err.to_string()));
            return Ok(());
        }

        let name = contact.name.clone();
        self.store.append(contact)?;
        self.pending_edit = None;
        self.form.clear();
        self.selected = None;
        self.set_status(format!("Added {}", name));
        Ok(())
    }

    pub fn view_contact(&mut self) {
        match self.selected.and_then(|index| self.store.get(index)) {
            Some(contact) => {
                self.modal = Some(Modal::Details {
                    contact: contact.clone(),
                });
            }
            None => self.selection_error("view"),
        }
    }

    /// Move the selected record into the form, taking it out of the store.
    pub fn edit_contact(&mut self) -> Result<()> {
        if self.pending_edit.is_some() {
            self.modal = Some(Modal::warning(
                "Edit In Progress",
                "Add the contact being edited, or cancel the edit, first.",
            ));
            return Ok(());
        }

        let index = self.selected;
        let contact = match self.store.remove_at(index) {
            Ok(contact) => contact,
            Err(err) if err.is_selection() => {
                self.selection_error("edit");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.form.populate(&contact);
        self.set_status(format!("Editing {}", contact.name));
        self.pending_edit = index.map(|index| PendingEdit { contact, index });
        self.focus = Focus::Field(FormField::Name);
        self.selected = None;
        Ok(())
    }

    /// Remove the selected record. A pending edit is put back before the
    /// form is cleared.
    pub fn delete_contact(&mut self) -> Result<()> {
        let Some(removed_index) = self.selected else {
            self.selection_error("delete");
            return Ok(());
        };
        let removed = match self.store.remove_at(Some(removed_index)) {
            Ok(contact) => contact,
            Err(err) if err.is_selection() => {
                self.selection_error("delete");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(pending) = self.pending_edit.as_mut() {
            if pending.index > removed_index {
                pending.index -= 1;
            }
        }
        self.restore_inner()?;
        self.form.clear();
        self.selected = None;
        self.set_status(format!("Deleted {}", removed.name));
        Ok(())
    }

    /// Put a pending edit back where it came from and clear the form.
    pub fn cancel_edit(&mut self) -> Result<()> {
        let Some(index) = self.restore_inner()? else {
            self.set_status("No edit to cancel");
            return Ok(());
        };
        self.form.clear();
        self.selected = None;
        debug!(index, "edit cancelled");
        self.set_status("Edit cancelled");
        Ok(())
    }

    /// Called on exit so a record taken out by Edit is not lost.
    pub fn restore_pending_edit(&mut self) -> Result<()> {
        if let Some(index) = self.restore_inner()? {
            info!(index, "restored unfinished edit on exit");
        }
        Ok(())
    }

    fn restore_inner(&mut self) -> Result<Option<usize>, StoreError> {
        let Some(pending) = self.pending_edit.take() else {
            return Ok(None);
        };
        self.store.insert_at(pending.index, pending.contact).map(Some)
    }

    fn selection_error(&mut self, verb: &str) {
        self.modal = Some(Modal::warning(
            SELECTION_ERROR_TITLE,
            format!("Please select a contact to {}.", verb),
        ));
    }

    fn close_modal(&mut self) {
        self.modal = None;
        self.modal_popup = PopupState::default();
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.store.len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let next = match self.selected {
            Some(current) => current.saturating_add_signed(delta).min(len - 1),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.selected = Some(next);
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn top_bar_buttons(&self) -> &[TopBarButton] {
        &self.config.top_bar.buttons
    }

    // =========================================================================
    // Top Bar Actions
    // =========================================================================

    /// Check if a key event matches a top bar button and return its action
    fn top_bar_action_for_key(&self, key: &KeyEvent) -> Option<TopBarAction> {
        self.config
            .top_bar
            .buttons
            .iter()
            .find(|button| key_matches_function_key(key, button))
            .map(|button| button.action)
    }
}

/// Leave raw mode and the alternate screen. Every step runs even when an
/// earlier one fails; the first error is returned.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let raw = disable_raw_mode();
    let screen = terminal.backend_mut().execute(LeaveAlternateScreen).map(|_| ());
    let cursor = terminal.show_cursor();
    raw?;
    screen?;
    cursor?;
    Ok(())
}

fn key_matches_function_key(event: &KeyEvent, button: &TopBarButton) -> bool {
    match (button.function_key_number(), event.code) {
        (Some(n), KeyCode::F(pressed)) => n == pressed,
        _ => false,
    }
}

/// Check if the key event matches any of the bindings in the list
pub fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
pub fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        // Special keys
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "delete" | "del" => matches!(event.code, KeyCode::Delete),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        // Arrow keys
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        // Page navigation
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        lower => {
            if let Some(n) = lower
                .strip_prefix('f')
                .and_then(|digits| digits.parse::<u8>().ok())
            {
                return matches!(event.code, KeyCode::F(pressed) if pressed == n);
            }
            // Single character - case-sensitive (m != M, since M requires Shift)
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn john() -> Contact {
        Contact::new("John", "a@gmail.com", "Mike", "1234567890", "15/06/1990")
    }

    fn jane() -> Contact {
        Contact::new("Jane", "j@gmail.com", "Paul", "0987654321", "01/01/1985")
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(!app.handle_key(press(KeyCode::Char(c))).unwrap());
        }
    }

    fn fill_form(app: &mut App, contact: &Contact) {
        app.form.populate(contact);
    }

    fn setup() -> (TempDir, ContactStore, Config) {
        let dir = TempDir::new().unwrap();
        let store = ContactStore::open(dir.path().join("contacts.txt")).unwrap();
        (dir, store, Config::default())
    }

    fn warning_title(app: &App) -> Option<String> {
        match &app.modal {
            Some(Modal::Warning { title, .. }) => Some(title.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_scenario_add_valid_contact() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);

        fill_form(&mut app, &john());
        app.add_contact().unwrap();

        assert!(app.modal.is_none());
        assert_eq!(app.list_names(), vec!["John".to_string()]);
        assert!(app.form.is_empty());
        assert_eq!(app.state(), FormState::Idle);
        assert_eq!(app.selected, None);
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn test_delete_right_after_add_needs_a_selection() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);

        fill_form(&mut app, &john());
        app.add_contact().unwrap();
        app.delete_contact().unwrap();

        assert_eq!(warning_title(&app).as_deref(), Some("Selection Error"));
        assert_eq!(app.store().contacts(), &[john()]);
    }

    #[test]
    fn test_startup_has_no_selection() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        let mut app = App::new(&mut store, &config);
        assert_eq!(app.selected, None);

        app.handle_key(press(KeyCode::F(5))).unwrap();
        assert_eq!(
            app.modal,
            Some(Modal::Warning {
                title: "Selection Error".to_string(),
                message: "Please select a contact to delete.".to_string(),
            })
        );
        assert_eq!(app.store().contacts(), &[john()]);
    }

    #[test]
    fn test_scenario_reject_short_phone() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);

        let mut contact = john();
        contact.phone = "123".to_string();
        fill_form(&mut app, &contact);
        app.add_contact().unwrap();

        assert_eq!(
            app.modal,
            Some(Modal::Warning {
                title: "Input Error".to_string(),
                message: "Phone number should be a 10-digit number.".to_string(),
            })
        );
        assert!(app.list_names().is_empty());
        assert!(!app.store().path().exists());
        // Input is kept for correction.
        assert_eq!(app.form.to_contact(), contact);
    }

    #[test]
    fn test_rejections_leave_store_unchanged() {
        let (_dir, mut store, config) = setup();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);

        let bad = [
            Contact::new("J0hn", "a@gmail.com", "Mike", "1234567890", "15/06/1990"),
            Contact::new("John", "a@gmail.com", "M!ke", "1234567890", "15/06/1990"),
            Contact::new("John", "a@yahoo.com", "Mike", "1234567890", "15/06/1990"),
            Contact::new("John", "a@gmail.com", "Mike", "12345678901", "15/06/1990"),
            Contact::new("John", "a@gmail.com", "Mike", "1234567890", "15/13/1990"),
        ];
        for contact in &bad {
            fill_form(&mut app, contact);
            app.add_contact().unwrap();
            assert_eq!(warning_title(&app).as_deref(), Some("Input Error"));
            app.close_modal();
            assert_eq!(app.store().contacts(), &[jane()]);
        }
    }

    #[test]
    fn test_scenario_delete_first_of_two() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);
        fill_form(&mut app, &john());
        app.add_contact().unwrap();
        fill_form(&mut app, &jane());
        app.add_contact().unwrap();

        app.selected = Some(0);
        app.delete_contact().unwrap();

        assert_eq!(app.store().contacts(), &[jane()]);
        assert_eq!(app.selected, None);
        let raw = fs::read_to_string(app.store().path()).unwrap();
        assert_eq!(raw, format!("{}\n", jane().to_line()));
    }

    #[test]
    fn test_scenario_edit_then_resubmit() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.selected = Some(0);
        app.edit_contact().unwrap();

        assert_eq!(app.form.to_contact(), john());
        assert_eq!(app.store().contacts(), &[jane()]);
        assert_eq!(app.state(), FormState::Editing);
        assert_eq!(
            app.pending_edit(),
            Some(&PendingEdit { contact: john(), index: 0 })
        );
        // The removal is already on disk.
        let raw = fs::read_to_string(app.store().path()).unwrap();
        assert_eq!(raw, format!("{}\n", jane().to_line()));

        app.add_contact().unwrap();
        assert_eq!(app.store().contacts(), &[jane(), john()]);
        assert_eq!(app.state(), FormState::Idle);
    }

    #[test]
    fn test_cancel_edit_restores_original_position() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.selected = Some(0);
        app.edit_contact().unwrap();
        app.handle_key(press(KeyCode::Esc)).unwrap();

        assert_eq!(app.store().contacts(), &[john(), jane()]);
        assert_eq!(app.state(), FormState::Idle);
        assert!(app.form.is_empty());
        assert_eq!(app.selected, None);
    }

    #[test]
    fn test_rejected_add_while_editing_keeps_edit() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.selected = Some(0);
        app.edit_contact().unwrap();
        app.form.set(FormField::Phone, "12ab");
        app.add_contact().unwrap();

        assert_eq!(warning_title(&app).as_deref(), Some("Input Error"));
        assert_eq!(app.state(), FormState::Editing);
        assert_eq!(
            app.pending_edit(),
            Some(&PendingEdit { contact: john(), index: 0 })
        );
        assert_eq!(app.store().contacts(), &[jane()]);
        assert_eq!(app.form.value(FormField::Phone), "12ab");

        app.handle_key(press(KeyCode::Esc)).unwrap();
        app.handle_key(press(KeyCode::Esc)).unwrap();
        assert_eq!(app.store().contacts(), &[john(), jane()]);
        assert_eq!(app.state(), FormState::Idle);
    }

    #[test]
    fn test_delete_while_editing_puts_edited_record_back() {
        let (dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let ali = Contact::new("Ali", "x@gmail.com", "Omar", "5555555555", "31/12/2000");
        store.append(ali.clone()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.selected = Some(2);
        app.edit_contact().unwrap();
        app.selected = Some(0);
        app.delete_contact().unwrap();

        assert_eq!(app.state(), FormState::Idle);
        assert!(app.form.is_empty());
        assert_eq!(app.store().contacts(), &[jane(), ali.clone()]);
        let reloaded = ContactStore::open(dir.path().join("contacts.txt")).unwrap();
        assert_eq!(reloaded.contacts(), &[jane(), ali]);
    }

    #[test]
    fn test_quit_during_edit_restores_record() {
        let (dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        {
            let mut app = App::new(&mut store, &config);
            app.selected = Some(1);
            app.edit_contact().unwrap();
            assert_eq!(app.store().len(), 1);

            let quit = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
            assert!(app.handle_key(quit).unwrap());
            app.restore_pending_edit().unwrap();
        }

        let reloaded = ContactStore::open(dir.path().join("contacts.txt")).unwrap();
        assert_eq!(reloaded.contacts(), &[john(), jane()]);
    }

    #[test]
    fn test_loop_error_still_restores_edit() {
        let (dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        {
            let mut app = App::new(&mut store, &config);
            app.selected = Some(0);
            app.edit_contact().unwrap();

            let err = app
                .finish(Err(anyhow::anyhow!("poll failed")), Ok(()))
                .unwrap_err();
            assert_eq!(err.to_string(), "poll failed");
            assert_eq!(app.state(), FormState::Idle);
        }

        let reloaded = ContactStore::open(dir.path().join("contacts.txt")).unwrap();
        assert_eq!(reloaded.contacts(), &[john(), jane()]);
    }

    #[test]
    fn test_no_selection_actions_warn() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        let mut app = App::new(&mut store, &config);
        app.selected = None;
        fill_form(&mut app, &jane());

        for (verb, action) in [
            ("view", TopBarAction::View),
            ("edit", TopBarAction::Edit),
            ("delete", TopBarAction::Delete),
        ] {
            app.perform_action(action).unwrap();
            assert_eq!(
                app.modal,
                Some(Modal::Warning {
                    title: "Selection Error".to_string(),
                    message: format!("Please select a contact to {}.", verb),
                })
            );
            app.close_modal();
            assert_eq!(app.store().contacts(), &[john()]);
            assert_eq!(app.form.to_contact(), jane());
        }
    }

    #[test]
    fn test_view_shows_details() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.focus = Focus::List;
        app.handle_key(press(KeyCode::Char('j'))).unwrap();
        app.handle_key(press(KeyCode::Enter)).unwrap();
        assert_eq!(app.modal, Some(Modal::Details { contact: john() }));

        // Other keys are swallowed while a modal is open.
        app.handle_key(press(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.store().len(), 1);

        app.handle_key(press(KeyCode::Esc)).unwrap();
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_edit_while_editing_is_refused() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.selected = Some(0);
        app.edit_contact().unwrap();
        app.selected = Some(0);
        app.edit_contact().unwrap();

        assert_eq!(warning_title(&app).as_deref(), Some("Edit In Progress"));
        assert_eq!(app.store().contacts(), &[jane()]);
        assert_eq!(app.form.to_contact(), john());
    }

    #[test]
    fn test_typing_and_submitting_through_keys() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);

        type_text(&mut app, "John");
        app.handle_key(press(KeyCode::Tab)).unwrap();
        type_text(&mut app, "a@gmail.com");
        app.handle_key(press(KeyCode::Tab)).unwrap();
        type_text(&mut app, "Mike");
        app.handle_key(press(KeyCode::Tab)).unwrap();
        type_text(&mut app, "1234567890");
        app.handle_key(press(KeyCode::Tab)).unwrap();
        type_text(&mut app, "15/06/1990");
        assert_eq!(app.focus, Focus::Field(FormField::Dob));

        app.handle_key(press(KeyCode::Enter)).unwrap();
        assert_eq!(app.store().contacts(), &[john()]);
    }

    #[test]
    fn test_q_types_in_form_but_quits_from_list() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);

        assert!(!app.handle_key(press(KeyCode::Char('q'))).unwrap());
        assert_eq!(app.form.value(FormField::Name), "q");

        app.handle_key(press(KeyCode::BackTab)).unwrap();
        assert_eq!(app.focus, Focus::List);
        assert!(app.handle_key(press(KeyCode::Char('q'))).unwrap());
    }

    #[test]
    fn test_function_keys_trigger_buttons() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);

        app.selected = Some(1);
        app.handle_key(press(KeyCode::F(5))).unwrap();
        assert_eq!(app.store().contacts(), &[john()]);
        assert_eq!(app.status.as_deref(), Some("Deleted Jane"));
        assert_eq!(app.selected, None);

        app.selected = Some(0);
        app.handle_key(press(KeyCode::F(4))).unwrap();
        assert!(app.store().is_empty());
        assert_eq!(app.selected, None);
        assert_eq!(app.state(), FormState::Editing);

        app.handle_key(press(KeyCode::F(2))).unwrap();
        assert_eq!(app.store().contacts(), &[john()]);
    }

    #[test]
    fn test_list_navigation() {
        let (_dir, mut store, config) = setup();
        store.append(john()).unwrap();
        store.append(jane()).unwrap();
        let mut app = App::new(&mut store, &config);
        app.focus = Focus::List;
        assert_eq!(app.selected, None);

        app.handle_key(press(KeyCode::Char('j'))).unwrap();
        assert_eq!(app.selected, Some(0));
        app.handle_key(press(KeyCode::Char('j'))).unwrap();
        assert_eq!(app.selected, Some(1));
        app.handle_key(press(KeyCode::Down)).unwrap();
        assert_eq!(app.selected, Some(1));
        app.handle_key(press(KeyCode::Char('k'))).unwrap();
        assert_eq!(app.selected, Some(0));
        app.handle_key(press(KeyCode::Up)).unwrap();
        assert_eq!(app.selected, Some(0));

        app.handle_key(press(KeyCode::Esc)).unwrap();
        assert_eq!(app.selected, None);
        app.handle_key(press(KeyCode::Char('k'))).unwrap();
        assert_eq!(app.selected, Some(1));
    }

    #[test]
    fn test_focus_cycles_through_fields_and_list() {
        let (_dir, mut store, config) = setup();
        let mut app = App::new(&mut store, &config);

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(app.focus);
            app.handle_key(press(KeyCode::Tab)).unwrap();
        }
        assert_eq!(seen[5], Focus::List);
        assert_eq!(app.focus, Focus::Field(FormField::Name));
    }

    #[test]
    fn test_key_matches_single() {
        assert!(key_matches_single(&press(KeyCode::Enter), "ENTER"));
        assert!(key_matches_single(&press(KeyCode::Esc), "Esc"));
        assert!(key_matches_single(&press(KeyCode::F(7)), "F7"));
        assert!(key_matches_single(&press(KeyCode::Delete), "Delete"));
        assert!(key_matches_single(&press(KeyCode::Char('m')), "m"));
        assert!(!key_matches_single(&press(KeyCode::Char('m')), "M"));
        assert!(!key_matches_single(&press(KeyCode::Char('f')), "fx"));
        let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert!(!key_matches_single(&ctrl_x, "x"));
    }
}
