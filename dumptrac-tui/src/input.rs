use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dumptrac_core::Command;

use crate::app::{App, Screen};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Hand the command to the service on a background task.
    Dispatch(Command),
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Tab, Up};

    // Global quit shortcut
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Dashboard => match key.code {
            Char('q') => return Action::Quit,
            Up | Char('k') => app.select_previous(),
            Down | Char('j') => app.select_next(),
            Char('r') => action = Action::Dispatch(Command::Refresh),
            Char('c') | Enter => {
                if let Some(command) = app.clear_selected() {
                    action = Action::Dispatch(command);
                }
            }
            Char('a') => action = Action::Dispatch(Command::ClearAll),
            Char('f') => {
                if app.focus_selected().is_none() {
                    app.set_status("Selected report has no map position", true);
                }
            }
            Char('+') => app.map.surface_mut().zoom_in(),
            Char('-') => app.map.surface_mut().zoom_out(),
            Char('n') | Tab => {
                app.screen = Screen::ReportForm;
                app.status = None;
            }
            _ => {}
        },

        Screen::ReportForm => match key.code {
            Tab | Down => app.form.focus = Some(app.form.focused().next()),
            BackTab | Up => app.form.focus = Some(app.form.focused().previous()),
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.form.field_mut().push(character);
                }
            }
            Backspace => {
                app.form.field_mut().pop();
            }
            Enter => match app.form.to_command() {
                Ok(command) => action = Action::Dispatch(command),
                Err(err) => app.set_status(err.to_string(), true),
            },
            Esc => {
                app.screen = Screen::Dashboard;
            }
            _ => {}
        },
    }
    action
}
