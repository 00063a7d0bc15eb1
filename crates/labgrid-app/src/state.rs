// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Table,
    Filters,
    Columns,
}

impl FocusPane {
    pub const ALL: [Self; 3] = [Self::Table, Self::Filters, Self::Columns];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Filters => "filters",
            Self::Columns => "columns",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub focus: FocusPane,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            focus: FocusPane::Table,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    NextFocus,
    PrevFocus,
    EnterEditMode,
    ExitToNav,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    FocusChanged(FocusPane),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextFocus => self.rotate_focus(1),
            AppCommand::PrevFocus => self.rotate_focus(-1),
            AppCommand::EnterEditMode => {
                self.mode = AppMode::Edit;
                self.focus = FocusPane::Table;
                vec![
                    AppEvent::ModeChanged(self.mode),
                    self.set_status("editing draft -- changes are not saved until you press s"),
                ]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }

    fn rotate_focus(&mut self, delta: isize) -> Vec<AppEvent> {
        if self.mode == AppMode::Edit {
            return Vec::new();
        }
        let panes = FocusPane::ALL;
        let current = panes
            .iter()
            .position(|pane| *pane == self.focus)
            .unwrap_or(0) as isize;
        let len = panes.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.focus = panes[next];
        vec![AppEvent::FocusChanged(self.focus)]
    }
}
