//! Application state for the TUI.

use std::collections::VecDeque;

use natter_sdk::{ConnectionState, StatusUpdate};

/// Maximum number of messages to keep in the scrollback.
const MAX_MESSAGES: usize = 1000;

/// A single line in the message pane.
#[derive(Debug, Clone)]
pub struct MessageLine {
    pub timestamp: String,
    pub text: String,
    pub is_system: bool,
}

pub struct App {
    pub messages: VecDeque<MessageLine>,
    /// Current input line.
    pub input: String,
    pub read_state: ConnectionState,
    pub write_state: ConnectionState,
    /// Authenticated nickname, once the handshake succeeds.
    pub nickname: Option<String>,
    /// Name from the settings, shown until authentication.
    pub display_name: String,
    /// Scroll offset from the bottom (0 = at bottom).
    pub scroll: u16,
    pub should_quit: bool,
}

impl App {
    pub fn new(display_name: &str) -> Self {
        let mut app = Self {
            messages: VecDeque::new(),
            input: String::new(),
            read_state: ConnectionState::Initiated,
            write_state: ConnectionState::Initiated,
            nickname: None,
            display_name: display_name.to_string(),
            scroll: 0,
            should_quit: false,
        };
        app.push_system("Welcome to natter. Press Esc to quit.");
        app
    }

    pub fn push_chat(&mut self, text: &str) {
        self.push(MessageLine {
            timestamp: now_str(),
            text: sanitize_text(text),
            is_system: false,
        });
    }

    pub fn push_system(&mut self, text: &str) {
        self.push(MessageLine {
            timestamp: now_str(),
            text: sanitize_text(text),
            is_system: true,
        });
    }

    fn push(&mut self, line: MessageLine) {
        self.messages.push_back(line);
        if self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
        // Auto-scroll to bottom when a new message arrives
        self.scroll = 0;
    }

    pub fn apply_status(&mut self, update: StatusUpdate) {
        match update {
            StatusUpdate::Read(state) => self.read_state = state,
            StatusUpdate::Write(state) => self.write_state = state,
            StatusUpdate::Nickname(account) => {
                self.push_system(&format!("Authorized as {}", account.nickname));
                self.nickname = Some(account.nickname);
            }
        }
    }

    /// Take and clear the input line.
    pub fn input_take(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

pub fn state_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Initiated => "initiated",
        ConnectionState::Established => "established",
        ConnectionState::Closed => "closed",
    }
}

fn now_str() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Strip terminal control characters (ESC sequences, C0/C1 controls)
/// so server-supplied text cannot mess up the display.
pub fn sanitize_text(s: &str) -> String {
    s.chars()
        .filter(|&c| c == '\t' || (c >= ' ' && c != '\x7f'))
        .collect()
}
