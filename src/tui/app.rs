//! Application state for the TUI.

use std::time::{SystemTime, UNIX_EPOCH};

/// Who produced the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAuthor {
    /// Message typed by the local user.
    You,
    /// Message from the wire, tagged with its origin label.
    Peer(String),
    /// Locally evaluated cipher output.
    Crypto,
    /// System message (status, errors, etc).
    System,
}

/// A chat message with metadata.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Who produced the message.
    pub author: MessageAuthor,
    /// The message content.
    pub content: String,
    /// Unix timestamp when received/sent.
    pub timestamp: u64,
}

impl ChatMessage {
    /// Create a new chat message.
    pub fn new(author: MessageAuthor, content: String) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            author,
            content,
            timestamp,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::System, content.into())
    }

    /// Create a message from the local user.
    pub fn from_you(content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::You, content.into())
    }

    /// Create a message from the wire with its origin label.
    pub fn from_wire(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::Peer(label.into()), content.into())
    }

    /// Format the timestamp as HH:MM.
    pub fn formatted_time(&self) -> String {
        let secs = self.timestamp % 86400; // Seconds in day
        let hours = (secs / 3600) % 24;
        let minutes = (secs % 3600) / 60;
        format!("{:02}:{:02}", hours, minutes)
    }
}

/// Connection status for the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected.
    Disconnected,
    /// Connected and ready to chat.
    Connected,
    /// Connection dropped, attempting to come back.
    Reconnecting,
    /// Connection lost for good.
    Error(String),
}

impl ConnectionStatus {
    /// Get a display string for the status.
    pub fn display(&self) -> &str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Reconnecting => "Reconnecting...",
            ConnectionStatus::Error(_) => "Error",
        }
    }
}

/// Application state for the chat TUI.
pub struct App {
    /// The relay address shown in the header.
    pub relay_addr: String,
    /// Current input text.
    pub input: String,
    /// Cursor position in the input.
    pub cursor_position: usize,
    /// Chat message history.
    pub messages: Vec<ChatMessage>,
    /// Current connection status.
    pub status: ConnectionStatus,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Scroll offset for message history (0 = bottom).
    pub scroll_offset: usize,
    /// Messages sent count.
    pub messages_sent: u32,
    /// Messages received count.
    pub messages_received: u32,
    /// Maximum message length in characters.
    pub max_message_len: usize,
}

/// Default maximum message length.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 512;

impl App {
    /// Create a new App instance with default max message length.
    pub fn new(relay_addr: impl Into<String>) -> Self {
        Self::with_max_len(relay_addr, DEFAULT_MAX_MESSAGE_LEN)
    }

    /// Create a new App instance with custom max message length.
    pub fn with_max_len(relay_addr: impl Into<String>, max_message_len: usize) -> Self {
        Self {
            relay_addr: relay_addr.into(),
            input: String::new(),
            cursor_position: 0,
            messages: Vec::new(),
            status: ConnectionStatus::Disconnected,
            should_quit: false,
            scroll_offset: 0,
            messages_sent: 0,
            messages_received: 0,
            max_message_len,
        }
    }

    /// Get remaining characters available for input.
    pub fn remaining_chars(&self) -> usize {
        self.max_message_len.saturating_sub(self.input.chars().count())
    }

    /// Check if input is at max length.
    pub fn is_input_at_max(&self) -> bool {
        self.input.chars().count() >= self.max_message_len
    }

    /// Add a system message.
    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::system(content));
        self.scroll_to_bottom();
    }

    /// Add a message from the local user.
    pub fn add_my_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::from_you(content));
        self.messages_sent += 1;
        self.scroll_to_bottom();
    }

    /// Add a message from the wire under its origin label.
    pub fn add_wire_message(&mut self, label: impl Into<String>, content: impl Into<String>) {
        self.messages.push(ChatMessage::from_wire(label, content));
        self.messages_received += 1;
        self.scroll_to_bottom();
    }

    /// Add a line of locally evaluated cipher output.
    pub fn add_crypto_message(&mut self, content: impl Into<String>) {
        self.messages
            .push(ChatMessage::new(MessageAuthor::Crypto, content.into()));
        self.scroll_to_bottom();
    }

    /// Set the connection status.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_left);
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_right);
    }

    /// Insert a character at cursor position (respects max length).
    pub fn enter_char(&mut self, c: char) {
        // Don't insert if at max length
        if self.is_input_at_max() {
            return;
        }
        let index = self.byte_index();
        self.input.insert(index, c);
        self.move_cursor_right();
    }

    /// Delete character before cursor.
    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }

        let current_index = self.cursor_position;
        let from_left_to_current_index = current_index - 1;

        // Get byte positions
        let before_char_to_delete = self.input.chars().take(from_left_to_current_index);
        let after_char_to_delete = self.input.chars().skip(current_index);

        self.input = before_char_to_delete.chain(after_char_to_delete).collect();
        self.move_cursor_left();
    }

    /// Delete character after cursor.
    pub fn delete_char_forward(&mut self) {
        if self.cursor_position >= self.input.chars().count() {
            return;
        }

        let current_index = self.cursor_position;
        let before_char = self.input.chars().take(current_index);
        let after_char = self.input.chars().skip(current_index + 1);

        self.input = before_char.chain(after_char).collect();
    }

    /// Clamp cursor position to valid range.
    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.input.chars().count())
    }

    /// Get byte index for cursor position.
    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input.len())
    }

    /// Take the current input and clear it.
    pub fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    /// Scroll to the bottom of messages.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Scroll up by n lines.
    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
        // Clamp to max scroll
        let max_scroll = self.messages.len().saturating_sub(1);
        self.scroll_offset = self.scroll_offset.min(max_scroll);
    }

    /// Scroll down by n lines.
    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    /// Move cursor to start of input.
    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    /// Move cursor to end of input.
    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.input.chars().count();
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
