//! Application-scoped UI state.
//!
//! These are plain values owned by whoever drives the UI and passed to the
//! code that needs them. They are created at startup and dropped at exit.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light scheme.
    #[default]
    Light,
    /// Dark scheme.
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// The light/dark theme flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeState {
    dark: bool,
}

impl ThemeState {
    /// Create the state with an initial value.
    #[must_use]
    pub fn new(dark: bool) -> Self {
        Self { dark }
    }

    /// Check whether the dark theme is active.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.dark
    }

    /// The active theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        if self.dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Flip the theme and return the new dark flag.
    pub fn toggle(&mut self) -> bool {
        self.dark = !self.dark;
        self.dark
    }

    /// Set the theme explicitly.
    pub fn set(&mut self, dark: bool) {
        self.dark = dark;
    }
}

type Action = Box<dyn FnOnce() + Send>;

/// Title used when none is given.
pub const DEFAULT_CONFIRM_TITLE: &str = "Confirm";

/// A single pending confirmation request.
///
/// [`open`](Self::open) stores a message and the action to run on
/// confirmation. [`confirm`](Self::confirm) and [`cancel`](Self::cancel)
/// run the matching action, if any, and close the dialog either way.
#[derive(Default)]
pub struct ConfirmDialog {
    open: bool,
    title: String,
    message: String,
    on_confirm: Option<Action>,
    on_cancel: Option<Action>,
}

impl std::fmt::Debug for ConfirmDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmDialog")
            .field("open", &self.open)
            .field("title", &self.title)
            .field("message", &self.message)
            .field("on_confirm", &self.on_confirm.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

impl ConfirmDialog {
    /// Create a closed dialog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for confirmation. Replaces any request that is still open.
    pub fn open<F>(&mut self, message: impl Into<String>, on_confirm: F, title: Option<&str>)
    where
        F: FnOnce() + Send + 'static,
    {
        self.open = true;
        self.title = title.unwrap_or(DEFAULT_CONFIRM_TITLE).to_string();
        self.message = message.into();
        self.on_confirm = Some(Box::new(on_confirm));
        self.on_cancel = None;
    }

    /// Register an action to run if the open request is cancelled.
    pub fn on_cancel<F>(&mut self, on_cancel: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.open {
            self.on_cancel = Some(Box::new(on_cancel));
        }
    }

    /// Run the confirm action and close.
    pub fn confirm(&mut self) {
        if let Some(action) = self.on_confirm.take() {
            action();
        }
        self.close();
    }

    /// Run the cancel action and close.
    pub fn cancel(&mut self) {
        if let Some(action) = self.on_cancel.take() {
            action();
        }
        self.close();
    }

    /// Close without running anything.
    pub fn close(&mut self) {
        self.open = false;
        self.title.clear();
        self.message.clear();
        self.on_confirm = None;
        self.on_cancel = None;
    }

    /// Check whether a request is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Title of the open request.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Message of the open request.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Answer the open request from a terminal.
    ///
    /// Writes `title: message [y/N]` to `output` and reads one line from
    /// `input`. `y` or `yes` (any case) confirms; anything else, including
    /// end of input, cancels. Returns whether the request was confirmed.
    /// Does nothing and returns `false` when no request is open.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the prompt or reading the answer fails.
    /// The request stays open in that case.
    pub fn answer_from<R, W>(&mut self, mut input: R, mut output: W) -> Result<bool>
    where
        R: BufRead,
        W: Write,
    {
        if !self.open {
            return Ok(false);
        }

        write!(output, "{}: {} [y/N] ", self.title, self.message)?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;

        let confirmed = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
        if confirmed {
            self.confirm();
        } else {
            self.cancel();
        }
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_theme_toggle() {
        let mut theme = ThemeState::default();
        assert!(!theme.is_dark());
        assert_eq!(theme.theme(), Theme::Light);

        assert!(theme.toggle());
        assert_eq!(theme.theme(), Theme::Dark);
        assert!(!theme.toggle());
    }

    #[test]
    fn test_theme_set() {
        let mut theme = ThemeState::new(false);
        theme.set(true);
        assert!(theme.is_dark());
        assert_eq!(theme.theme().to_string(), "dark");
    }

    #[test]
    fn test_dialog_starts_closed() {
        let dialog = ConfirmDialog::new();
        assert!(!dialog.is_open());
        assert!(dialog.title().is_empty());
    }

    #[test]
    fn test_dialog_confirm_runs_action_and_closes() {
        let (count, action) = counter();
        let mut dialog = ConfirmDialog::new();

        dialog.open("Delete organization?", action, None);
        assert!(dialog.is_open());
        assert_eq!(dialog.title(), DEFAULT_CONFIRM_TITLE);
        assert_eq!(dialog.message(), "Delete organization?");

        dialog.confirm();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!dialog.is_open());
        assert!(dialog.message().is_empty());

        // nothing left to run
        dialog.confirm();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dialog_cancel_skips_confirm_action() {
        let (confirmed, on_confirm) = counter();
        let (cancelled, on_cancel) = counter();
        let mut dialog = ConfirmDialog::new();

        dialog.open("Delete audit?", on_confirm, Some("Delete"));
        assert_eq!(dialog.title(), "Delete");
        dialog.on_cancel(on_cancel);
        dialog.cancel();

        assert_eq!(confirmed.load(Ordering::SeqCst), 0);
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        assert!(!dialog.is_open());
    }

    #[test]
    fn test_dialog_reopen_replaces_request() {
        let (first, first_action) = counter();
        let (second, second_action) = counter();
        let mut dialog = ConfirmDialog::new();

        dialog.open("first", first_action, None);
        dialog.open("second", second_action, None);
        assert_eq!(dialog.message(), "second");
        dialog.confirm();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_cancel_ignored_when_closed() {
        let (cancelled, on_cancel) = counter();
        let mut dialog = ConfirmDialog::new();
        dialog.on_cancel(on_cancel);
        dialog.cancel();
        assert_eq!(cancelled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dialog_debug() {
        let mut dialog = ConfirmDialog::new();
        dialog.open("Sure?", || {}, None);
        let debug_str = format!("{dialog:?}");
        assert!(debug_str.contains("Sure?"));
        assert!(debug_str.contains("on_confirm: true"));
    }

    #[test]
    fn test_answer_yes_confirms() {
        let (confirmed, on_confirm) = counter();
        let mut dialog = ConfirmDialog::new();
        dialog.open("Delete organization #3?", on_confirm, Some("Delete"));

        let mut prompt = Vec::new();
        let answered = dialog.answer_from(&b"YES\n"[..], &mut prompt).unwrap();

        assert!(answered);
        assert_eq!(confirmed.load(Ordering::SeqCst), 1);
        assert_eq!(String::from_utf8(prompt).unwrap(), "Delete: Delete organization #3? [y/N] ");
        assert!(!dialog.is_open());
    }

    #[test]
    fn test_answer_other_or_eof_cancels() {
        for input in [&b"n\n"[..], &b"maybe\n"[..], &b""[..]] {
            let (confirmed, on_confirm) = counter();
            let (cancelled, on_cancel) = counter();
            let mut dialog = ConfirmDialog::new();
            dialog.open("Delete?", on_confirm, None);
            dialog.on_cancel(on_cancel);

            assert!(!dialog.answer_from(input, std::io::sink()).unwrap());
            assert_eq!(confirmed.load(Ordering::SeqCst), 0);
            assert_eq!(cancelled.load(Ordering::SeqCst), 1);
            assert!(!dialog.is_open());
        }
    }

    #[test]
    fn test_answer_without_open_request_reads_nothing() {
        let mut dialog = ConfirmDialog::new();
        let mut input = &b"y\n"[..];
        assert!(!dialog.answer_from(&mut input, std::io::sink()).unwrap());
        assert_eq!(input, b"y\n");
    }

    #[test]
    fn test_answer_write_failure_keeps_request_open() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let (confirmed, on_confirm) = counter();
        let mut dialog = ConfirmDialog::new();
        dialog.open("Delete?", on_confirm, None);

        let err = dialog.answer_from(&b"y\n"[..], Broken).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
        assert!(dialog.is_open());
        assert_eq!(confirmed.load(Ordering::SeqCst), 0);
    }
}
