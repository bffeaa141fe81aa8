//! Turning request results into outlet events and console diagnostics.

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::exec::Outcome;
use crate::host::{Console, Outlets};

/// Longest console line the reporter emits, in characters.
pub const MAX_DIAGNOSTIC_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// Cut `message` to at most `max` characters, ending in `...` when cut.
pub fn truncate(message: &str, max: usize) -> Cow<'_, str> {
    if message.chars().count() <= max {
        return Cow::Borrowed(message);
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let end = message
        .char_indices()
        .nth(keep)
        .map_or(message.len(), |(index, _)| index);
    Cow::Owned(format!("{}{ELLIPSIS}", &message[..end]))
}

/// Reports on behalf of one script object.
pub struct Reporter<'a> {
    name: &'a str,
    debug: bool,
    outlets: &'a dyn Outlets,
    console: &'a dyn Console,
}

impl<'a> Reporter<'a> {
    pub fn new(name: &'a str, debug: bool, outlets: &'a dyn Outlets, console: &'a dyn Console) -> Self {
        Reporter {
            name,
            debug,
            outlets,
            console,
        }
    }

    /// Post to the console when the object's debug flag is on.
    pub fn log(&self, message: impl fmt::Display) {
        debug!(object = self.name, "{message}");
        if self.debug {
            let line = format!("[py {}]: {message}", self.name);
            self.console.post(&truncate(&line, MAX_DIAGNOSTIC_CHARS));
        }
    }

    /// Print a diagnostic without firing an outlet.
    pub fn error(&self, context: impl fmt::Display, err: &BridgeError) {
        warn!(object = self.name, %context, error = %err, "request failed");
        let line = format!("[py {}] <- ({context}): {err}", self.name);
        self.console.error(&truncate(&line, MAX_DIAGNOSTIC_CHARS));
    }

    /// Fire exactly one outlet for a finished request.
    pub fn finish(&self, context: impl fmt::Display, result: Result<Outcome, BridgeError>) {
        match result {
            Ok(Outcome::Value(atoms)) => {
                self.log(format_args!("{context} -> {} atom(s)", atoms.len()));
                self.outlets.value(&atoms);
            }
            Ok(Outcome::Success) => {
                self.log(format_args!("{context} -> ok"));
                self.outlets.success();
            }
            Err(err) => {
                self.error(&context, &err);
                self.outlets.failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Atom, AtomBuf};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl Outlets for Events {
        fn value(&self, atoms: &[Atom]) {
            self.0.lock().push(format!("value {}", crate::atom::atoms_to_text(atoms)));
        }

        fn success(&self) {
            self.0.lock().push("success".into());
        }

        fn failure(&self) {
            self.0.lock().push("failure".into());
        }
    }

    impl Console for Events {
        fn post(&self, message: &str) {
            self.0.lock().push(format!("post {message}"));
        }

        fn error(&self, message: &str) {
            self.0.lock().push(format!("error {message}"));
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        let wide = "é".repeat(600);
        let cut = truncate(&wide, MAX_DIAGNOSTIC_CHARS);
        assert_eq!(cut.chars().count(), MAX_DIAGNOSTIC_CHARS);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn each_result_fires_one_outlet() {
        let events = Events::default();
        let reporter = Reporter::new("obj", false, &events, &events);
        let mut atoms = AtomBuf::new();
        atoms.push(Atom::Int(3));
        reporter.finish("eval", Ok(Outcome::Value(atoms)));
        reporter.finish("exec", Ok(Outcome::Success));
        reporter.finish("call", Err(BridgeError::EngineUnavailable));
        assert_eq!(
            events.0.lock().clone(),
            vec![
                "value 3".to_string(),
                "success".to_string(),
                "error [py obj] <- (call): engine unavailable: start-up failed".to_string(),
                "failure".to_string(),
            ]
        );
    }

    #[test]
    fn debug_flag_gates_console_posts() {
        let events = Events::default();
        Reporter::new("quiet", false, &events, &events).log("hidden");
        Reporter::new("loud", true, &events, &events).log("shown");
        assert_eq!(events.0.lock().clone(), vec!["post [py loud]: shown".to_string()]);
    }

    #[test]
    fn long_diagnostics_are_bounded() {
        let events = Events::default();
        let reporter = Reporter::new("obj", false, &events, &events);
        reporter.error("eval", &BridgeError::Runtime("x".repeat(2000)));
        let lines = events.0.lock().clone();
        let line = lines[0].trim_start_matches("error ");
        assert_eq!(line.chars().count(), MAX_DIAGNOSTIC_CHARS);
    }
}
