use std::fmt::Arguments;

use log::Level;

/// Named log target handed to every component at construction time.
///
/// Components never set up logging themselves; the binary decides where the
/// records for each target end up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSink {
    target: String,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("egoview")
    }
}

impl LogSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Sink for a sub-component, `parent::name`.
    pub fn child(&self, name: &str) -> Self {
        Self::new(format!("{}::{}", self.target, name))
    }

    pub fn log(&self, level: Level, args: Arguments<'_>) {
        log::log!(target: self.target.as_str(), level, "{}", args);
    }

    pub fn debug(&self, args: Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_targets_nest() {
        let sink = LogSink::new("egoview").child("router").child("llm");
        assert_eq!(sink.target(), "egoview::router::llm");
        assert_eq!(LogSink::default().target(), "egoview");
    }
}
