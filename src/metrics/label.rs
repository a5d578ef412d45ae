//! Label metric.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::Metric;

/// Value reported by a label that was never updated.
pub const UNSET_LABEL: &str = "(n/a)";

/// String valued metric.
///
/// Labels are not rendered as samples of their own: in the text exposition
/// they are attached as attributes to every counter and gauge line.
#[derive(Debug)]
pub struct Label {
    name: String,
    help: String,
    value: ArcSwapOption<String>,
}

impl Label {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            value: ArcSwapOption::empty(),
        }
    }

    /// Replace the current value.
    pub fn update(&self, value: impl Into<String>) {
        self.value.store(Some(Arc::new(value.into())));
    }

    /// Current value, or `(n/a)` if the label was never updated.
    pub fn value(&self) -> String {
        match self.value.load_full() {
            Some(value) => value.as_ref().clone(),
            None => UNSET_LABEL.to_string(),
        }
    }
}

impl Metric for Label {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }
}
