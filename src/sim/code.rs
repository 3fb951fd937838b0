//! Keypad code entry
//!
//! Raw input is re-derived on every keystroke: non-digits are dropped, the
//! digits are regrouped by a fixed pattern and anything past the pattern's
//! capacity is cut off. Once every group is present the formatted string is
//! checked against the allow-list.

use crate::tuning::CodeTuning;

/// Result of feeding one input event to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeOutcome {
    /// Not enough groups yet
    Incomplete,
    /// Matched an allowed code (only ever reported once)
    Accepted,
    /// All groups present but the code is wrong
    Rejected,
    /// The gate is already open, input is ignored
    Ignored,
}

/// What the input field should show after an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub display: String,
    pub outcome: CodeOutcome,
}

/// Digit grouping pattern, e.g. `[1, 1, 2]` renders `"1234"` as `"1 2 34"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFormat {
    groups: Vec<usize>,
}

/// A formatted code buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedCode {
    pub text: String,
    /// Number of groups present (the last one may be partial)
    pub groups: usize,
}

impl CodeFormat {
    pub fn new(groups: Vec<usize>) -> Self {
        Self {
            groups: groups.into_iter().filter(|&len| len > 0).collect(),
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total digits the pattern can hold
    pub fn capacity(&self) -> usize {
        self.groups.iter().sum()
    }

    /// Filter and regroup raw input
    pub fn format(&self, raw: &str) -> FormattedCode {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();

        let mut text = String::with_capacity(self.capacity() + self.groups.len());
        let mut groups = 0;
        let mut index = 0;

        for &len in &self.groups {
            if index >= digits.len() {
                break;
            }
            let end = (index + len).min(digits.len());
            if groups > 0 {
                text.push(' ');
            }
            text.extend(&digits[index..end]);
            groups += 1;
            index = end;
        }

        FormattedCode { text, groups }
    }
}

/// The keypad gate: formatting plus allow-list matching
#[derive(Debug, Clone)]
pub struct CodeGate {
    format: CodeFormat,
    allowed: Vec<String>,
    buffer: String,
    unlocked: bool,
}

impl CodeGate {
    pub fn new(format: CodeFormat, allowed: Vec<String>) -> Self {
        Self {
            format,
            allowed,
            buffer: String::new(),
            unlocked: false,
        }
    }

    pub fn from_tuning(tuning: &CodeTuning) -> Self {
        Self::new(
            CodeFormat::new(tuning.group_lengths.clone()),
            tuning.allowed_codes.clone(),
        )
    }

    /// Current formatted buffer
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Handle one input event carrying the field's full raw value
    pub fn input(&mut self, raw: &str) -> CodeEntry {
        if self.unlocked {
            return CodeEntry {
                display: String::new(),
                outcome: CodeOutcome::Ignored,
            };
        }

        let formatted = self.format.format(raw);
        self.buffer = formatted.text;

        if formatted.groups != self.format.group_count() {
            return CodeEntry {
                display: self.buffer.clone(),
                outcome: CodeOutcome::Incomplete,
            };
        }

        if self.allowed.iter().any(|code| *code == self.buffer) {
            log::info!("Valid code entered: {}", self.buffer);
            self.unlocked = true;
            self.buffer.clear();
            CodeEntry {
                display: String::new(),
                outcome: CodeOutcome::Accepted,
            }
        } else {
            log::info!("Invalid code entered: {}", self.buffer);
            CodeEntry {
                display: self.buffer.clone(),
                outcome: CodeOutcome::Rejected,
            }
        }
    }
}
