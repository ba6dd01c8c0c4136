//! Option values restricted to a fixed set of words.

use std::fmt;
use std::str::FromStr;

use super::FlagValue;
use crate::error::OptionError;

/// Option holding one variant of an enumerated tag, such as a restart
/// condition or an endpoint resolution mode. An empty string clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOpt<T> {
    value: Option<T>,
}

impl<T> ChoiceOpt<T> {
    /// Creates an unset option.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Creates an option preset to `value`.
    #[must_use]
    pub const fn with_default(value: T) -> Self {
        Self { value: Some(value) }
    }
}

impl<T: Copy> ChoiceOpt<T> {
    /// Returns the selected variant, if any.
    #[must_use]
    pub const fn value(&self) -> Option<T> {
        self.value
    }
}

impl<T> Default for ChoiceOpt<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FlagValue for ChoiceOpt<T>
where
    T: FromStr<Err = OptionError> + fmt::Display,
{
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        self.value = if value.is_empty() {
            None
        } else {
            Some(value.parse()?)
        };
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "string"
    }
}

impl<T: fmt::Display> fmt::Display for ChoiceOpt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => fmt::Display::fmt(v, f),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::{FailureAction, ResolutionMode, RestartCondition};

    #[test]
    fn test_choice_parses_variants() {
        let mut condition = ChoiceOpt::<RestartCondition>::new();
        condition.set("on-failure").unwrap();
        assert_eq!(condition.value(), Some(RestartCondition::OnFailure));
        assert_eq!(condition.to_string(), "on-failure");
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        let mut mode = ChoiceOpt::<ResolutionMode>::new();
        mode.set("DNSRR").unwrap();
        assert_eq!(mode.value(), Some(ResolutionMode::Dnsrr));
    }

    #[test]
    fn test_choice_rejects_unknown() {
        let mut action = ChoiceOpt::with_default(FailureAction::Pause);
        let err = action.set("rollback").unwrap_err();
        assert!(matches!(err, OptionError::InvalidChoice { .. }));
        assert_eq!(action.value(), Some(FailureAction::Pause));
    }

    #[test]
    fn test_choice_empty_clears() {
        let mut action = ChoiceOpt::with_default(FailureAction::Continue);
        action.set("").unwrap();
        assert_eq!(action.value(), None);
        assert_eq!(action.to_string(), "");
        assert_eq!(action.value_type(), "string");
    }
}
