//! Decides which actions are safe and useful to poll

use crate::catalog::ActionDescriptor;
use std::collections::HashSet;

/// Output data types that map onto a gauge
pub const ACCEPTED_TYPES: &[&str] = &["i2", "i4", "ui2", "ui4"];

/// Zero-argument actions that change device state or take too long
pub const DEFAULT_EXCLUDED_ACTIONS: &[&str] = &[
    "RequestFTPServerWAN",
    "Reboot",
    "FactoryReset",
    "RequestConnection",
    "RequestTermination",
    "ForceTermination",
    "X_GenerateUUID",
    "X_AVM-DE_CreateUrlSID",
];

/// Why an action was not selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Excluded,
    HasInputs,
    NoOutputs,
    NoNumericOutputs,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Excluded => "excluded",
            RejectReason::HasInputs => "has input parameters",
            RejectReason::NoOutputs => "has no output parameters",
            RejectReason::NoNumericOutputs => "has no numeric output parameters",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Names of the numeric outputs, in declaration order
    Accepted(Vec<String>),
    Rejected(RejectReason),
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterDecision::Accepted(_))
    }
}

/// Action eligibility rules
#[derive(Debug, Clone)]
pub struct ActionFilter {
    excluded: HashSet<String>,
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED_ACTIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl ActionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never poll `action`, in addition to the built-in list
    pub fn exclude(mut self, action: impl Into<String>) -> Self {
        self.excluded.insert(action.into());
        self
    }

    pub fn is_excluded(&self, action: &str) -> bool {
        self.excluded.contains(action)
    }

    pub fn evaluate(&self, action: &ActionDescriptor) -> FilterDecision {
        if self.is_excluded(&action.name) {
            return FilterDecision::Rejected(RejectReason::Excluded);
        }
        if !action.inputs.is_empty() {
            return FilterDecision::Rejected(RejectReason::HasInputs);
        }
        if action.outputs.is_empty() {
            return FilterDecision::Rejected(RejectReason::NoOutputs);
        }

        let numeric: Vec<String> = action
            .outputs
            .iter()
            .filter(|param| ACCEPTED_TYPES.contains(&param.data_type.as_str()))
            .map(|param| param.name.clone())
            .collect();

        if numeric.is_empty() {
            FilterDecision::Rejected(RejectReason::NoNumericOutputs)
        } else {
            FilterDecision::Accepted(numeric)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_numeric_outputs_only() {
        let action = ActionDescriptor::new("GetInfo")
            .with_output("NewUpTime", "ui4")
            .with_output("NewDescription", "string")
            .with_output("NewPort", "ui2");

        assert_eq!(
            ActionFilter::new().evaluate(&action),
            FilterDecision::Accepted(vec!["NewUpTime".to_string(), "NewPort".to_string()])
        );
    }

    #[test]
    fn test_rejects_actions_with_inputs() {
        let action = ActionDescriptor::new("SetConfig")
            .with_input("NewEnable", "boolean")
            .with_output("NewCount", "ui4");

        assert_eq!(
            ActionFilter::new().evaluate(&action),
            FilterDecision::Rejected(RejectReason::HasInputs)
        );
    }

    #[test]
    fn test_rejects_actions_without_outputs() {
        let action = ActionDescriptor::new("GetNothing");
        assert_eq!(
            ActionFilter::new().evaluate(&action),
            FilterDecision::Rejected(RejectReason::NoOutputs)
        );
    }

    #[test]
    fn test_rejects_non_numeric_types() {
        for data_type in ["string", "boolean", "ui1", "i1", "ui8", "dateTime", "uuid"] {
            let action = ActionDescriptor::new("GetThing").with_output("NewThing", data_type);
            assert_eq!(
                ActionFilter::new().evaluate(&action),
                FilterDecision::Rejected(RejectReason::NoNumericOutputs),
                "{data_type} should not be accepted"
            );
        }
    }

    #[test]
    fn test_accepts_all_integer_types() {
        for data_type in ACCEPTED_TYPES {
            let action = ActionDescriptor::new("GetThing").with_output("NewThing", data_type);
            assert!(ActionFilter::new().evaluate(&action).is_accepted());
        }
    }

    #[test]
    fn test_exclusion_list_wins() {
        let action =
            ActionDescriptor::new("RequestFTPServerWAN").with_output("NewFTPWANPort", "ui2");
        assert_eq!(
            ActionFilter::new().evaluate(&action),
            FilterDecision::Rejected(RejectReason::Excluded)
        );

        let action = ActionDescriptor::new("GetSlowThing").with_output("NewCount", "ui4");
        let filter = ActionFilter::new().exclude("GetSlowThing");
        assert_eq!(
            filter.evaluate(&action),
            FilterDecision::Rejected(RejectReason::Excluded)
        );
    }
}
