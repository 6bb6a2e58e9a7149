use serde::{Deserialize, Serialize};

/// The clause a step came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    Given,
    When,
    Then,
}

impl StepRole {
    /// All roles in extraction order.
    pub const ALL: [Self; 3] = [Self::Given, Self::When, Self::Then];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }
}

impl std::fmt::Display for StepRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic text unit taken from one non-empty scenario field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepUnit {
    pub scenario_index: usize,
    pub role: StepRole,
    pub text: String,
}

impl StepUnit {
    /// Text with its role prefix, e.g. `Then: form is saved`.
    pub fn labeled(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled() {
        let unit = StepUnit {
            scenario_index: 0,
            role: StepRole::Then,
            text: "form is saved".into(),
        };
        assert_eq!(unit.labeled(), "Then: form is saved");
    }

    #[test]
    fn test_role_order() {
        assert!(StepRole::Given < StepRole::When);
        assert!(StepRole::When < StepRole::Then);
    }
}
