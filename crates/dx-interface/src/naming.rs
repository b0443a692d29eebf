//! Object names built from variable metadata.

use std::fmt;
use std::str::FromStr;

use dx_common::DxError;
use serde::{Deserialize, Serialize};

/// The name of a stored variable: `v:<variable>[,m:<model>][,s:<scenario>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableName {
    pub variable: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
}

impl VariableName {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            model: None,
            scenario: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v:{}", self.variable)?;
        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            write!(f, ",m:{}", model)?;
        }
        if let Some(scenario) = self.scenario.as_deref().filter(|s| !s.is_empty()) {
            write!(f, ",s:{}", scenario)?;
        }
        Ok(())
    }
}

impl FromStr for VariableName {
    type Err = DxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            |why: &str| DxError::Config(format!("invalid variable name '{}': {}", s, why));

        let mut parts = s.split(',');
        let variable = parts
            .next()
            .and_then(|p| p.strip_prefix("v:"))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| invalid("must start with v:<variable>"))?;

        let mut name = VariableName::new(variable);
        for part in parts {
            match part.split_once(':') {
                Some(("m", model)) if name.model.is_none() && name.scenario.is_none() => {
                    name.model = Some(model.to_string());
                }
                Some(("s", scenario)) if name.scenario.is_none() => {
                    name.scenario = Some(scenario.to_string());
                }
                _ => return Err(invalid("expected ,m:<model> then ,s:<scenario>")),
            }
        }
        Ok(name)
    }
}
