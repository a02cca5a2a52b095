use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw form fields as submitted by the page, the API or the terminal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanForm {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub preference: String,
}

/// A validated planning request. Only built when destination, duration and
/// budget are all non-empty; the budget is taken verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub destination: String,
    pub duration: String,
    pub budget: String,
    pub preference: Option<String>,
}

impl PlanRequest {
    pub fn from_form(form: &PlanForm) -> Option<Self> {
        if form.destination.is_empty() || form.duration.is_empty() || form.budget.is_empty() {
            return None;
        }

        Some(Self {
            destination: form.destination.clone(),
            duration: form.duration.clone(),
            budget: form.budget.clone(),
            preference: Some(form.preference.clone()).filter(|p| !p.is_empty()),
        })
    }
}

impl fmt::Display for PlanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plan a {}-day trip to {} under ${}",
            self.duration, self.destination, self.budget
        )?;
        if let Some(preference) = &self.preference {
            write!(f, " with {}", preference)?;
        }
        Ok(())
    }
}
