use minijinja::{context, Environment};

use crate::manager::ConversationState;
use crate::types::AppResult;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Destinations offered as suggestions; any other value can still be typed in.
pub const SUGGESTED_DESTINATIONS: &[&str] = &["Tokyo"];
pub const MAX_TRIP_DAYS: u32 = 31;

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> AppResult<Self> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn session_page(&self, session_id: &str, state: &ConversationState, currency: &str) -> AppResult<String> {
        let template = self.env.get_template("index.html")?;
        let durations: Vec<u32> = (1..=MAX_TRIP_DAYS).collect();
        let page = template.render(context! {
            session_id,
            state,
            currency,
            durations,
            destinations => SUGGESTED_DESTINATIONS,
        })?;
        Ok(page)
    }
}
