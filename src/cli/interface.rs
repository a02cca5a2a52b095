use std::sync::Arc;

use anyhow::Result;
use colored::*;
use dialoguer::{Input, Select};

use crate::api::views::MAX_TRIP_DAYS;
use crate::app::App;
use crate::manager::{ConversationDriver, SessionManager, SubmitOutcome};
use crate::types::{ConversationMessage, PlanForm, Role};

const ACTIONS: &[&str] = &["Generate itinerary", "New chat", "Show history", "Quit"];

pub struct CliInterface {
    sessions: Arc<SessionManager>,
    driver: ConversationDriver,
    currency: String,
}

impl CliInterface {
    pub fn new(app: App) -> Self {
        Self {
            sessions: app.sessions,
            driver: app.driver,
            currency: app.config.travel.currency,
        }
    }

    pub async fn run(&self) -> Result<()> {
        println!("{}", "🤖 AI Trip Planner".bright_cyan().bold());
        println!("{}", "The only Travel Agent you will need!".bright_white());
        println!();

        let session_id = self.sessions.create().await?;

        loop {
            let choice = Select::new()
                .with_prompt("What would you like to do?")
                .items(ACTIONS)
                .default(0)
                .interact()?;

            match choice {
                0 => self.generate(&session_id).await?,
                1 => {
                    self.sessions.new_chat(&session_id).await?;
                    println!("{}", "Starting a new chat...".bright_green());
                }
                2 => {
                    let state = self.sessions.snapshot(&session_id).await?;
                    if state.archived.is_empty() {
                        println!("{}", "No history yet.".dimmed());
                    } else {
                        println!("{}", "History".bright_yellow().bold());
                        print_messages(&state.archived);
                    }
                }
                _ => {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            println!();
        }

        Ok(())
    }

    async fn generate(&self, session_id: &str) -> Result<()> {
        let form = self.read_form()?;

        println!("{}", "Your dream itinerary is being generated...".bright_magenta());
        match self.sessions.submit(session_id, &form).await {
            Ok(SubmitOutcome::Ignored) => {
                println!("{}", "Destination, duration and budget are all required.".yellow());
            }
            Ok(SubmitOutcome::Completed { .. }) => {
                let state = self.sessions.snapshot(session_id).await?;
                println!("{}", "Results".bright_yellow().bold());
                print_messages(&state.active);
            }
            Err(e) => println!("{} {}", "Error:".bright_red(), e),
        }
        Ok(())
    }

    fn read_form(&self) -> Result<PlanForm> {
        let destination: String = Input::new()
            .with_prompt("Destination (e.g. Tokyo)")
            .allow_empty(true)
            .interact_text()?;

        let mut days = vec!["(skip)".to_string()];
        days.extend((1..=MAX_TRIP_DAYS).map(|d| d.to_string()));
        let picked = Select::new()
            .with_prompt("Duration of Travel (in Days)")
            .items(&days)
            .default(0)
            .interact()?;
        let duration = if picked == 0 { String::new() } else { days[picked].clone() };

        let budget: String = Input::new()
            .with_prompt(format!("Total Trip Budget ({})", self.currency))
            .allow_empty(true)
            .interact_text()?;
        let preference: String = Input::new()
            .with_prompt("Special Preference")
            .allow_empty(true)
            .interact_text()?;

        Ok(PlanForm {
            destination,
            duration,
            budget,
            preference,
        })
    }

    /// One-shot mode: run a free-form topic through the agents and print the answer.
    pub async fn ask(&self, topic: &str) -> Result<()> {
        println!("{} {}", "Topic:".bright_cyan(), topic.bright_white());
        let reply = self.driver.run_topic(topic).await?;
        println!();
        println!("{}", reply);
        Ok(())
    }
}

fn print_messages(messages: &[ConversationMessage]) {
    for message in messages {
        let label = match message.role {
            Role::User => "user".bright_blue().bold(),
            Role::Assistant => "assistant".bright_green().bold(),
        };
        println!("{} {}", label, message.created_at.format("%H:%M").to_string().dimmed());
        println!("{}", message.content);
        println!();
    }
}
