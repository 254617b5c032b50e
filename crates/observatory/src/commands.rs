use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use observatory_transcripts::extract::truncate_chars;
use observatory_transcripts::{
    ActiveSession, AgentStats, AgentSummary, CostReport, EventPayload, ParsedEvent,
    SessionStatus, TranscriptStore,
};

use crate::api::costs::load_costs;
use crate::config::Settings;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the live HTTP API
    Serve {
        /// Port to listen on (default: from config, else 3001)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List recently active sessions
    Sessions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent events across sessions, or for one session
    Events {
        /// Only events from this session
        #[arg(long)]
        session: Option<String>,

        /// Maximum number of events
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current session and its latest events
    Current {
        /// Maximum number of events
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List agent sub-transcripts
    Agents {
        /// Look back this many minutes (default: from config)
        #[arg(long)]
        minutes: Option<u32>,

        /// Show aggregate statistics instead of a list
        #[arg(long, conflicts_with_all = ["session", "id"])]
        stats: bool,

        /// Only agents spawned by this session
        #[arg(long, conflicts_with = "id")]
        session: Option<String>,

        /// Show a single agent
        #[arg(long)]
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show estimated spend from the assistant's stats cache
    Costs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a session's full event stream in order
    Replay {
        /// Session ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run any command other than `serve`.
pub fn handle_command(command: Command, settings: &Settings) -> Result<()> {
    let store = TranscriptStore::with_config(settings.store.clone());

    match command {
        Command::Serve { .. } => anyhow::bail!("serve is handled by the server entry point"),
        Command::Sessions { json } => {
            let sessions = store.active_sessions();

            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!("{}", "No active sessions.".dimmed());
            } else {
                print_sessions_table(&sessions);
            }
        }
        Command::Events {
            session,
            limit,
            json,
        } => {
            let events = match &session {
                Some(id) => store.session_events(id, limit),
                None => store.live_events(limit),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("{}", "No recent events.".dimmed());
            } else {
                print_events(&events);
            }
        }
        Command::Current { limit, json } => {
            let current = store.current_session(limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&current)?);
                return Ok(());
            }

            match &current.session {
                Some(session) => {
                    print_session_header(session);
                    println!();
                    print_events(&current.events);
                }
                None => println!("{}", "No active session.".dimmed()),
            }
        }
        Command::Agents {
            minutes,
            stats,
            session,
            id,
            json,
        } => {
            if stats {
                let stats = store.agent_stats();
                if json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    print_agent_stats(&stats);
                }
                return Ok(());
            }

            if let Some(id) = id {
                let agent = store
                    .agent(&id)
                    .ok_or_else(|| anyhow::anyhow!("Agent not found: {}", id))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&agent)?);
                } else {
                    print_agent_detail(&agent);
                }
                return Ok(());
            }

            let agents = match &session {
                Some(session_id) => store.agents_for_session(session_id),
                None => store.recent_agents(minutes.unwrap_or(store.windows().agents_minutes)),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&agents)?);
            } else if agents.is_empty() {
                println!("{}", "No recent agents.".dimmed());
            } else {
                print_agents_table(&agents);
            }
        }
        Command::Costs { json } => {
            let costs = load_costs(&settings.stats_cache)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&costs)?);
            } else {
                match &costs.report {
                    Some(report) => print_cost_report(report),
                    None => println!(
                        "{} {}",
                        "No stats cache found at".dimmed(),
                        costs.cache.path.display()
                    ),
                }
            }
        }
        Command::Replay { id, json } => {
            let events = store.replay_session(&id);

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("{}", "No recent session with that ID.".dimmed());
            } else {
                print_events(&events);
            }
        }
    }

    Ok(())
}

fn colored_status(status: SessionStatus) -> String {
    match status {
        SessionStatus::Active => status.as_str().bright_green().to_string(),
        SessionStatus::Completed => status.as_str().dimmed().to_string(),
    }
}

fn short_id(id: &str) -> String {
    truncate_chars(id, 8)
}

fn print_sessions_table(sessions: &[ActiveSession]) {
    println!(
        "{:<10} {:<10} {:<7} {:<8} {:<6} {:<6} {:<20} {}",
        "SESSION".dimmed(),
        "STATUS".dimmed(),
        "KIND".dimmed(),
        "MODEL".dimmed(),
        "MSGS".dimmed(),
        "TOOLS".dimmed(),
        "MODIFIED".dimmed(),
        "PROJECT".dimmed(),
    );

    for s in sessions {
        let kind = if s.is_agent { "agent" } else { "main" };
        let modified = s.last_modified.format("%Y-%m-%d %H:%M").to_string();

        println!(
            "{:<10} {:<10} {:<7} {:<8} {:<6} {:<6} {:<20} {}",
            short_id(&s.session_id),
            colored_status(s.status),
            kind,
            s.model.as_deref().unwrap_or("-"),
            s.message_count,
            s.tool_calls,
            modified,
            s.project_path
        );
    }
}

fn print_session_header(session: &ActiveSession) {
    println!("{}", "=== Current Session ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), session.session_id);
    if let Some(ref slug) = session.slug {
        println!("{}  {}", "Slug:".dimmed(), slug);
    }
    println!("{}  {}", "Project:".dimmed(), session.project_path);
    println!("{}  {}", "Status:".dimmed(), colored_status(session.status));
    if let Some(ref model) = session.model {
        println!("{}  {}", "Model:".dimmed(), model);
    }
    println!(
        "{}  {} messages, {} tool calls",
        "Activity:".dimmed(),
        session.message_count,
        session.tool_calls
    );
}

fn print_events(events: &[ParsedEvent]) {
    for event in events {
        let time = event.timestamp.format("%H:%M:%S").to_string();
        let kind = match &event.payload {
            EventPayload::Thinking { .. } => "thinking".magenta(),
            EventPayload::ToolCall { .. } => "tool".bright_yellow(),
            EventPayload::ToolResult { .. } => "result".yellow(),
            EventPayload::Response { .. } => "response".bright_green(),
            EventPayload::UserMessage { .. } => "user".bright_cyan(),
        };
        let who = match &event.agent_id {
            Some(agent) => format!("agent:{}", short_id(agent)),
            None => short_id(&event.session_id),
        };

        println!(
            "{} {:<14} {:<9} {}",
            time.dimmed(),
            who,
            kind,
            describe(&event.payload)
        );
    }
}

/// One-line human summary of an event.
fn describe(payload: &EventPayload) -> String {
    let text = match payload {
        EventPayload::Thinking { thinking } => thinking.clone(),
        EventPayload::ToolCall {
            tool_name,
            tool_input,
        } => {
            let target = tool_input.as_ref().and_then(|input| {
                ["file_path", "command", "pattern", "url"]
                    .iter()
                    .find_map(|key| input.get(*key).and_then(|v| v.as_str()))
            });
            match target {
                Some(target) => format!("{} {}", tool_name.bold(), target),
                None => tool_name.bold().to_string(),
            }
        }
        EventPayload::ToolResult { file_path, .. } => {
            file_path.clone().unwrap_or_else(|| "(output)".to_string())
        }
        EventPayload::Response { text, .. } => text.clone(),
        EventPayload::UserMessage { text } => text.clone(),
    };

    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let clipped = truncate_chars(&single_line, 100);
    if clipped.len() < single_line.len() {
        format!("{}...", clipped)
    } else {
        clipped
    }
}

fn print_agents_table(agents: &[AgentSummary]) {
    println!(
        "{:<14} {:<24} {:<12} {:<10} {:<8} {:<6} {}",
        "AGENT".dimmed(),
        "NAME".dimmed(),
        "TYPE".dimmed(),
        "STATUS".dimmed(),
        "MODEL".dimmed(),
        "TOOLS".dimmed(),
        "SESSION".dimmed(),
    );

    for a in agents {
        println!(
            "{:<14} {:<24} {:<12} {:<10} {:<8} {:<6} {}",
            truncate_chars(&a.agent_id, 12),
            truncate_chars(&a.name, 22),
            a.agent_type.as_str(),
            colored_status(a.status),
            a.model,
            a.tool_calls,
            short_id(&a.session_id)
        );
    }
}

fn print_agent_detail(agent: &AgentSummary) {
    println!("{}", "=== Agent Detail ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), agent.agent_id);
    println!("{}  {}", "Name:".dimmed(), agent.name);
    println!("{}  {}", "Type:".dimmed(), agent.agent_type.as_str());
    println!("{}  {}", "Status:".dimmed(), colored_status(agent.status));
    println!("{}  {}", "Model:".dimmed(), agent.model);
    println!("{}  {}", "Session:".dimmed(), agent.session_id);
    println!("{}  {}", "Project:".dimmed(), agent.project_path);
    println!(
        "{}  {} messages, {} tool calls",
        "Activity:".dimmed(),
        agent.message_count,
        agent.tool_calls
    );
    if let (Some(start), Some(last)) = (agent.start_time, agent.last_activity) {
        let secs = (last - start).num_seconds().max(0) as f64;
        println!("{}  {}", "Duration:".dimmed(), format_duration(secs));
    }
    if let Some(ref first) = agent.first_message {
        println!();
        println!("{}", "First message:".dimmed());
        println!("  {}", first);
    }
}

fn print_agent_stats(stats: &AgentStats) {
    println!("{}", "=== Agent Statistics ===".bright_blue().bold());
    println!("{}  {}", "Total:".dimmed(), stats.total);
    println!("{}  {}", "Active:".dimmed(), stats.active.to_string().bright_green());
    println!("{}  {}", "Completed:".dimmed(), stats.completed);

    if !stats.by_model.is_empty() {
        println!();
        println!("{}", "By model:".dimmed());
        for (model, count) in &stats.by_model {
            println!("  {:<12} {}", model, count);
        }
    }
    if !stats.by_type.is_empty() {
        println!();
        println!("{}", "By type:".dimmed());
        for (kind, count) in &stats.by_type {
            println!("  {:<12} {}", kind, count);
        }
    }
}

fn print_cost_report(report: &CostReport) {
    println!("{}", "=== Estimated Costs ===".bright_blue().bold());
    println!(
        "{}  {}",
        "Total:".dimmed(),
        format!("${:.2}", report.total_cost_usd).bold()
    );
    println!("{}  {}", "Tokens:".dimmed(), report.total_tokens);
    if let Some(ref date) = report.last_computed_date {
        println!("{}  {}", "Updated:".dimmed(), date);
    }

    println!();
    println!(
        "{:<10} {:>14} {:>14} {:>14} {:>12}",
        "MODEL".dimmed(),
        "INPUT".dimmed(),
        "OUTPUT".dimmed(),
        "CACHE READ".dimmed(),
        "COST".dimmed(),
    );
    for m in &report.by_model {
        println!(
            "{:<10} {:>14} {:>14} {:>14} {:>12}",
            m.model,
            m.tokens.input_tokens,
            m.tokens.output_tokens,
            m.tokens.cache_read_tokens,
            format!("${:.2}", m.cost_usd)
        );
    }

    if !report.daily.is_empty() {
        println!();
        println!("{:<12} {:>14} {:>12}", "DATE".dimmed(), "TOKENS".dimmed(), "EST. COST".dimmed());
        for day in report.daily.iter().rev().take(14) {
            println!(
                "{:<12} {:>14} {:>12}",
                day.date,
                day.total_tokens,
                format!("${:.2}", day.cost_usd)
            );
        }
    }
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.0}s", secs)
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = (secs % 60.0) as u64;
        format!("{}m {}s", mins, remaining_secs)
    }
}
