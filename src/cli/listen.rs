use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use nudge::assistant::Assistant;
use nudge::config::NudgeConfig;
use nudge::notify::Notifier;
use nudge::reminder::{ReminderScheduler, SystemClock};

/// Prints voice output to stdout.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn on_voice(&self, message: &str) {
        println!("[nudge] {message}");
    }

    fn on_display_changed(&self) {}
}

/// Administrative commands typed as `/command` lines.
#[derive(Debug, PartialEq)]
enum AdminCommand {
    List,
    Status,
    Cancel(String),
    Snooze(String, Option<u32>),
    Clear,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<AdminCommand> {
    let mut parts = line.strip_prefix('/')?.split_whitespace();
    let command = match parts.next()? {
        "list" | "ls" => AdminCommand::List,
        "status" => AdminCommand::Status,
        "cancel" => AdminCommand::Cancel(parts.next()?.to_string()),
        "snooze" => {
            let id = parts.next()?.to_string();
            let minutes = match parts.next() {
                Some(m) => Some(m.parse().ok()?),
                None => None,
            };
            AdminCommand::Snooze(id, minutes)
        }
        "clear" => AdminCommand::Clear,
        "quit" | "exit" => AdminCommand::Quit,
        "help" => AdminCommand::Help,
        _ => return None,
    };
    Some(command)
}

/// Read messages from stdin until EOF or `/quit`, scheduling reminders as they come in.
pub async fn listen(config: &NudgeConfig, sender: Option<&str>, fallback_only: bool) -> Result<()> {
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let scheduler = ReminderScheduler::new(
        config.reminders.clone(),
        Arc::new(SystemClock),
        notifier.clone(),
    );
    scheduler.start_monitor();

    let resolver = super::build_resolver(&config.parser, fallback_only)?;
    if !resolver.has_primary() {
        println!("Semantic parser disabled, using the rule-based parser only.");
    }
    let assistant = Assistant::new(resolver, scheduler.clone(), notifier);

    println!("Listening. Type a reminder, or /help for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            match parse_command(line) {
                Some(AdminCommand::Quit) => break,
                Some(command) => run_command(&scheduler, command),
                None => println!("Unknown command. Type /help for commands."),
            }
            continue;
        }

        assistant.handle_message(line, sender).await;
    }

    scheduler.shutdown();
    Ok(())
}

fn run_command(scheduler: &ReminderScheduler, command: AdminCommand) {
    match command {
        AdminCommand::List => {
            let now = scheduler.now();
            let active = scheduler.get_active();
            if active.is_empty() {
                println!("No pending reminders.");
            }
            for r in active {
                println!(
                    "  {}  {}  {:<8} {}",
                    r.id,
                    r.scheduled_time.format("%m-%d %H:%M"),
                    r.format_remaining(now),
                    r.task
                );
            }
        }
        AdminCommand::Status => {
            let s = scheduler.status_summary();
            println!("Reminder Status");
            println!("{}", "=".repeat(40));
            println!("  Total:               {}", s.total);
            println!("  Active:              {}", s.active);
            println!("  Urgent (≤5 min):     {}", s.urgent);
            println!("  Critical (≤1 min):   {}", s.critical);
            if let Some(current) = s.current {
                println!(
                    "  Next:                {} at {} ({})",
                    current.task, current.scheduled_time, current.time_remaining
                );
            }
        }
        AdminCommand::Cancel(id) => {
            if scheduler.cancel(&id) {
                println!("Cancelled {id}.");
            } else {
                println!("No pending reminder {id}.");
            }
        }
        AdminCommand::Snooze(id, minutes) => {
            if scheduler.snooze(&id, minutes) {
                let minutes = minutes.unwrap_or(scheduler.config().default_snooze_minutes);
                println!("Snoozed {id} for {minutes} minute(s).");
            } else {
                println!("Could not snooze {id}.");
            }
        }
        AdminCommand::Clear => {
            scheduler.clear_all();
        }
        AdminCommand::Help => {
            println!("  /list                   pending reminders");
            println!("  /status                 counts and the next reminder");
            println!("  /cancel <id>            cancel a reminder");
            println!("  /snooze <id> [minutes]  push a reminder back");
            println!("  /clear                  remove every reminder");
            println!("  /quit                   stop listening");
        }
        AdminCommand::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_admin_commands() {
        assert_eq!(parse_command("/list"), Some(AdminCommand::List));
        assert_eq!(parse_command("/cancel abc"), Some(AdminCommand::Cancel("abc".into())));
        assert_eq!(
            parse_command("/snooze abc 10"),
            Some(AdminCommand::Snooze("abc".into(), Some(10)))
        );
        assert_eq!(
            parse_command("/snooze abc"),
            Some(AdminCommand::Snooze("abc".into(), None))
        );
        assert_eq!(parse_command("/quit"), Some(AdminCommand::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(parse_command("/cancel"), None);
        assert_eq!(parse_command("/snooze abc soon"), None);
        assert_eq!(parse_command("/dance"), None);
        assert_eq!(parse_command("list"), None);
    }
}
