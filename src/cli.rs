//! Command-line REPL driving a JSON station

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::*;
use rustyline::DefaultEditor;
use serde_json::Value;
use tracing::debug;

use station::{Listener, StateMap, StateWriter, Station};

/// One parsed prompt line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set(StateMap),
    Get,
    On(String),
    Off(String),
    Emit(String, Value),
    Listeners,
    Help,
    Quit,
}

impl Command {
    /// Parse a prompt line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "set" => {
                let value: Value = serde_json::from_str(rest)
                    .with_context(|| format!("Invalid JSON: {}", rest))?;
                match value {
                    Value::Object(map) => Command::Set(map),
                    _ => anyhow::bail!("set expects a JSON object"),
                }
            }
            "get" => Command::Get,
            "on" | "off" => {
                let event = required_event(word, rest)?;
                if word == "on" {
                    Command::On(event)
                } else {
                    Command::Off(event)
                }
            }
            "emit" => {
                let (event, payload) = match rest.split_once(char::is_whitespace) {
                    Some((event, payload)) => (event, payload.trim()),
                    None => (rest, ""),
                };
                let event = required_event(word, event)?;
                let data = if payload.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(payload)
                        .with_context(|| format!("Invalid JSON: {}", payload))?
                };
                Command::Emit(event, data)
            }
            "listeners" => Command::Listeners,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => anyhow::bail!("Unknown command '{}', try 'help'", other),
        };

        Ok(Some(command))
    }
}

fn required_event(command: &str, event: &str) -> Result<String> {
    if event.is_empty() {
        anyhow::bail!("{} requires an event name", command);
    }
    Ok(event.to_string())
}

/// Prompt session: the station plus the event listeners it installed
pub struct Session {
    station: Station<StateMap>,
    writer: StateWriter<StateMap>,
    event_listeners: HashMap<String, Listener<Value>>,
}

impl Session {
    pub fn new(writer: StateWriter<StateMap>) -> Self {
        Self {
            station: writer.station().clone(),
            writer,
            event_listeners: HashMap::new(),
        }
    }

    /// Subscribe a listener printing every state snapshot
    pub fn watch_state(&self) {
        self.station
            .subscribe(Listener::from_fn(|state: Arc<StateMap>| {
                let rendered = serde_json::to_string(&*state)?;
                println!("{} {}", "state".green().bold(), rendered);
                Ok(())
            }));
    }

    /// Run one command; returns false when the session should end
    pub fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Set(partial) => self.writer.set_state(partial),
            Command::Get => {
                let state = Value::Object(self.station.state());
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            Command::On(event) => {
                let listener = self
                    .event_listeners
                    .entry(event.clone())
                    .or_insert_with(|| printing_event_listener(event.clone()))
                    .clone();
                self.station.subscribe_on_event(&event, listener);
            }
            Command::Off(event) => match self.event_listeners.remove(&event) {
                Some(listener) => self.station.unsubscribe_on_event(&event, listener),
                None => println!("{} not listening to '{}'", "note".yellow(), event),
            },
            Command::Emit(event, data) => self.station.dispatch(&event, data),
            Command::Listeners => {
                println!("  state: {}", self.station.listener_count().to_string().green());
                let mut events: Vec<_> = self.event_listeners.keys().collect();
                events.sort();
                for event in events {
                    let count = self.station.event_listener_count(event);
                    println!("  {}: {}", event, count.to_string().green());
                }
            }
            Command::Help => print_help(),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn printing_event_listener(event: String) -> Listener<Value> {
    Listener::from_fn(move |data: Arc<Value>| {
        println!("{} {} {}", "event".cyan().bold(), event, data);
        Ok(())
    })
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  set <json-object>     shallow-merge into the state");
    println!("  get                   print the current state");
    println!("  on <event>            print payloads dispatched to <event>");
    println!("  off <event>           stop printing <event>");
    println!("  emit <event> [json]   dispatch a payload to <event>");
    println!("  listeners             show listener counts");
    println!("  quit                  leave");
}

pub fn run_repl(mut session: Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let prompt = format!("{}> ", session.station.name());

    loop {
        let readline = rl.readline(&prompt);
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        debug!(?command, "Executing command");
                        match session.execute(command) {
                            Ok(true) => {}
                            Ok(false) => break,
                            Err(e) => println!("{} {:#}", "error".red().bold(), e),
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{} {:#}", "error".red().bold(), e),
                }
            }
            Err(_) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_set() {
        let cmd = Command::parse("set {\"count\": 1}").unwrap().unwrap();
        let Command::Set(map) = cmd else {
            panic!("expected set");
        };
        assert_eq!(Value::Object(map), json!({"count": 1}));
    }

    #[test]
    fn test_parse_set_rejects_non_object() {
        assert!(Command::parse("set [1,2]").is_err());
        assert!(Command::parse("set {oops").is_err());
    }

    #[test]
    fn test_parse_emit() {
        assert_eq!(
            Command::parse("emit saved {\"id\": 3}").unwrap(),
            Some(Command::Emit("saved".to_string(), json!({"id": 3})))
        );
        assert_eq!(
            Command::parse("emit ping").unwrap(),
            Some(Command::Emit("ping".to_string(), Value::Null))
        );
        assert!(Command::parse("emit").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("get").unwrap(), Some(Command::Get));
        assert_eq!(Command::parse("on tick").unwrap(), Some(Command::On("tick".into())));
        assert_eq!(Command::parse("off tick").unwrap(), Some(Command::Off("tick".into())));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
        assert!(Command::parse("on").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_session_set_and_events() {
        let (_, writer) = Station::new(StateMap::new());
        let mut session = Session::new(writer);

        assert!(session
            .execute(Command::Set(json!({"a": 1}).as_object().unwrap().clone()))
            .unwrap());
        assert_eq!(Value::Object(session.station.state()), json!({"a": 1}));

        session.execute(Command::On("tick".into())).unwrap();
        session.execute(Command::On("tick".into())).unwrap();
        assert_eq!(session.station.event_listener_count("tick"), 1);

        session.execute(Command::Off("tick".into())).unwrap();
        assert_eq!(session.station.event_listener_count("tick"), 0);

        assert!(!session.execute(Command::Quit).unwrap());
    }
}
