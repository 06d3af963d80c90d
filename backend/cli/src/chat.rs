//! Interactive terminal chat: a sidebar of conversations, each with its own
//! relay session, driven by plain lines and slash commands.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use chatrelay_core::{ChatError, ConversationRecord, MediaStore, Message, Role, Sidebar, UploadFile};
use chatrelay_media::detect_mime_type;
use chatrelay_relay::{ChatSession, ReplyProducer};

use crate::terminal_output::{
    bold, dim, note_error, note_info, note_success, note_warn, render_table, DeltaPrinter,
};

const HELP: &str = "\
/new [title]          start a conversation
/list                 list conversations
/select <id>          switch conversation (an id prefix is enough)
/rename <id> <title>  rename a conversation
/delete <id>          delete a conversation
/upload <path>        attach a file
/history              show the active conversation
/quit                 leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    New(String),
    List,
    Select(String),
    Rename { id: String, title: String },
    Delete(String),
    Upload(PathBuf),
    History,
    Help,
    Quit,
    /// A known command missing its argument; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse_command(line: &str) -> ChatCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Send(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "new" => ChatCommand::New(arg.to_string()),
        "list" | "ls" => ChatCommand::List,
        "select" | "open" if !arg.is_empty() => ChatCommand::Select(arg.to_string()),
        "select" | "open" => ChatCommand::Usage("/select <id>"),
        "rename" => match arg.split_once(char::is_whitespace) {
            Some((id, title)) => ChatCommand::Rename {
                id: id.to_string(),
                title: title.trim().to_string(),
            },
            None => ChatCommand::Usage("/rename <id> <title>"),
        },
        "delete" | "rm" if !arg.is_empty() => ChatCommand::Delete(arg.to_string()),
        "delete" | "rm" => ChatCommand::Usage("/delete <id>"),
        "upload" if !arg.is_empty() => ChatCommand::Upload(PathBuf::from(arg)),
        "upload" => ChatCommand::Usage("/upload <path>"),
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        other => ChatCommand::Unknown(other.to_string()),
    }
}

/// Sidebar plus one [`ChatSession`] per conversation.
pub struct ChatDesk {
    sidebar: Sidebar,
    sessions: HashMap<String, ChatSession>,
    producer: ReplyProducer,
    store: Arc<dyn MediaStore>,
}

impl ChatDesk {
    /// Starts with one empty, selected conversation.
    pub fn new(producer: ReplyProducer, store: Arc<dyn MediaStore>) -> Self {
        let mut desk = Self {
            sidebar: Sidebar::new(),
            sessions: HashMap::new(),
            producer,
            store,
        };
        desk.create("");
        desk
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    /// Create a conversation and make it active.
    pub fn create(&mut self, title: &str) -> String {
        let id = self.sidebar.create(title);
        let session = ChatSession::new(id.clone(), self.producer.clone()).with_store(Arc::clone(&self.store));
        self.sessions.insert(id.clone(), session);
        // The id was just created, so selecting it cannot fail.
        let _ = self.sidebar.select(&id);
        id
    }

    /// Exact id, or a prefix matching exactly one conversation.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<String, ChatError> {
        if self.sidebar.get(id_or_prefix).is_ok() {
            return Ok(id_or_prefix.to_string());
        }
        let mut matches = self
            .sidebar
            .list()
            .into_iter()
            .filter(|r| !id_or_prefix.is_empty() && r.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record.id.clone()),
            _ => Err(ChatError::ConversationNotFound(id_or_prefix.to_string())),
        }
    }

    pub fn select(&mut self, id_or_prefix: &str) -> Result<&ConversationRecord, ChatError> {
        let id = self.resolve(id_or_prefix)?;
        self.sidebar.select(&id)?;
        self.sidebar.get(&id)
    }

    pub fn rename(&mut self, id_or_prefix: &str, title: &str) -> Result<(), ChatError> {
        let id = self.resolve(id_or_prefix)?;
        self.sidebar.rename(&id, title)
    }

    /// Delete a conversation. If it was active, the newest remaining one is
    /// selected, or a fresh one is created when none remain.
    pub fn delete(&mut self, id_or_prefix: &str) -> Result<ConversationRecord, ChatError> {
        let id = self.resolve(id_or_prefix)?;
        let record = self.sidebar.delete(&id)?;
        self.sessions.remove(&id);

        if self.sidebar.active_id().is_none() {
            let next = self.sidebar.list().first().map(|r| r.id.clone());
            match next {
                Some(next) => self.sidebar.select(&next)?,
                None => {
                    self.create("");
                }
            }
        }
        Ok(record)
    }

    pub fn active(&self) -> Option<(&ConversationRecord, &ChatSession)> {
        let record = self.sidebar.active()?;
        let session = self.sessions.get(&record.id)?;
        Some((record, session))
    }

    fn active_id(&self) -> Result<String, ChatError> {
        self.sidebar
            .active_id()
            .map(str::to_string)
            .ok_or_else(|| ChatError::ConversationNotFound("no active conversation".into()))
    }

    /// Send to the active conversation and update its preview line.
    pub async fn send<F>(&mut self, text: &str, on_update: F) -> Result<Option<Message>, ChatError>
    where
        F: FnMut(&str) + Send,
    {
        let id = self.active_id()?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))?;
        let reply = session.send_observed(text, on_update).await?;
        if let Some(reply) = &reply {
            self.sidebar.touch(&id, &reply.content)?;
        }
        Ok(reply)
    }

    /// Upload into the active conversation; returns the message it appended.
    pub async fn upload(&mut self, file: &UploadFile) -> Result<Message, ChatError> {
        let id = self.active_id()?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))?;
        if let Err(err) = session.upload(file).await {
            debug!(error = %err, "Upload rejected");
        }
        let message = session
            .messages()
            .last()
            .cloned()
            .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))?;
        self.sidebar.touch(&id, &message.content)?;
        Ok(message)
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_list(desk: &ChatDesk) {
    let active = desk.sidebar().active_id();
    let rows: Vec<Vec<String>> = desk
        .sidebar()
        .list()
        .into_iter()
        .map(|r| {
            let marker = if Some(r.id.as_str()) == active { "*" } else { " " };
            let preview: String = r.last_message.chars().take(40).collect();
            vec![
                format!("{marker} {}", short_id(&r.id)),
                r.initials(),
                r.title.clone(),
                preview,
            ]
        })
        .collect();
    print!("{}", render_table(&["  ID", "", "Title", "Last message"], &rows));
}

fn print_history(desk: &ChatDesk) {
    let Some((record, session)) = desk.active() else {
        note_warn("No active conversation");
        return;
    };
    println!("{}", bold(&record.title));
    if session.messages().is_empty() {
        println!("{}", dim("(empty)"));
    }
    for message in session.messages() {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("{} {}", dim(&format!("{who} ›")), message.content);
    }
}

async fn read_upload(path: &Path) -> std::io::Result<UploadFile> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    Ok(UploadFile::new(name, detect_mime_type(path), bytes))
}

/// Stream one reply to stdout.
async fn send_and_print(desk: &mut ChatDesk, text: &str) -> Result<(), ChatError> {
    let mut printer = DeltaPrinter::new();
    let mut stdout = std::io::stdout();
    print!("{} ", dim("assistant ›"));
    desk.send(text, |snapshot| {
        let _ = printer.write(&mut stdout, snapshot);
    })
    .await?;
    println!();
    Ok(())
}

/// Run the interactive loop on stdin until `/quit` or end of input.
pub async fn run_chat(mut desk: ChatDesk) -> Result<()> {
    note_info("chatrelay chat. Type /help for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", bold("you ›"));
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let result = match parse_command(&line) {
            ChatCommand::Send(text) if text.is_empty() => Ok(()),
            ChatCommand::Send(text) => send_and_print(&mut desk, &text).await,
            ChatCommand::New(title) => {
                let id = desk.create(&title);
                note_success(&format!("Started conversation {}", short_id(&id)));
                Ok(())
            }
            ChatCommand::List => {
                print_list(&desk);
                Ok(())
            }
            ChatCommand::Select(id) => desk.select(&id).map(|record| {
                note_success(&format!("Switched to \"{}\"", record.title));
            }),
            ChatCommand::Rename { id, title } => desk.rename(&id, &title).map(|()| note_success("Renamed")),
            ChatCommand::Delete(id) => desk
                .delete(&id)
                .map(|record| note_success(&format!("Deleted \"{}\"", record.title))),
            ChatCommand::Upload(path) => match read_upload(&path).await {
                Ok(file) => desk.upload(&file).await.map(|message| match message.role {
                    Role::User => note_success(&message.content),
                    Role::Assistant => note_error(&message.content),
                }),
                Err(e) => {
                    note_error(&format!("Cannot read {}: {e}", path.display()));
                    Ok(())
                }
            },
            ChatCommand::History => {
                print_history(&desk);
                Ok(())
            }
            ChatCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            ChatCommand::Quit => break,
            ChatCommand::Usage(usage) => {
                note_warn(&format!("Usage: {usage}"));
                Ok(())
            }
            ChatCommand::Unknown(name) => {
                note_warn(&format!("Unknown command /{name}. Type /help."));
                Ok(())
            }
        };

        if let Err(err) = result {
            note_error(&err.to_string());
        }
    }
    Ok(())
}

/// One exchange, streamed to stdout.
pub async fn run_ask(producer: ReplyProducer, prompt: &str) -> Result<()> {
    let mut session = ChatSession::new("ask", producer);
    let mut printer = DeltaPrinter::new();
    let mut stdout = std::io::stdout();
    session
        .send_observed(prompt, |snapshot| {
            let _ = printer.write(&mut stdout, snapshot);
        })
        .await?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::{CompletionProvider, UploadError, UPLOAD_FAILED_TEXT};
    use chatrelay_providers::MockProvider;

    struct RejectingStore;

    #[async_trait::async_trait]
    impl MediaStore for RejectingStore {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn upload(&self, _file: &UploadFile) -> Result<String, UploadError> {
            Err(UploadError::Network("offline".into()))
        }
    }

    fn desk() -> ChatDesk {
        let provider: Arc<dyn CompletionProvider> = Arc::new(MockProvider::echo("mock"));
        ChatDesk::new(ReplyProducer::new(provider), Arc::new(RejectingStore))
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  hello there "), ChatCommand::Send("hello there".into()));
        assert_eq!(parse_command("/new Trip plans"), ChatCommand::New("Trip plans".into()));
        assert_eq!(parse_command("/new"), ChatCommand::New(String::new()));
        assert_eq!(
            parse_command("/rename ab12 Budget 2025"),
            ChatCommand::Rename {
                id: "ab12".into(),
                title: "Budget 2025".into()
            }
        );
        assert_eq!(parse_command("/rename ab12"), ChatCommand::Usage("/rename <id> <title>"));
        assert_eq!(parse_command("/upload ./a b.pdf"), ChatCommand::Upload(PathBuf::from("./a b.pdf")));
        assert_eq!(parse_command("/select"), ChatCommand::Usage("/select <id>"));
        assert_eq!(parse_command("/q"), ChatCommand::Quit);
        assert_eq!(parse_command("/frobnicate"), ChatCommand::Unknown("frobnicate".into()));
    }

    #[test]
    fn desk_starts_with_selected_conversation() {
        let desk = desk();
        assert_eq!(desk.sidebar().len(), 1);
        let (record, session) = desk.active().unwrap();
        assert_eq!(record.title, "New chat");
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn send_goes_to_active_conversation_and_touches_preview() {
        let mut desk = desk();
        let first = desk.sidebar().active_id().unwrap().to_string();
        let second = desk.create("Second");

        desk.send("ping", |_| {}).await.unwrap();

        assert_eq!(desk.sidebar().get(&second).unwrap().last_message, "You said: ping");
        assert_eq!(desk.sidebar().get(&first).unwrap().last_message, "");
        desk.select(&first).unwrap();
        assert!(desk.active().unwrap().1.messages().is_empty());
    }

    #[test]
    fn resolves_unique_prefixes_only() {
        let mut desk = desk();
        let id = desk.sidebar().active_id().unwrap().to_string();
        assert_eq!(desk.resolve(&id[..6]).unwrap(), id);
        assert!(matches!(desk.resolve("zzzz"), Err(ChatError::ConversationNotFound(_))));
        assert!(desk.resolve("").is_err());

        desk.rename(&id[..6], "Renamed").unwrap();
        assert_eq!(desk.sidebar().get(&id).unwrap().title, "Renamed");
    }

    #[test]
    fn deleting_active_selects_next_or_creates() {
        let mut desk = desk();
        let first = desk.sidebar().active_id().unwrap().to_string();
        let second = desk.create("Second");

        desk.delete(&second).unwrap();
        assert_eq!(desk.sidebar().active_id(), Some(first.as_str()));

        desk.delete(&first).unwrap();
        assert_eq!(desk.sidebar().len(), 1);
        assert!(desk.active().is_some());
        assert!(matches!(desk.delete(&first), Err(ChatError::ConversationNotFound(_))));
    }

    #[tokio::test]
    async fn failed_upload_appends_notice() {
        let mut desk = desk();
        let message = desk
            .upload(&UploadFile::new("a.txt", "text/plain", "hello"))
            .await
            .unwrap();
        assert_eq!(message, Message::assistant(UPLOAD_FAILED_TEXT));
        assert_eq!(desk.active().unwrap().0.last_message, UPLOAD_FAILED_TEXT);
    }

    #[tokio::test]
    async fn reads_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let file = read_upload(&path).await.unwrap();
        assert_eq!(file.name, "photo.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.len(), 3);
    }
}
