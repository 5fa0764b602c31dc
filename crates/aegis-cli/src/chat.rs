//! Interactive multi-session chat about uploaded documents

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use aegis_core::documents::load_upload;
use aegis_core::prompts::{chat_prompt, upload_acknowledgement};
use aegis_core::{GenerationConfig, GenerationRequest, Generator, Role, SessionId, SessionStore};

use crate::commands::{help_text, SlashCommand};
use crate::output::write_response;

/// Longest display name shown by `/list` before it is cut short
const NAME_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ChatApp<W> {
    store: SessionStore,
    generator: Arc<dyn Generator>,
    model: String,
    stream: bool,
    out: W,
}

impl<W> ChatApp<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(generator: Arc<dyn Generator>, config: &GenerationConfig, out: W) -> Self {
        Self {
            store: SessionStore::new(),
            generator,
            model: config.model.clone(),
            stream: config.stream,
            out,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Reads lines from `input` until it ends or the user quits.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        if let Err(e) = self.generator.health_check().await {
            log::warn!("Generation server health check failed: {}", e);
            self.say(&format!(
                "Warning: {}. Answers will fail until the server is running.",
                e
            ))
            .await?;
        }
        self.say("Aegis document chat. Type /help for commands.").await?;

        let mut lines = input.lines();
        loop {
            let prompt = format!("\n[{}] > ", self.store.current().display_name());
            self.out.write_all(prompt.as_bytes()).await?;
            self.out.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if self.handle_line(&line).await? == Flow::Quit {
                break;
            }
        }

        log::info!("Chat ended with {} session(s)", self.store.len());
        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match SlashCommand::parse(line) {
            Some(SlashCommand::Quit) => return Ok(Flow::Quit),
            Some(SlashCommand::New) => self.new_chat().await?,
            Some(SlashCommand::List) => self.list().await?,
            Some(SlashCommand::Switch(id)) => self.switch(&id).await?,
            Some(SlashCommand::Upload(path)) => self.upload(&path).await?,
            Some(SlashCommand::Help) => self.say(&help_text()).await?,
            Some(SlashCommand::Invalid(message)) => self.say(&message).await?,
            None => self.ask(line).await?,
        }
        Ok(Flow::Continue)
    }

    /// Attaches the file at `path` to the current session.
    ///
    /// A file that cannot be used is reported, not returned as an error.
    pub async fn upload(&mut self, path: &Path) -> Result<()> {
        let upload = match load_upload(path).await {
            Ok(upload) => upload,
            Err(e) => {
                log::warn!("Upload of {} failed: {}", path.display(), e);
                return self.say(&e.to_string()).await;
            }
        };

        let id = self.store.current_id();
        self.store
            .set_document_context(id, upload.text, upload.display_name)?;

        let acknowledgement = upload_acknowledgement(&upload.file_name);
        self.store
            .append_message(id, Role::Assistant, acknowledgement.clone())?;
        self.say(&acknowledgement).await
    }

    async fn ask(&mut self, question: &str) -> Result<()> {
        // The answer belongs to the session the question was asked in.
        let id = self.store.current_id();
        let Some(document) = self.store.current().document_context().map(str::to_string) else {
            return self
                .say("Upload a document with /upload PATH before asking questions.")
                .await;
        };

        self.store.append_message(id, Role::User, question)?;

        let request = GenerationRequest::new(&self.model, chat_prompt(&document, question))
            .with_stream(self.stream);
        log::debug!("Asking about session {} with {} prompt bytes", id, request.prompt.len());

        let answer = write_response(&mut self.out, self.generator.as_ref(), &request).await?;
        self.store.append_message(id, Role::Assistant, answer)?;
        Ok(())
    }

    async fn new_chat(&mut self) -> Result<()> {
        let id = self.store.create_session();
        self.store.switch(id)?;
        self.say(&format!("Started a new chat ({})", id)).await
    }

    async fn list(&mut self) -> Result<()> {
        let current = self.store.current_id();
        let mut listing = String::new();
        for session in self.store.list_sessions() {
            let marker = if session.id() == current { '*' } else { ' ' };
            listing.push_str(&format!(
                "{} {}  {}  ({} messages)\n",
                marker,
                session.id(),
                truncate_name(session.display_name()),
                session.messages().len()
            ));
        }
        self.say(listing.trim_end()).await
    }

    async fn switch(&mut self, raw_id: &str) -> Result<()> {
        let switched = raw_id
            .parse::<SessionId>()
            .and_then(|id| self.store.switch(id));
        if let Err(e) = switched {
            return self.say(&e.to_string()).await;
        }

        let session = self.store.current();
        let mut transcript = format!("Switched to {} ({})", session.display_name(), session.id());
        for message in session.messages() {
            transcript.push_str(&format!("\n{}> {}", message.role, message.content));
        }
        self.say(&transcript).await
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        let cut: String = name.chars().take(NAME_WIDTH).collect();
        format!("{}...", cut)
    } else {
        name.to_string()
    }
}
