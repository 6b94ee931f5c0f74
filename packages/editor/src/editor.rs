//! # Editor
//!
//! One editor instance: the current [`EditorState`], the composed
//! [`Manager`], attachment bookkeeping and change subscribers.
//!
//! ## Flow
//!
//! ```text
//! run / chain / paste / handle_key
//!          ↓
//!   Transaction (one per call)
//!          ↓
//!   dispatch → new EditorState → StateChange to subscribers
//!          ↓
//!   uploads started by the paste are owned here and drained by
//!   settle() / poll_async(), one completion at a time
//! ```

use crate::attachments::{
    AsyncOutcome, AttachmentHandlers, AttachmentPhase, AttachmentTracker, FileAttributes,
    FilePasteProps, PastedFile, UploadFuture, DELETED_FILE_META, FILE_NODE,
};
use crate::commands::{CommandArgs, CommandProps};
use crate::errors::{CommandError, EditorError, UploadError};
use crate::extension::PasteRule;
use crate::manager::Manager;
use crate::resolver::locate;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use scribe_model::transaction::DESCRIPTION_META;
use scribe_model::{
    Attrs, EditorState, History, IdGenerator, Mapping, Node, Origin, Schema, Selection,
    Transaction,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Published after every committed transaction
#[derive(Debug, Clone)]
pub struct StateChange {
    pub version: u64,
    pub doc: Node,
    pub doc_changed: bool,
    pub origin: Origin,
    pub selection: Selection,
    pub mapping: Mapping,
    /// When the transaction was committed
    pub at: Instant,
}

/// Content handed to [`Editor::paste`]
#[derive(Debug, Clone, PartialEq)]
pub enum PasteEvent {
    Text(String),
    /// Files pasted over the selection (`pos: None`) or dropped at `pos`
    Files { files: Vec<PastedFile>, pos: Option<usize> },
}

pub struct Editor {
    manager: Manager,
    state: EditorState,
    ids: IdGenerator,
    handlers: AttachmentHandlers,
    tracker: AttachmentTracker,
    uploads: FuturesUnordered<UploadFuture>,
    subscribers: Vec<mpsc::UnboundedSender<StateChange>>,
}

impl Editor {
    pub fn new(manager: Manager, doc: Node) -> Self {
        Self::with_history(manager, doc, History::new())
    }

    pub fn with_history(manager: Manager, doc: Node, history: History) -> Self {
        let state = EditorState::with_history(manager.schema().clone(), doc, history);
        let mut ids = IdGenerator::new("scribe");
        ids.observe_doc(state.doc());
        Self {
            manager,
            state,
            ids,
            handlers: AttachmentHandlers::default(),
            tracker: AttachmentTracker::new(),
            uploads: FuturesUnordered::new(),
            subscribers: Vec::new(),
        }
    }

    /// Use `ids` from now on. Ids already in the document are never reissued.
    pub fn with_ids(mut self, mut ids: IdGenerator) -> Self {
        ids.observe_doc(self.state.doc());
        self.ids = ids;
        self
    }

    pub fn with_handlers(mut self, handlers: AttachmentHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn schema(&self) -> &Schema {
        self.manager.schema()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Node {
        self.state.doc()
    }

    pub fn tracker(&self) -> &AttachmentTracker {
        &self.tracker
    }

    pub fn pending_uploads(&self) -> usize {
        self.uploads.len()
    }

    /// Next identifier from this editor's generator
    pub fn new_id(&mut self) -> String {
        self.ids.observe_doc(self.state.doc());
        self.ids.new_id()
    }

    /// Receive a [`StateChange`] for every transaction committed from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StateChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Apply a transaction built against the current state
    pub fn dispatch(&mut self, tr: Transaction) -> Result<(), EditorError> {
        let next = self.state.apply(&tr)?;
        self.state = next;

        if let Some(record) = tr.get_meta(DELETED_FILE_META).and_then(deleted_record) {
            if self.tracker.phase(&record.id).is_some() {
                self.tracker.advance(&record.id, AttachmentPhase::Deleted);
            }
            self.handlers.delete.deleted(&record);
        }

        let change = StateChange {
            version: self.state.version(),
            doc: self.state.doc().clone(),
            doc_changed: tr.doc_changed(),
            origin: tr.origin(),
            selection: self.state.selection(),
            mapping: tr.mapping().clone(),
            at: Instant::now(),
        };
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        Ok(())
    }

    /// Run a command. `Ok(false)` when its preconditions do not hold.
    pub fn run(&mut self, name: &str, args: &CommandArgs) -> Result<bool, CommandError> {
        let tr = self.state.tr();
        self.run_in(name, args, tr)
    }

    /// Dry run: would `name` apply right now? Never changes state.
    pub fn can(&self, name: &str, args: &CommandArgs) -> Result<bool, CommandError> {
        let spec = self.command(name, args)?;
        let mut tr = self.state.tr();
        let mut props = CommandProps::new(&self.state, &mut tr, false);
        Ok(spec.invoke(&mut props, args))
    }

    /// Queue commands that commit together or not at all
    pub fn chain(&mut self) -> Chain<'_> {
        Chain {
            editor: self,
            steps: Vec::new(),
        }
    }

    /// Try every command bound to `key` until one applies
    pub fn handle_key(&mut self, key: &str) -> Result<bool, CommandError> {
        let bindings = self.manager.bindings(key).to_vec();
        for command in bindings {
            if self.run(&command, &CommandArgs::new())? {
                debug!(key, command = %command, "key handled");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Hand pasted content to the paste rules. The first rule that accepts
    /// it wins; plain text no rule claims is inserted as-is.
    pub fn paste(&mut self, event: PasteEvent) -> Result<bool, EditorError> {
        match event {
            PasteEvent::Text(text) => self.paste_text(&text),
            PasteEvent::Files { files, pos } => self.paste_files(&files, pos),
        }
    }

    /// Wait for every pending upload and apply the results in completion order
    pub async fn settle(&mut self) -> Vec<AsyncOutcome> {
        let mut outcomes = Vec::new();
        while let Some((id, result)) = self.uploads.next().await {
            outcomes.push(self.resolve_upload(id, result));
        }
        outcomes
    }

    /// Wait for the next upload to finish. `None` when nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<AsyncOutcome> {
        let (id, result) = self.uploads.next().await?;
        Some(self.resolve_upload(id, result))
    }

    /// Apply uploads that have already finished, without waiting
    pub fn poll_async(&mut self) -> Vec<AsyncOutcome> {
        let mut outcomes = Vec::new();
        while let Some(Some((id, result))) = self.uploads.next().now_or_never() {
            outcomes.push(self.resolve_upload(id, result));
        }
        outcomes
    }

    fn command(&self, name: &str, args: &CommandArgs) -> Result<crate::CommandSpec, CommandError> {
        let spec = self
            .manager
            .command(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
        spec.check_args(args)?;
        Ok(spec.clone())
    }

    fn run_in(&mut self, name: &str, args: &CommandArgs, mut tr: Transaction) -> Result<bool, CommandError> {
        let spec = self.command(name, args)?;
        let (applied, dispatched) = {
            let mut props = CommandProps::new(&self.state, &mut tr, true);
            let applied = spec.invoke(&mut props, args);
            (applied, props.dispatched())
        };

        if applied && dispatched {
            self.commit(name, tr)?;
        }
        Ok(applied)
    }

    fn commit(&mut self, name: &str, tr: Transaction) -> Result<(), CommandError> {
        self.dispatch(tr).map_err(|err| CommandError::Commit {
            command: name.to_string(),
            message: err.to_string(),
        })
    }

    fn paste_text(&mut self, text: &str) -> Result<bool, EditorError> {
        let rules = self.manager.paste_rules().to_vec();
        for rule in &rules {
            let mut tr = self.state.tr();
            let accepted = match rule {
                PasteRule::Mark {
                    pattern,
                    mark_type,
                    get_attrs,
                    ..
                } => {
                    if !pattern.is_match(text) {
                        continue;
                    }
                    let from = self.state.selection().from();
                    insert_pasted_text(&mut tr, text)?;
                    for captures in pattern.captures_iter(text) {
                        let (Some(whole), Some(attrs)) = (captures.get(0), get_attrs(&captures)) else {
                            continue;
                        };
                        let start = from + text[..whole.start()].chars().count();
                        let end = from + text[..whole.end()].chars().count();
                        let mark = self.schema().mark(mark_type, attrs)?;
                        tr.add_mark(start, end, mark)?;
                    }
                    true
                }
                PasteRule::Text { handler, .. } => {
                    let mut props = CommandProps::new(&self.state, &mut tr, true);
                    handler(&mut props, text) && props.dispatched()
                }
                PasteRule::File { .. } => false,
            };

            if accepted {
                debug!(rule = rule.name(), "paste handled");
                self.dispatch(tr)?;
                return Ok(true);
            }
        }

        if text.is_empty() {
            return Ok(false);
        }
        let mut tr = self.state.tr();
        insert_pasted_text(&mut tr, text)?;
        self.dispatch(tr)?;
        Ok(true)
    }

    fn paste_files(&mut self, files: &[PastedFile], pos: Option<usize>) -> Result<bool, EditorError> {
        if files.is_empty() {
            return Ok(false);
        }

        let rules = self.manager.paste_rules().to_vec();
        for rule in &rules {
            let PasteRule::File { name, handler } = rule else {
                continue;
            };

            // the document may have gained ids through sync since the last paste
            self.ids.observe_doc(self.state.doc());
            let mut tr = self.state.tr();
            let mut props =
                FilePasteProps::new(&mut tr, files, pos, &mut self.ids, self.handlers.paste.as_ref());
            if !handler(&mut props) {
                continue;
            }
            let accepted = props.into_accepted();

            debug!(rule = %name, files = accepted.len(), "files pasted");
            self.dispatch(tr)?;
            for (file, record) in accepted {
                self.start_upload(file, record);
            }
            return Ok(true);
        }

        Ok(false)
    }

    fn start_upload(&mut self, file: PastedFile, record: FileAttributes) {
        let id = record.id.clone();
        self.tracker.advance(&id, AttachmentPhase::Pasted);
        self.tracker.advance(&id, AttachmentPhase::Uploading);

        let upload = self.handlers.upload.upload(&file, &record);
        self.uploads
            .push(async move { (id, upload.await) }.boxed_local());
    }

    /// Apply a finished upload to whatever node carries its identifier now
    fn resolve_upload(&mut self, id: String, result: Result<FileAttributes, UploadError>) -> AsyncOutcome {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                warn!(id = %id, %error, "upload failed");
                return AsyncOutcome::UploadFailed { id, error };
            }
        };

        if self.tracker.phase(&id) == Some(AttachmentPhase::Deleted) {
            debug!(id = %id, "upload finished after its node was deleted");
            return AsyncOutcome::Dropped { id };
        }

        let Some(found) = locate(self.state.doc(), Some(FILE_NODE), &id, true) else {
            self.tracker.advance(&id, AttachmentPhase::Deleted);
            return AsyncOutcome::Dropped { id };
        };

        let mut attrs: Attrs = record.to_attrs();
        attrs.remove("id");
        let args = CommandArgs::new().position(found.pos).attrs(attrs);
        let mut tr = self.state.tr();
        tr.set_add_to_history(false);

        match self.run_in("update_file", &args, tr) {
            Ok(true) => {
                self.tracker.advance(&id, AttachmentPhase::Resolved);
                AsyncOutcome::Resolved { id, pos: found.pos }
            }
            Ok(false) => AsyncOutcome::Dropped { id },
            Err(err) => {
                warn!(id = %id, %err, "could not apply upload result");
                AsyncOutcome::Dropped { id }
            }
        }
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("version", &self.state.version())
            .field("doc", self.state.doc())
            .field("pending_uploads", &self.uploads.len())
            .finish_non_exhaustive()
    }
}

/// Replace the selection with `text`, leaving the cursor after it
fn insert_pasted_text(tr: &mut Transaction, text: &str) -> Result<(), EditorError> {
    let selection = tr.selection();
    let (from, to) = (selection.from(), selection.to());
    if from < to {
        tr.delete(from, to)?;
    }
    tr.insert_text(from, text)?;
    tr.set_selection(Selection::cursor(from + text.chars().count()));
    tr.set_meta(DESCRIPTION_META, "paste");
    Ok(())
}

fn deleted_record(value: &Value) -> Option<FileAttributes> {
    let attrs: Attrs = value.as_object()?.clone().into_iter().collect();
    FileAttributes::from_attrs(&attrs)
}

/// Commands queued by [`Editor::chain`]
pub struct Chain<'e> {
    editor: &'e mut Editor,
    steps: Vec<(String, CommandArgs)>,
}

impl<'e> Chain<'e> {
    pub fn then(mut self, name: &str, args: CommandArgs) -> Self {
        self.steps.push((name.to_string(), args));
        self
    }

    /// Run every step against one transaction and commit once. If any step
    /// returns `false`, nothing is committed.
    pub fn run(self) -> Result<bool, CommandError> {
        self.execute(true)
    }

    /// Dry run of the whole chain
    pub fn can(self) -> Result<bool, CommandError> {
        self.execute(false)
    }

    fn execute(self, dispatch: bool) -> Result<bool, CommandError> {
        let editor = self.editor;
        let specs = self
            .steps
            .iter()
            .map(|(name, args)| editor.command(name, args))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tr = editor.state.tr();
        for (spec, (name, args)) in specs.iter().zip(&self.steps) {
            let mut props = CommandProps::new(&editor.state, &mut tr, dispatch);
            if !spec.invoke(&mut props, args) {
                debug!(command = %name, "chain step failed, nothing committed");
                return Ok(false);
            }
        }

        if dispatch {
            editor.commit("chain", tr)?;
        }
        Ok(true)
    }
}
