use crate::error::{ModelError, ModelResult};
use crate::history::{History, HistoryEntry, IdentifiedAttrs};
use crate::node::Node;
use crate::schema::Schema;
use crate::transaction::{Selection, Transaction, DESCRIPTION_META, HISTORY_META};
use crate::transform::Step;

/// An immutable document version plus its selection and undo history
#[derive(Debug, Clone)]
pub struct EditorState {
    schema: Schema,
    doc: Node,
    selection: Selection,
    version: u64,
    history: History,
}

impl EditorState {
    pub fn create(schema: Schema, doc: Node) -> Self {
        Self::with_history(schema, doc, History::new())
    }

    pub fn with_history(schema: Schema, doc: Node, history: History) -> Self {
        let selection = Selection::at_start(&doc);
        Self {
            schema,
            doc,
            selection,
            version: 0,
            history,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Start a transaction against this version
    pub fn tr(&self) -> Transaction {
        Transaction::new(self.schema.clone(), self.doc.clone(), self.selection, self.version)
    }

    /// Produce the next version. The transaction must have been built
    /// against this exact version.
    pub fn apply(&self, tr: &Transaction) -> ModelResult<EditorState> {
        if tr.base_version() != self.version {
            return Err(ModelError::StaleTransaction {
                expected: tr.base_version(),
                actual: self.version,
            });
        }

        let mut history = self.history.clone();
        let current = HistoryEntry::new(self.doc.clone(), self.selection);
        match tr.get_meta(HISTORY_META).and_then(|v| v.as_str()) {
            Some("undo") => {
                history.undone(current);
            }
            Some("redo") => {
                history.redone(current);
            }
            _ if tr.doc_changed() && tr.add_to_history() => {
                let entry = match tr.get_meta(DESCRIPTION_META).and_then(|v| v.as_str()) {
                    Some(description) => current.with_description(description),
                    None => current,
                };
                history.record(entry);
            }
            // snapshots keep the results of untracked attribute updates, so
            // undo never brings back a stale upload placeholder
            _ if tr.doc_changed() => history.carry_attrs(&identified_attr_updates(tr)),
            _ => {}
        }

        Ok(EditorState {
            schema: self.schema.clone(),
            doc: tr.doc().clone(),
            selection: tr.selection().clamp(tr.doc()),
            version: self.version + 1,
            history,
        })
    }

    /// Transaction restoring the last undo snapshot
    pub fn undo_tr(&self) -> Option<Transaction> {
        let entry = self.history.peek_undo()?;
        Some(self.restore_tr(entry, "undo"))
    }

    /// Transaction restoring the last redo snapshot
    pub fn redo_tr(&self) -> Option<Transaction> {
        let entry = self.history.peek_redo()?;
        Some(self.restore_tr(entry, "redo"))
    }

    fn restore_tr(&self, entry: &HistoryEntry, direction: &str) -> Transaction {
        let mut tr = self.tr();
        // a snapshot is a valid document, so swapping content cannot fail;
        // on the off chance it does, the transaction stays a no-op
        let _ = tr.replace_doc_content(entry.doc.children().to_vec());
        tr.set_selection(entry.selection)
            .set_meta(HISTORY_META, direction)
            .set_add_to_history(false);
        tr
    }
}

/// Final attributes each `SetAttrs` step gave to a node with an `id`
fn identified_attr_updates(tr: &Transaction) -> Vec<IdentifiedAttrs> {
    let mut updates: Vec<IdentifiedAttrs> = Vec::new();
    let mut doc = tr.before().clone();
    for step in tr.steps() {
        let Ok(result) = step.apply(&doc) else {
            break;
        };
        doc = result.doc;

        let Step::SetAttrs { pos, .. } = step else {
            continue;
        };
        let Some(node) = doc.node_at(*pos) else {
            continue;
        };
        let Some(id) = node.attr_str("id") else {
            continue;
        };

        let update = IdentifiedAttrs {
            node_type: node.type_name().to_string(),
            id: id.to_string(),
            attrs: node.attrs().clone(),
        };
        match updates
            .iter_mut()
            .find(|u| u.node_type == update.node_type && u.id == update.id)
        {
            Some(existing) => *existing = update,
            None => updates.push(update),
        }
    }
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attrs;
    use crate::test_support::{basic_schema, doc, para};
    use serde_json::json;

    fn state(text: &str) -> EditorState {
        let schema = basic_schema();
        EditorState::create(schema.clone(), doc(&schema, vec![para(&schema, text)]))
    }

    #[test]
    fn test_apply_bumps_version() {
        let state = state("ab");
        let mut tr = state.tr();
        tr.insert_text(1, "x").unwrap();

        let next = state.apply(&tr).unwrap();
        assert_eq!(next.version(), 1);
        assert_eq!(next.doc().text_content(), "xab");
        assert!(next.history().can_undo());
    }

    #[test]
    fn test_stale_transaction_is_rejected() {
        let state = state("ab");
        let tr = state.tr();
        let next = state.apply(&tr).unwrap();

        let result = next.apply(&tr);
        assert!(matches!(
            result,
            Err(ModelError::StaleTransaction { expected: 0, actual: 1 })
        ));
    }

    #[test]
    fn test_undo_and_redo_round_trip() {
        let state = state("ab");
        let mut tr = state.tr();
        tr.insert_text(3, "c").unwrap();
        let edited = state.apply(&tr).unwrap();

        let undone = edited.apply(&edited.undo_tr().unwrap()).unwrap();
        assert_eq!(undone.doc(), state.doc());
        assert!(undone.history().can_redo());

        let redone = undone.apply(&undone.redo_tr().unwrap()).unwrap();
        assert_eq!(redone.doc().text_content(), "abc");
        assert!(!redone.history().can_redo());
    }

    #[test]
    fn test_untracked_transactions_skip_history() {
        let state = state("ab");
        let mut tr = state.tr();
        tr.insert_text(1, "x").unwrap().set_add_to_history(false);

        let next = state.apply(&tr).unwrap();
        assert!(!next.history().can_undo());
        assert!(next.undo_tr().is_none());
    }

    #[test]
    fn test_initial_selection_in_first_textblock() {
        assert_eq!(state("ab").selection(), Selection::cursor(1));
    }

    #[test]
    fn test_untracked_attr_update_survives_undo() {
        let schema = basic_schema();
        let mut attrs = Attrs::new();
        attrs.insert("src".into(), json!("blob:1"));
        attrs.insert("id".into(), json!("img-1"));
        let image = schema.node("image", attrs, Vec::new()).unwrap();
        let paragraph = schema
            .node("paragraph", Attrs::new(), vec![schema.text("ab"), image])
            .unwrap();
        let state = EditorState::create(schema.clone(), doc(&schema, vec![paragraph]));

        let mut tr = state.tr();
        tr.insert_text(1, "x").unwrap();
        let typed = state.apply(&tr).unwrap();

        // image sits after "xab" inside the paragraph
        let mut update = Attrs::new();
        update.insert("src".into(), json!("https://cdn/1.png"));
        let mut tr = typed.tr();
        tr.set_node_attrs(4, update).unwrap().set_add_to_history(false);
        let resolved = typed.apply(&tr).unwrap();
        assert_eq!(resolved.history().undo_count(), 1);

        let undone = resolved.apply(&resolved.undo_tr().unwrap()).unwrap();
        assert_eq!(undone.doc().text_content(), "ab");
        let image = undone.doc().node_at(3).unwrap();
        assert_eq!(image.attr_str("src"), Some("https://cdn/1.png"));

        let redone = undone.apply(&undone.redo_tr().unwrap()).unwrap();
        assert_eq!(redone.doc().node_at(4).unwrap().attr_str("src"), Some("https://cdn/1.png"));
    }
}
