use crate::commands::{CommandProps, CommandSpec};
use crate::extension::{priority, ExtensionBundle};
use scribe_model::Transaction;

/// Undo and redo over the editor state's snapshot history
pub fn history() -> ExtensionBundle {
    ExtensionBundle::new("history")
        .priority(priority::HIGH)
        .command(CommandSpec::new("undo", vec![], |props, _| {
            let tr = props.state().undo_tr();
            restore(props, tr)
        }))
        .command(CommandSpec::new("redo", vec![], |props, _| {
            let tr = props.state().redo_tr();
            restore(props, tr)
        }))
        .key("Mod-z", "undo")
        .key("Mod-y", "redo")
        .key("Shift-Mod-z", "redo")
}

fn restore(props: &mut CommandProps<'_>, tr: Option<Transaction>) -> bool {
    let Some(tr) = tr else {
        return false;
    };
    // history cannot be mixed with other edits of a chain
    if props.tr().doc_changed() {
        return false;
    }
    *props.tr() = tr;
    props.dispatch();
    true
}
