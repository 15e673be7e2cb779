//! Shortcuts shipped with the task-graph editor and its UI primitives.

use super::chord::KeyChord;

/// Every default binding, by name. Names are what `koso.toml` overrides.
pub fn default_shortcuts() -> Vec<(&'static str, KeyChord)> {
    vec![
        // Task graph
        ("toggle_status", KeyChord::new(" ")),
        ("cancel", KeyChord::new("Escape")),
        ("show_command_palette", KeyChord::new("p").shift().meta()),
        ("save_editable", KeyChord::new("Enter")),
        ("revert_editable", KeyChord::new("Escape")),
        ("edit_node", KeyChord::new("Enter")),
        ("insert_node", KeyChord::new("Enter").shift()),
        ("remove_node", KeyChord::new("Delete")),
        ("insert_child_node", KeyChord::new("Enter").alt().shift()),
        ("move_node_up", KeyChord::new("ArrowUp").alt()),
        ("move_node_down", KeyChord::new("ArrowDown").alt()),
        ("move_node_row_up", KeyChord::new("ArrowUp").alt().shift()),
        ("move_node_row_down", KeyChord::new("ArrowDown").alt().shift()),
        ("indent_node", KeyChord::new("ArrowRight").alt()),
        ("undent_node", KeyChord::new("ArrowLeft").alt()),
        ("indent_node_shift", KeyChord::new("ArrowRight").alt().shift()),
        ("undent_node_shift", KeyChord::new("ArrowLeft").alt().shift()),
        ("expand_node", KeyChord::new("ArrowRight")),
        ("collapse_node", KeyChord::new("ArrowLeft")),
        ("select_prev_node", KeyChord::new("ArrowUp")),
        ("select_next_node", KeyChord::new("ArrowDown")),
        ("undo", KeyChord::new("z").meta()),
        ("redo", KeyChord::new("z").meta().shift()),
        // Menus, dialogs and lists
        ("arrow_up", KeyChord::new("ArrowUp")),
        ("arrow_down", KeyChord::new("ArrowDown")),
        ("end", KeyChord::new("End")),
        ("enter", KeyChord::new("Enter")),
        ("escape", KeyChord::new("Escape")),
        ("home", KeyChord::new("Home")),
        ("space", KeyChord::new(" ")),
        ("tab_backward", KeyChord::new("Tab").shift()),
        ("tab_forward", KeyChord::new("Tab")),
    ]
}

pub fn default_shortcut(name: &str) -> Option<KeyChord> {
    default_shortcuts()
        .into_iter()
        .find_map(|(n, chord)| (n == name).then_some(chord))
}
