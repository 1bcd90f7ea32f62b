use zorac_core::commands::{KEYBOARD_SHORTCUTS, help_rows};

use crate::app::App;

pub fn show(app: &App) {
    app.console.print_header("Available Commands");
    let rows: Vec<(String, String)> = help_rows()
        .into_iter()
        .map(|(trigger, description)| (trigger, description.to_string()))
        .collect();
    app.console.print_table(&rows);

    app.console.print_header("Keyboard Shortcuts");
    let shortcuts: Vec<(String, String)> = KEYBOARD_SHORTCUTS
        .iter()
        .map(|(keys, description)| (keys.to_string(), description.to_string()))
        .collect();
    app.console.print_table(&shortcuts);
    println!();
    app.console
        .info("Any other input is sent to the model as a chat message.");
}
