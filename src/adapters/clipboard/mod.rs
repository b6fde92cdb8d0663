pub mod command_clipboard;
