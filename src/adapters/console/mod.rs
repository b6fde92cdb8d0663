pub mod std_console;
