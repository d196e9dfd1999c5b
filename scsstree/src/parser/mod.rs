pub mod scss_error;
pub mod scss_nodes;
pub mod scss_parser;
pub mod scss_printer;
