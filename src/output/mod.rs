//! Output formatting module
//!
//! Coloured status lines for interactive runs, or a single JSON document
//! with `--json`.

pub mod json;
pub mod terminal;

pub use json::{print_json, to_json_output, JsonOutput};
pub use terminal::{
    print_header, print_info, print_local_certificate, print_reconcile_report, print_success,
    print_warning,
};
