//! JSON output formatter

use crate::reconcile::ReconcileReport;
use crate::runner::RunResult;
use serde::Serialize;

/// JSON-serializable summary of the local certificate; the PEM material is
/// never included
#[derive(Debug, Serialize)]
pub struct JsonCertificate<'a> {
    pub name: &'a str,
    pub common_name: &'a str,
    pub dns_names: &'a [String],
    /// Upper-case hex
    pub serial_number: String,
    pub not_after: String,
}

/// JSON-serializable output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    pub certificate: JsonCertificate<'a>,
    pub providers: &'a [ReconcileReport],
}

pub fn to_json_output(result: &RunResult) -> JsonOutput<'_> {
    let local = &result.local;
    JsonOutput {
        certificate: JsonCertificate {
            name: &local.display_name,
            common_name: &local.common_name,
            dns_names: &local.dns_names,
            serial_number: format!("{:X}", local.serial_number),
            not_after: local.not_after.to_rfc3339(),
        },
        providers: &result.reports,
    }
}

/// Print RunResult as JSON to stdout
pub fn print_json(result: &RunResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&to_json_output(result))?;
    println!("{}", json);
    Ok(())
}
