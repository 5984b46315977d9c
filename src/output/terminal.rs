//! Coloured terminal summaries

use crate::models::LocalCertificate;
use crate::reconcile::{ApplyReport, ReconcileReport, ReplacementOutcome};
use console::style;

/// Print section header
pub fn print_header(title: &str) {
    println!();
    println!("{}", style(format!("━━━ {} ━━━", title)).cyan().bold());
    println!();
}

/// Print the certificate being reconciled
pub fn print_local_certificate(local: &LocalCertificate) {
    print_header("Local Certificate");
    println!("  {:<14} {}", style("Name").bold(), local.display_name);
    println!("  {:<14} {}", style("Common Name").bold(), local.common_name);
    println!(
        "  {:<14} {:X}",
        style("Serial").bold(),
        local.serial_number
    );
    println!(
        "  {:<14} {}",
        style("Valid Until").bold(),
        local.not_after.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for name in &local.dns_names {
        println!("  {} {}", style("•").cyan(), name);
    }
}

/// Print what one provider ended up doing
pub fn print_reconcile_report(report: &ReconcileReport) {
    print_header(report.provider);

    let certificate = &report.certificate;
    if certificate.uploaded {
        print_success(&format!(
            "Uploaded {} as {}",
            certificate.name, certificate.id
        ));
    } else {
        print_info(&format!(
            "Reusing {} ({})",
            certificate.name, certificate.id
        ));
    }

    match &report.applied {
        ApplyReport::Bindings(bindings) => {
            for domain in &bindings.bound {
                print_success(&format!("Bound {}", domain));
            }
            for domain in &bindings.unchanged {
                print_info(&format!("{} already bound", domain));
            }
        }
        ApplyReport::Replacements(replacements) => {
            if replacements.replaced.is_empty() {
                print_info("No expiring certificates to replace");
            }
            for (old_id, outcome) in &replacements.replaced {
                match outcome {
                    ReplacementOutcome::Deployed { record_id } => print_success(&format!(
                        "Replaced {} (deploy record {})",
                        old_id, record_id
                    )),
                    ReplacementOutcome::NoDeployableInstance => print_warning(&format!(
                        "{} had no deployed instances",
                        old_id
                    )),
                }
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
