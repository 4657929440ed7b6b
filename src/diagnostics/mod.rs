pub mod errors;
pub mod location;
pub mod warnings;

pub use errors::{CompileError, ErrorKind, ErrorList, ErrorMetaDataKey};
pub use location::SourceLocation;
pub use warnings::{CompileWarning, WarningKind, WarningList};

/// Render accumulated warnings then errors to stdout, matching §6/§7's ordering contract
/// (warnings surfaced first, both sorted by `(filename, line)`).
pub fn print_diagnostics(warnings: WarningList, errors: ErrorList) {
    for warning in warnings.sorted() {
        println!(
            "warning: {} ({}) --> {}:{}",
            warning.msg,
            warning.kind.as_str(),
            warning.location.file.display(),
            warning.location.start.line
        );
    }

    for error in errors.sorted() {
        println!(
            "error[{}]: {} --> {}:{}",
            error.kind.as_str(),
            error.msg,
            error.location.file.display(),
            error.location.start.line
        );
        if let Some(trace) = &error.trace {
            println!("  {}", trace.title);
            for line in &trace.lines {
                println!("    {}", line);
            }
        }
    }
}
