use form_spec::{Diagnostic, TemplateReport, TemplateStatus};

/// Controls how much build feedback is printed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Verbosity {
    /// Counts only.
    Clean,
    /// Every skipped descriptor and template outcome.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints build feedback on stderr so rendered output stays on stdout.
pub struct BuildReporter {
    verbosity: Verbosity,
}

impl BuildReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn show_diagnostics(&self, diagnostics: &[Diagnostic]) {
        if let Some(line) = self.diagnostics_summary(diagnostics) {
            eprintln!("{}", line);
        }
        if self.verbosity.is_verbose() {
            for diagnostic in diagnostics {
                eprintln!("  {}", diagnostic);
            }
        }
    }

    pub fn show_templates(&self, reports: &[TemplateReport]) {
        for report in reports {
            if let Some(line) = self.template_line(report) {
                eprintln!("{}", line);
            }
        }
    }

    fn diagnostics_summary(&self, diagnostics: &[Diagnostic]) -> Option<String> {
        match diagnostics.len() {
            0 => None,
            count if self.verbosity.is_verbose() => Some(format!("Skipped descriptors ({}):", count)),
            count => Some(format!(
                "Skipped {} descriptor(s); rerun with --verbose for details.",
                count
            )),
        }
    }

    fn template_line(&self, report: &TemplateReport) -> Option<String> {
        match &report.status {
            TemplateStatus::Settled if self.verbosity.is_verbose() => {
                Some(format!("Template {} applied to '{}'", report.path, report.field))
            }
            TemplateStatus::Settled => None,
            TemplateStatus::Failed(message) => Some(format!(
                "Template for '{}' left pending: {}",
                report.field, message
            )),
            TemplateStatus::Unavailable => Some(format!(
                "Template for '{}' not loaded ({}); pass --templates or set {}",
                report.field,
                report.path,
                crate::TEMPLATES_ENV
            )),
        }
    }
}
