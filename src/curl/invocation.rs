use crate::error::InvocationError;

use super::timing::WRITE_OUT;

pub const DEFAULT_CURL_BIN: &str = "curl";

/// Options every probe runs with: silent, verbose trace with capture times,
/// headers echoed, body discarded, and the machine-readable summary.
const FIXED_OPTIONS: [&str; 6] = ["-s", "-v", "-i", "-o", "/dev/null", "--trace-time"];

/// How curl is invoked for one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlInvocation {
    pub program: String,
    pub target: String,
    extra: Vec<String>,
}

impl CurlInvocation {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_CURL_BIN.to_string(),
            target: target.into(),
            extra: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Appends raw extra options, e.g. `-H 'Pragma: akamai-x-cache-on'`,
    /// split the way a POSIX shell would.
    pub fn with_extra_options(mut self, options: &str) -> Result<Self, InvocationError> {
        let split = shlex::split(options)
            .ok_or_else(|| InvocationError::UnbalancedQuotes(options.to_string()))?;
        self.extra.extend(split);
        Ok(self)
    }

    /// Adds one `-H <header>` pair per header.
    pub fn with_headers<S: AsRef<str>>(mut self, headers: &[S]) -> Self {
        for header in headers {
            self.extra.push("-H".to_string());
            self.extra.push(header.as_ref().to_string());
        }
        self
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.target.clone()];
        args.extend(FIXED_OPTIONS.iter().map(|o| o.to_string()));
        args.push("-w".to_string());
        args.push(WRITE_OUT.to_string());
        args.extend(self.extra.iter().cloned());
        args
    }

    /// The invocation as a copy-pasteable shell command.
    pub fn command_line(&self) -> String {
        let args = self.args();
        let words = std::iter::once(self.program.as_str()).chain(args.iter().map(String::as_str));
        shlex::try_join(words).unwrap_or_else(|_| {
            // Only NUL bytes are rejected; show the raw words instead.
            format!("{} {}", self.program, args.join(" "))
        })
    }
}
