//! Result sink protocol between an engine and its caller.
//!
//! An engine announces, per [`SinkType`], which [`SinkClass`]es it can
//! produce; the collector answers with the classes it accepts in order of
//! preference, and the engine emits through the first one it can supply.

use std::fmt;

/// What the engine is emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkType {
    /// Regenerated source.
    Java,
    /// Something went wrong while regenerating.
    Exception,
    Summary,
    Progress,
}

/// Shape of what the engine is emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkClass {
    /// Structured result: source text with the package and class it declares.
    Decompiled,
    /// Plain text.
    String,
}

/// Sink classes accepted for `sink_type`, most preferred first.
///
/// Structured results are only asked for when regenerated source is offered
/// and the engine can produce them. Plain text is always acceptable, so any
/// engine able to emit text can be used.
pub fn preferences(sink_type: SinkType, available: &[SinkClass]) -> Vec<SinkClass> {
    if sink_type == SinkType::Java && available.contains(&SinkClass::Decompiled) {
        vec![SinkClass::Decompiled, SinkClass::String]
    } else {
        vec![SinkClass::String]
    }
}

/// The engine side of the negotiation: first accepted class it can supply.
pub fn negotiate(accepted: &[SinkClass], available: &[SinkClass]) -> Option<SinkClass> {
    accepted.iter().copied().find(|class| available.contains(class))
}

/// One regenerated compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decompiled {
    pub package: Option<String>,
    pub class_name: Option<String>,
    pub java: String,
}
impl Decompiled {
    pub fn new(package: Option<String>, class_name: Option<String>, java: impl Into<String>) -> Self {
        Self {
            package,
            class_name,
            java: java.into(),
        }
    }

    /// Plain source text with no structural information.
    pub fn text(java: impl Into<String>) -> Self {
        Self::new(None, None, java)
    }
}

/// Payload of one emission, matching the negotiated [`SinkClass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Decompiled(Decompiled),
    Text(String),
}
impl Output {
    pub fn class(&self) -> SinkClass {
        match self {
            Self::Decompiled(_) => SinkClass::Decompiled,
            Self::Text(_) => SinkClass::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// Everything one engine run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationResult {
    pub sources: Vec<Decompiled>,
    pub diagnostics: Vec<Diagnostic>,
}
impl RegenerationResult {
    /// The source to keep. Engines are expected to produce exactly one; any
    /// extra results are ignored.
    pub fn primary(&self) -> Option<&Decompiled> {
        if self.sources.len() > 1 {
            tracing::warn!(results = self.sources.len(), "Engine produced more than one result, keeping the first");
        }
        self.sources.first()
    }

    pub fn into_primary(self) -> Option<Decompiled> {
        if self.sources.len() > 1 {
            tracing::warn!(results = self.sources.len(), "Engine produced more than one result, keeping the first");
        }
        self.sources.into_iter().next()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }
}

/// Collects what one engine run emits.
///
/// Diagnostics are kept whether or not a source was produced, so a failed run
/// can still be explained.
#[derive(Debug, Default)]
pub struct ResultCollector {
    sources: Vec<Decompiled>,
    diagnostics: Vec<Diagnostic>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`preferences`].
    pub fn supported_sinks(&self, sink_type: SinkType, available: &[SinkClass]) -> Vec<SinkClass> {
        let accepted = preferences(sink_type, available);
        tracing::trace!(?sink_type, ?available, ?accepted, "Sink negotiation");
        accepted
    }

    pub fn accept(&mut self, sink_type: SinkType, output: Output) {
        match (sink_type, output) {
            (SinkType::Java, Output::Decompiled(decompiled)) => self.sources.push(decompiled),
            // Engine could only offer plain text; it is still the source.
            (SinkType::Java, Output::Text(java)) => self.sources.push(Decompiled::text(java)),
            (SinkType::Exception, Output::Text(message)) => self.warn(message),
            (SinkType::Exception, Output::Decompiled(d)) => self.warn(d.java),
            (SinkType::Summary | SinkType::Progress, Output::Text(message)) => self.info(message),
            (SinkType::Summary | SinkType::Progress, Output::Decompiled(d)) => self.info(d.java),
        }
    }

    /// Record an engine failure as a warning diagnostic.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.accept(SinkType::Exception, Output::Text(message.into()));
    }

    pub fn sources(&self) -> &[Decompiled] {
        &self.sources
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn finish(self) -> RegenerationResult {
        RegenerationResult {
            sources: self.sources,
            diagnostics: self.diagnostics,
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(message = %message, "Decompiler reported a problem");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    fn info(&mut self, message: String) {
        tracing::info!(message = %message, "Decompiler");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Info,
            message,
        });
    }
}
