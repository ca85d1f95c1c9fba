/// Per-pane output log
///
/// Background workers never touch the visible log. They hold an
/// [`OutputQueue`] (the sending half of a channel) while the owning
/// [`OutputSink`] keeps the receiving half and moves queued lines into the
/// visible log on the UI thread via [`OutputSink::drain`].
use flume::{Receiver, Sender};
use strum::{AsRefStr, EnumIter};

/// Presentation tag attached to every output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Success,
    Plain,
}

impl Severity {
    /// Map a `log` level onto a pane tag. Debug and trace records have no tag
    /// because they are never shown in a pane.
    pub fn from_log_level(level: log::Level) -> Option<Self> {
        match level {
            log::Level::Error => Some(Severity::Error),
            log::Level::Warn => Some(Severity::Warning),
            log::Level::Info => Some(Severity::Info),
            log::Level::Debug | log::Level::Trace => None,
        }
    }
}

/// One printed segment of the log.
///
/// `terminator` is appended after `text`; an empty terminator keeps the next
/// segment on the same display row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub severity: Severity,
    pub terminator: String,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self::with_terminator(text, severity, "\n")
    }

    pub fn with_terminator(
        text: impl Into<String>,
        severity: Severity,
        terminator: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            severity,
            terminator: terminator.into(),
        }
    }
}

/// Cloneable, thread-safe handle used by producers to enqueue lines.
#[derive(Debug, Clone)]
pub struct OutputQueue {
    tx: Sender<OutputLine>,
}

impl OutputQueue {
    pub fn enqueue(&self, text: impl Into<String>, severity: Severity) {
        self.push(OutputLine::new(text, severity));
    }

    pub fn enqueue_with(
        &self,
        text: impl Into<String>,
        severity: Severity,
        terminator: impl Into<String>,
    ) {
        self.push(OutputLine::with_terminator(text, severity, terminator));
    }

    pub fn push(&self, line: OutputLine) {
        // The receiver only disappears when the pane is torn down.
        if self.tx.send(line).is_err() {
            log::debug!("output sink dropped, discarding queued line");
        }
    }
}

/// A contiguous run of text sharing one severity inside a display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub severity: Severity,
}

/// Visible log plus the receiving half of its delivery channel.
pub struct OutputSink {
    lines: Vec<OutputLine>,
    tx: Sender<OutputLine>,
    rx: Receiver<OutputLine>,
    scroll_pending: bool,
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            lines: Vec::new(),
            tx,
            rx,
            scroll_pending: false,
        }
    }

    /// Producer handle for workers and the logging bridge.
    pub fn queue(&self) -> OutputQueue {
        OutputQueue {
            tx: self.tx.clone(),
        }
    }

    pub fn print(&mut self, text: impl Into<String>, severity: Severity) {
        self.print_line(OutputLine::new(text, severity));
    }

    pub fn print_with(
        &mut self,
        text: impl Into<String>,
        severity: Severity,
        terminator: impl Into<String>,
    ) {
        self.print_line(OutputLine::with_terminator(text, severity, terminator));
    }

    fn print_line(&mut self, line: OutputLine) {
        self.lines.push(line);
        self.scroll_pending = true;
    }

    pub fn enqueue(&self, text: impl Into<String>, severity: Severity) {
        self.queue().enqueue(text, severity);
    }

    /// Move every currently queued line into the visible log, in FIFO order.
    ///
    /// Lines enqueued after the channel is observed empty are left for the
    /// next drain. Returns how many lines were printed.
    pub fn drain(&mut self) -> usize {
        let mut printed = 0;
        while let Ok(line) = self.rx.try_recv() {
            self.print_line(line);
            printed += 1;
        }
        printed
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_pending = true;
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines waiting in the channel.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Full visible text, terminators included.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{}{}", line.text, line.terminator))
            .collect()
    }

    /// Returns `true` once after each change to the visible log so the
    /// frontend can scroll to the newest row.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    /// Split the visible log into display rows.
    ///
    /// Newlines inside text or terminators end a row; empty segments are
    /// dropped. A trailing unterminated row is still returned.
    pub fn rows(&self) -> Vec<Vec<Segment<'_>>> {
        let mut rows = Vec::new();
        let mut current: Vec<Segment<'_>> = Vec::new();

        for line in &self.lines {
            for piece in [line.text.as_str(), line.terminator.as_str()] {
                let mut parts = piece.split('\n').peekable();
                while let Some(part) = parts.next() {
                    if !part.is_empty() {
                        current.push(Segment {
                            text: part,
                            severity: line.severity,
                        });
                    }
                    if parts.peek().is_some() {
                        rows.push(std::mem::take(&mut current));
                    }
                }
            }
        }

        if !current.is_empty() {
            rows.push(current);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_enqueue_order() {
        let mut sink = OutputSink::new();
        let queue = sink.queue();
        for i in 0..20 {
            queue.enqueue(format!("line {i}"), Severity::Plain);
        }
        assert_eq!(sink.drain(), 20);

        let texts: Vec<_> = sink.lines().iter().map(|l| l.text.clone()).collect();
        let expected: Vec<_> = (0..20).map(|i| format!("line {i}")).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn clear_then_drain_on_empty_queue_stays_empty() {
        let mut sink = OutputSink::new();
        sink.print("old", Severity::Info);
        sink.clear();
        assert_eq!(sink.drain(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn second_drain_is_noop() {
        let mut sink = OutputSink::new();
        sink.enqueue("a", Severity::Success);
        sink.drain();
        let before = sink.lines().to_vec();
        assert_eq!(sink.drain(), 0);
        assert_eq!(sink.lines(), before.as_slice());
    }

    #[test]
    fn enqueue_does_not_touch_visible_log() {
        let sink = OutputSink::new();
        sink.queue().enqueue("pending", Severity::Info);
        assert!(sink.is_empty());
        assert_eq!(sink.pending(), 1);
    }

    #[test]
    fn producers_on_other_threads_are_drained_in_order() {
        let mut sink = OutputSink::new();
        let queue = sink.queue();
        std::thread::spawn(move || {
            for i in 0..100 {
                queue.enqueue(i.to_string(), Severity::Plain);
            }
        })
        .join()
        .unwrap();

        sink.drain();
        let numbers: Vec<usize> = sink
            .lines()
            .iter()
            .map(|l| l.text.parse().unwrap())
            .collect();
        assert_eq!(numbers, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn rows_join_unterminated_segments() {
        let mut sink = OutputSink::new();
        sink.print_with("[12:00:00]", Severity::Plain, " ");
        sink.print("Test success", Severity::Success);
        sink.print_with("INFO", Severity::Info, "");
        sink.print(": Pinging device", Severity::Plain);

        let rows = sink.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                Segment {
                    text: "[12:00:00]",
                    severity: Severity::Plain
                },
                Segment {
                    text: " ",
                    severity: Severity::Plain
                },
                Segment {
                    text: "Test success",
                    severity: Severity::Success
                },
            ]
        );
        assert_eq!(rows[1][0].severity, Severity::Info);
        assert_eq!(sink.text(), "[12:00:00] Test success\nINFO: Pinging device\n");
    }

    #[test]
    fn scroll_request_is_consumed_once() {
        let mut sink = OutputSink::new();
        assert!(!sink.take_scroll_request());
        sink.print("x", Severity::Plain);
        assert!(sink.take_scroll_request());
        assert!(!sink.take_scroll_request());
    }
}
