use crate::llm::Message;

/// Split of a message list into the protected head, the slice to fold into a
/// summary, and the verbatim recent tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition<'a> {
    /// Primary system message, when the list starts with one
    pub head: Option<&'a Message>,
    pub old: &'a [Message],
    pub recent: &'a [Message],
}

impl<'a> Partition<'a> {
    /// Partition `messages`, keeping the last `keep_recent` verbatim.
    ///
    /// `keep_recent` is clamped so the slice never reaches into the head.
    pub fn new(messages: &'a [Message], keep_recent: usize) -> Self {
        let (head, body) = match messages.split_first() {
            Some((first, rest)) if first.is_system() => (Some(first), rest),
            _ => (None, messages),
        };
        let keep = keep_recent.min(body.len());
        let (old, recent) = body.split_at(body.len() - keep);
        Self { head, old, recent }
    }

    /// Whether there is anything to fold
    pub fn has_old(&self) -> bool {
        !self.old.is_empty()
    }
}
