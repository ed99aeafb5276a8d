/// Traversal position over one form.
///
/// `position` is `None` before the first question. `repetition` is set while the
/// field at `position` is being repeated and counts the entries accepted so far,
/// which is also the index of the next entry. `filled` records whether the
/// group entry in progress at `position` has produced a value yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub(crate) position: Option<usize>,
    pub(crate) repetition: Option<usize>,
    pub(crate) filled: bool,
}

impl Cursor {
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn repetition(&self) -> Option<usize> {
        self.repetition
    }

    pub fn is_started(&self) -> bool {
        self.position.is_some()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Marks the first field as already answered.
    pub(crate) fn skip_first(&mut self) {
        self.position = Some(0);
        self.repetition = None;
        self.filled = false;
    }

    /// Opens a repetition if none is running and returns the index of the next entry.
    pub(crate) fn enter_repetition(&mut self) -> usize {
        *self.repetition.get_or_insert(0)
    }

    pub(crate) fn accept_entry(&mut self) {
        if let Some(n) = self.repetition.as_mut() {
            *n += 1;
        }
    }

    pub(crate) fn close_repetition(&mut self) {
        self.repetition = None;
    }

    pub(crate) fn mark_filled(&mut self) {
        self.filled = true;
    }

    /// Whether the finished entry produced a value; clears the flag for the next one.
    pub(crate) fn take_filled(&mut self) -> bool {
        std::mem::take(&mut self.filled)
    }
}
