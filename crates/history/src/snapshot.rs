/// Append-only snapshot storage for one tracked subject.
///
/// Snapshots are written at the end and read back by offset. Offsets grow
/// monotonically and stay valid for the life of the log: reading at an
/// offset previously returned by [`write_offset`](Self::write_offset) yields
/// the bytes written there, followed by whatever was appended later (subject
/// snapshots are self-delimiting, so trailing bytes are harmless).
#[derive(Debug, Default)]
pub struct SnapshotLog {
    buf: Vec<u8>,
}

impl SnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next appended snapshot will start at.
    pub fn write_offset(&self) -> usize {
        self.buf.len()
    }

    /// The underlying buffer, for appending one snapshot at the end.
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    /// The bytes from `offset` to the end of the log.
    ///
    /// Offsets come only from [`write_offset`](Self::write_offset); anything
    /// else is a corrupted history state.
    pub fn read_at(&self, offset: usize) -> &[u8] {
        assert!(
            offset <= self.buf.len(),
            "snapshot offset {offset} out of range (log is {} bytes)",
            self.buf.len()
        );
        &self.buf[offset..]
    }

    /// Total bytes stored.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
