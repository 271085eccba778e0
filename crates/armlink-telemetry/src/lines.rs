/// Default cap on a buffered partial line.
pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

/// Reassembles lines from arbitrarily split chunks.
///
/// Bytes are buffered until `\n`, so neither a line nor a multi-byte
/// character is cut at a chunk boundary. Invalid UTF-8 is replaced, never
/// rejected. A partial line longer than the cap is emitted as is.
#[derive(Debug)]
pub struct LineAssembler {
    pending: Vec<u8>,
    max_line: usize,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE)
    }
}

impl LineAssembler {
    pub fn new(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line: max_line.max(1),
        }
    }

    /// Feed a chunk; returns the lines it completed, without line endings.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                lines.push(self.take());
                continue;
            }
            self.pending.push(byte);
            if self.pending.len() >= self.max_line {
                lines.push(self.take());
            }
        }
        lines
    }

    /// Emit whatever is buffered, e.g. when the connection drops.
    pub fn flush(&mut self) -> Option<String> {
        (!self.pending.is_empty()).then(|| self.take())
    }

    fn take(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
