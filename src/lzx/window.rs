//! The rolling dictionary window LZX matches reference into.

use super::error::LzxError;

pub(crate) struct Window {
    buf: Box<[u8]>,
    posn: usize,
}

impl Window {
    pub(crate) fn new(window_size: usize) -> Self {
        Self {
            buf: vec![0u8; window_size].into_boxed_slice(),
            posn: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn push(&mut self, byte: u8) {
        self.buf[self.posn] = byte;
        self.posn = (self.posn + 1) % self.buf.len();
    }

    /// Copies `length` bytes starting `offset` bytes behind the current
    /// write position. Byte-by-byte so that overlapping runs (offset <
    /// length) correctly repeat the just-written bytes, LZSS-style.
    pub(crate) fn copy_match(&mut self, offset: usize, length: usize) -> Result<(), LzxError> {
        let n = self.buf.len();
        if offset == 0 || offset > n {
            return Err(LzxError::WindowRunOverflow);
        }
        for _ in 0..length {
            let src = (self.posn + n - offset) % n;
            let b = self.buf[src];
            self.push(b);
        }
        Ok(())
    }

    /// Returns the last `frame_size` bytes written, as a contiguous slice.
    /// Requires the window to hold at least that many bytes without
    /// wrapping across the read, i.e. `frame_size <= window size`.
    pub(crate) fn output_slice(&self, frame_size: usize) -> Result<&[u8], LzxError> {
        let n = self.buf.len();
        if frame_size > n {
            return Err(LzxError::WindowRunOverflow);
        }
        let end = if self.posn == 0 { n } else { self.posn };
        let start = end - frame_size;
        Ok(&self.buf[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_push_then_slice() {
        let mut w = Window::new(8);
        for b in [1u8, 2, 3, 4] {
            w.push(b);
        }
        assert_eq!(w.output_slice(4).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn overlapping_match_repeats() {
        let mut w = Window::new(8);
        w.push(0xAA);
        // offset=1, length=3 repeats the just-written byte three times.
        w.copy_match(1, 3).unwrap();
        assert_eq!(w.output_slice(4).unwrap(), &[0xAA, 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn wraps_around_window_boundary() {
        let mut w = Window::new(4);
        for b in [1u8, 2, 3, 4, 5] {
            w.push(b);
        }
        // Window only holds the last 4 bytes written: 2,3,4,5.
        assert_eq!(w.output_slice(4).unwrap(), &[2, 3, 4, 5]);
    }

    #[test]
    fn offset_past_window_size_errors() {
        let mut w = Window::new(4);
        w.push(1);
        assert!(matches!(
            w.copy_match(5, 1),
            Err(LzxError::WindowRunOverflow)
        ));
    }
}
