//! Candidate source - streaming a password list line by line
//!
//! The list may be far larger than memory, so it is never loaded whole.
//! Bytes that are not valid UTF-8 are dropped from the line they appear
//! in; blank lines are skipped.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use lockpick_common::{Candidate, LockpickResult};

pub struct CandidateReader {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl CandidateReader {
    pub async fn open(path: &Path) -> LockpickResult<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            reader: BufReader::new(file),
            buf: Vec::with_capacity(256),
        })
    }

    /// Next non-empty candidate, or `None` at end of input.
    pub async fn next_candidate(&mut self) -> LockpickResult<Option<Candidate>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }
            let line = decode_ignoring_invalid(&self.buf);
            if let Some(candidate) = Candidate::from_line(&line) {
                return Ok(Some(candidate));
            }
        }
    }

    /// Up to `size` candidates in source order; empty at end of input.
    pub async fn next_batch(&mut self, size: usize) -> LockpickResult<Vec<Candidate>> {
        let mut batch = Vec::with_capacity(size);
        while batch.len() < size {
            match self.next_candidate().await? {
                Some(candidate) => batch.push(candidate),
                None => break,
            }
        }
        Ok(batch)
    }
}

/// Pre-pass over the source counting the candidates it will yield.
pub async fn count_candidates(path: &Path) -> LockpickResult<usize> {
    let mut reader = CandidateReader::open(path).await?;
    let mut total = 0;
    while reader.next_candidate().await?.is_some() {
        total += 1;
    }
    Ok(total)
}

fn decode_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    out.push_str(valid);
                }
                // truncated sequence at the very end: drop the rest
                let skip = e.error_len().unwrap_or(rest.len());
                bytes = &rest[skip..];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn decode_drops_invalid_bytes() {
        assert_eq!(decode_ignoring_invalid(b"pass\xffword"), "password");
        assert_eq!(decode_ignoring_invalid(b"caf\xc3\xa9"), "café");
        assert_eq!(decode_ignoring_invalid(b"tail\xe2\x82"), "tail");
        assert_eq!(decode_ignoring_invalid(b"\x80\x80"), "");
    }

    #[tokio::test]
    async fn reads_candidates_in_order_skipping_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pw.txt");
        fs::write(&path, b"aaa\r\n\nbbb\n  \n\xffccc").unwrap();

        let mut reader = CandidateReader::open(&path).await.unwrap();
        let batch = reader.next_batch(10).await.unwrap();
        let words: Vec<&str> = batch.iter().map(Candidate::as_str).collect();
        assert_eq!(words, vec!["aaa", "bbb", "  ", "ccc"]);
        assert!(reader.next_batch(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batches_respect_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pw.txt");
        fs::write(&path, "a\nb\nc\nd\ne\n").unwrap();

        let mut reader = CandidateReader::open(&path).await.unwrap();
        assert_eq!(reader.next_batch(2).await.unwrap().len(), 2);
        assert_eq!(reader.next_batch(2).await.unwrap().len(), 2);
        assert_eq!(reader.next_batch(2).await.unwrap().len(), 1);
        assert!(reader.next_batch(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_matches_yielded_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pw.txt");
        fs::write(&path, "one\n\ntwo\nthree").unwrap();
        assert_eq!(count_candidates(&path).await.unwrap(), 3);

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "").unwrap();
        assert_eq!(count_candidates(&empty).await.unwrap(), 0);
    }
}
