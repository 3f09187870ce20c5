//! Incremental decoding of a top-level JSON array.
//!
//! [`ArraySplitter`] is fed one byte at a time and cuts out the raw bytes of
//! each array element; [`RecordReader`] pulls chunks from a [`ByteSource`]
//! only when the current element is not complete yet, so at most one chunk
//! plus one element is held in memory.

use crate::domain::model::LocationRecord;
use crate::domain::ports::ByteSource;
use crate::utils::encoding::TextEncoding;
use crate::utils::error::{LookupError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening `[`; `bom` counts the byte order mark bytes seen so far.
    Start { bom: usize },
    /// After `[` or `,`, waiting for an element (or `]` right after `[`).
    BeforeElement { first: bool },
    InElement,
    /// After a complete element, waiting for `,` or `]`.
    AfterElement,
    Done,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Element(Vec<u8>),
    End,
}

#[derive(Debug)]
pub struct ArraySplitter {
    state: State,
    element: Vec<u8>,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Default for ArraySplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArraySplitter {
    pub fn new() -> Self {
        Self {
            state: State::Start { bom: 0 },
            element: Vec::new(),
            depth: 0,
            in_string: false,
            escaped: false,
        }
    }

    pub fn is_started(&self) -> bool {
        !matches!(self.state, State::Start { .. })
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    pub fn push(&mut self, byte: u8) -> Result<Option<Event>> {
        match self.state {
            State::Start { bom } => match byte {
                b if bom < UTF8_BOM.len() && b == UTF8_BOM[bom] => {
                    self.state = State::Start { bom: bom + 1 };
                    Ok(None)
                }
                other if bom > 0 && bom < UTF8_BOM.len() => {
                    Err(unexpected(other, "incomplete byte order mark"))
                }
                b if b.is_ascii_whitespace() => {
                    self.state = State::Start {
                        bom: UTF8_BOM.len(),
                    };
                    Ok(None)
                }
                b'[' => {
                    self.state = State::BeforeElement { first: true };
                    Ok(None)
                }
                other => Err(unexpected(other, "expected `[` at the start of the response")),
            },
            State::BeforeElement { first } => match byte {
                b if b.is_ascii_whitespace() => Ok(None),
                b']' if first => {
                    self.state = State::Done;
                    Ok(Some(Event::End))
                }
                b']' | b',' => Err(unexpected(byte, "expected an array element")),
                _ => {
                    self.state = State::InElement;
                    self.push_element_byte(byte)
                }
            },
            State::InElement => self.push_element_byte(byte),
            State::AfterElement => match byte {
                b if b.is_ascii_whitespace() => Ok(None),
                b',' => {
                    self.state = State::BeforeElement { first: false };
                    Ok(None)
                }
                b']' => {
                    self.state = State::Done;
                    Ok(Some(Event::End))
                }
                other => Err(unexpected(other, "expected `,` or `]` after an element")),
            },
            State::Done => Ok(None),
        }
    }

    fn push_element_byte(&mut self, byte: u8) -> Result<Option<Event>> {
        if self.in_string {
            self.element.push(byte);
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
                if self.depth == 0 {
                    return Ok(Some(self.finish_element(State::AfterElement)));
                }
            }
            return Ok(None);
        }

        match byte {
            b'"' => {
                self.in_string = true;
                self.element.push(byte);
            }
            b'{' | b'[' => {
                self.depth += 1;
                self.element.push(byte);
            }
            b'}' | b']' if self.depth > 0 => {
                self.depth -= 1;
                self.element.push(byte);
                if self.depth == 0 {
                    return Ok(Some(self.finish_element(State::AfterElement)));
                }
            }
            // A bare scalar (number, literal) ends at the next delimiter.
            b',' if self.depth == 0 => {
                return Ok(Some(self.finish_element(State::BeforeElement { first: false })));
            }
            b']' => return Ok(Some(self.finish_element(State::Done))),
            b if b.is_ascii_whitespace() && self.depth == 0 => {
                return Ok(Some(self.finish_element(State::AfterElement)));
            }
            b'}' => return Err(unexpected(byte, "unbalanced `}`")),
            _ => self.element.push(byte),
        }
        Ok(None)
    }

    fn finish_element(&mut self, next: State) -> Event {
        self.state = next;
        Event::Element(std::mem::take(&mut self.element))
    }
}

fn unexpected(byte: u8, expectation: &str) -> LookupError {
    LookupError::malformed_json(format!(
        "{}, found {:?}",
        expectation,
        char::from(byte)
    ))
}

/// Lazily yields the records of a JSON array read from `S`.
pub struct RecordReader<S: ByteSource> {
    source: S,
    encoding: TextEncoding,
    splitter: ArraySplitter,
    chunk: Vec<u8>,
    pos: usize,
}

impl<S: ByteSource> RecordReader<S> {
    pub fn new(source: S, encoding: TextEncoding) -> Self {
        Self {
            source,
            encoding,
            splitter: ArraySplitter::new(),
            chunk: Vec::new(),
            pos: 0,
        }
    }

    /// Reads up to and including the opening `[`. Fails if the stream is not an array.
    pub async fn begin_array(&mut self) -> Result<()> {
        if !self.splitter.is_started() {
            self.next_event().await?;
        }
        Ok(())
    }

    /// Decodes the next element, or returns `None` after the closing `]`.
    pub async fn next_record(&mut self) -> Result<Option<LocationRecord>> {
        loop {
            if self.splitter.is_done() {
                return Ok(None);
            }
            match self.next_event().await? {
                Some(Event::Element(bytes)) => return self.decode(&bytes).map(Some),
                Some(Event::End) => return Ok(None),
                None => continue,
            }
        }
    }

    /// Feeds bytes to the splitter until it emits an event. Before the array
    /// has started, also returns once the opening `[` is consumed.
    async fn next_event(&mut self) -> Result<Option<Event>> {
        let was_started = self.splitter.is_started();
        loop {
            while self.pos < self.chunk.len() {
                let byte = self.chunk[self.pos];
                self.pos += 1;
                if let Some(event) = self.splitter.push(byte)? {
                    return Ok(Some(event));
                }
                if !was_started && self.splitter.is_started() {
                    return Ok(None);
                }
            }

            match self.source.next_chunk().await? {
                Some(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                None if !self.splitter.is_started() => {
                    return Err(LookupError::malformed_json(
                        "response ended before the opening `[`",
                    ))
                }
                None => {
                    return Err(LookupError::malformed_json(
                        "response ended before the closing `]`",
                    ))
                }
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<LocationRecord> {
        let text = self.encoding.decode(bytes)?;
        let record: Option<LocationRecord> = serde_json::from_str(&text)?;
        record.ok_or(LookupError::MissingField { field: "record" })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Serves predefined chunks, optionally failing once they run out.
    pub(crate) struct ChunkSource {
        chunks: VecDeque<Vec<u8>>,
        fail_at_end: bool,
    }

    impl ChunkSource {
        pub(crate) fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                fail_at_end: false,
            }
        }

        /// Splits `body` into chunks of `size` bytes.
        pub(crate) fn sized(body: &str, size: usize) -> Self {
            Self {
                chunks: body.as_bytes().chunks(size).map(|c| c.to_vec()).collect(),
                fail_at_end: false,
            }
        }

        pub(crate) fn failing(mut self) -> Self {
            self.fail_at_end = true;
            self
        }
    }

    #[async_trait]
    impl ByteSource for ChunkSource {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(chunk)),
                None if self.fail_at_end => Err(LookupError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                ))),
                None => Ok(None),
            }
        }
    }

    const BERLIN: &str = r#"{"_id":376217,"name":"Berlin","type":"location","geo_position":{"latitude":"52.52437","longitude":"13.41053"}}"#;

    async fn read_all(source: ChunkSource) -> Result<Vec<LocationRecord>> {
        let mut reader = RecordReader::new(source, TextEncoding::Utf8);
        reader.begin_array().await?;
        let mut records = Vec::new();
        while let Some(record) = reader.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    fn split_all(body: &str) -> Result<Vec<Event>> {
        let mut splitter = ArraySplitter::new();
        let mut events = Vec::new();
        for byte in body.bytes() {
            if let Some(event) = splitter.push(byte)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    #[test]
    fn test_splitter_handles_nested_and_string_delimiters() {
        let events = split_all(r#" [ {"a":"x],}\"{"}, [1,[2]] , 3 ,"s"]"#).unwrap();

        assert_eq!(
            events,
            vec![
                Event::Element(br#"{"a":"x],}\"{"}"#.to_vec()),
                Event::Element(b"[1,[2]]".to_vec()),
                Event::Element(b"3".to_vec()),
                Event::Element(br#""s""#.to_vec()),
                Event::End,
            ]
        );
    }

    #[test]
    fn test_splitter_scalar_before_closing_bracket() {
        let events = split_all("[1,2]").unwrap();
        assert_eq!(
            events,
            vec![
                Event::Element(b"1".to_vec()),
                Event::Element(b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn test_splitter_skips_leading_byte_order_mark() {
        assert_eq!(split_all("\u{feff}[]").unwrap(), vec![Event::End]);
        assert_eq!(
            split_all("\u{feff} [1]").unwrap(),
            vec![Event::Element(b"1".to_vec())]
        );
        assert!(split_all(" \u{feff}[]").is_err());
        assert!(split_all("\u{feff}\u{feff}[]").is_err());
    }

    #[test]
    fn test_splitter_rejects_non_array() {
        assert!(split_all(r#"{"_id":1}"#).is_err());
        assert!(split_all("[1,,2]").is_err());
        assert!(split_all("[1,]").is_err());
        assert!(split_all(r#"[{"a":1} {"a":2}]"#).is_err());
    }

    #[tokio::test]
    async fn test_reads_single_record() {
        let records = read_all(ChunkSource::new(&["[", BERLIN, "]"])).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Berlin");
    }

    #[tokio::test]
    async fn test_reads_across_tiny_chunks() {
        let body = format!("[{},\n {}]", BERLIN, BERLIN.replace("Berlin", "Berlin, Ost"));
        let records = read_all(ChunkSource::sized(&body, 3)).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Berlin, Ost");
    }

    #[tokio::test]
    async fn test_byte_order_mark_split_across_chunks() {
        let body = format!("\u{feff}[{}]", BERLIN);
        let records = read_all(ChunkSource::sized(&body, 2)).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 376217);
    }

    #[tokio::test]
    async fn test_empty_array() {
        let records = read_all(ChunkSource::new(&["  [ ]"])).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_lazy_pull_stops_at_closing_bracket() {
        let source = ChunkSource::new(&["[", BERLIN, "]"]).failing();
        let mut reader = RecordReader::new(source, TextEncoding::Utf8);
        reader.begin_array().await.unwrap();

        assert!(reader.next_record().await.unwrap().is_some());
        assert!(reader.next_record().await.unwrap().is_none());
        assert!(reader.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_not_an_array_fails_on_begin() {
        let mut reader = RecordReader::new(ChunkSource::new(&[BERLIN]), TextEncoding::Utf8);
        let result = reader.begin_array().await;
        assert!(matches!(result, Err(LookupError::MalformedJson { .. })));
    }

    #[tokio::test]
    async fn test_empty_body_fails_on_begin() {
        let mut reader = RecordReader::new(ChunkSource::new(&[]), TextEncoding::Utf8);
        assert!(reader.begin_array().await.is_err());
    }

    #[tokio::test]
    async fn test_truncated_after_first_element() {
        let body = format!(r#"[{},{{"_id":2,"na"#, BERLIN);
        let mut reader = RecordReader::new(ChunkSource::sized(&body, 16), TextEncoding::Utf8);
        reader.begin_array().await.unwrap();

        assert_eq!(reader.next_record().await.unwrap().unwrap().id, 376217);
        assert!(matches!(
            reader.next_record().await,
            Err(LookupError::MalformedJson { .. })
        ));
    }

    #[tokio::test]
    async fn test_source_error_is_propagated() {
        let source = ChunkSource::new(&["[", BERLIN, ","]).failing();
        let mut reader = RecordReader::new(source, TextEncoding::Utf8);
        reader.begin_array().await.unwrap();

        assert!(reader.next_record().await.unwrap().is_some());
        assert!(matches!(reader.next_record().await, Err(LookupError::Io(_))));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_malformed() {
        let result = read_all(ChunkSource::new(&[r#"[{"_id":"x"}]"#])).await;
        assert!(matches!(result, Err(LookupError::MalformedJson { .. })));
    }

    #[tokio::test]
    async fn test_null_element_is_missing_record() {
        let result = read_all(ChunkSource::new(&["[null]"])).await;
        assert!(matches!(
            result,
            Err(LookupError::MissingField { field: "record" })
        ));
    }

    #[tokio::test]
    async fn test_latin1_body() {
        let mut body = b"[{\"_id\":1,\"name\":\"M".to_vec();
        body.push(0xfc);
        body.extend_from_slice(
            b"nchen\",\"type\":\"location\",\"geo_position\":{\"latitude\":\"48.1\",\"longitude\":\"11.5\"}}]",
        );
        let source = ChunkSource {
            chunks: VecDeque::from(vec![body]),
            fail_at_end: false,
        };
        let mut reader = RecordReader::new(source, TextEncoding::Latin1);
        reader.begin_array().await.unwrap();

        let record = reader.next_record().await.unwrap().unwrap();
        assert_eq!(record.name, "München");
    }
}
