//! Recorded responses shared by the benchmarks.

/// How a fixture frames its body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    ContentLength,
    Chunked,
}

#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    name: &'static str,
    framing: Framing,
    file: ResponseFile,
}

impl Fixture {
    pub fn new(name: &'static str, framing: Framing, file: ResponseFile) -> Self {
        Self { name, framing, file }
    }

    pub fn sized(name: &'static str, file: ResponseFile) -> Self {
        Self::new(name, Framing::ContentLength, file)
    }

    pub fn chunked(name: &'static str, file: ResponseFile) -> Self {
        Self::new(name, Framing::Chunked, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn file(&self) -> &ResponseFile {
        &self.file
    }

    /// The raw response repeated `times`, as it would arrive on a reused connection.
    pub fn pipelined(&self, times: usize) -> Vec<u8> {
        self.file.content.as_bytes().repeat(times)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ResponseFile {
    file_name: &'static str,
    content: &'static str,
}

impl ResponseFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}
