//! Output emitter abstraction.

/// Trait for emitting generated text.
///
/// The printer writes to an emitter during rendering; the string-backed
/// implementation covers in-memory emission, which is all the pipeline
/// needs, while keeping file-backed emitters possible.
pub trait Emitter {
    /// Emit a text fragment.
    fn emit(&mut self, text: &str);

    /// Emit a newline (Unix-style `\n`).
    fn emit_newline(&mut self);

    /// Emit indentation as the given number of spaces.
    fn emit_indent(&mut self, spaces: usize);
}

/// String-based emitter for in-memory emission.
#[derive(Default)]
pub struct StringEmitter {
    buffer: String,
}

impl StringEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Current buffer contents without consuming.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Ensure the output ends with exactly one newline.
    pub fn ensure_trailing_newline(&mut self) {
        while self.buffer.ends_with("\n\n") {
            self.buffer.pop();
        }
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
    }

    /// Take the finished output.
    pub fn output(self) -> String {
        self.buffer
    }
}

impl Emitter for StringEmitter {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn emit_newline(&mut self) {
        self.buffer.push('\n');
    }

    fn emit_indent(&mut self, spaces: usize) {
        for _ in 0..spaces {
            self.buffer.push(' ');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_fragments_in_order() {
        let mut emitter = StringEmitter::new();
        emitter.emit("local x");
        emitter.emit(" = 1");
        emitter.emit_newline();
        assert_eq!(emitter.as_str(), "local x = 1\n");
    }

    #[test]
    fn trailing_newline_is_normalized() {
        let mut emitter = StringEmitter::new();
        emitter.emit("end\n\n\n");
        emitter.ensure_trailing_newline();
        assert_eq!(emitter.output(), "end\n");
    }
}
