//! Text snapshot with line bookkeeping.
//!
//! Positions follow LSP conventions: zero-based lines, columns counted in
//! UTF-16 code units. Offsets are byte offsets into the text.

use lsp_types::Position;

#[derive(Debug, Clone)]
pub struct TextDocument {
    uri: String,
    text: String,
    line_offsets: Vec<usize>,
}

impl TextDocument {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_offsets = compute_line_offsets(&text);
        Self {
            uri: uri.into(),
            text,
            line_offsets,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// Byte offset of `position`. Lines past the end clamp to the end of the
    /// text, columns past the end of a line clamp to the line end.
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        let Some(&line_start) = self.line_offsets.get(line) else {
            return self.text.len();
        };
        let line_end = self.line_end(line);
        let mut utf16 = 0usize;
        let mut offset = line_start;
        for c in self.text[line_start..line_end].chars() {
            if utf16 >= position.character as usize {
                break;
            }
            utf16 += c.len_utf16();
            offset += c.len_utf8();
        }
        offset
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let offset = self.clamp(offset);
        let line = match self.line_offsets.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let line_start = self.line_offsets[line];
        let character: usize = self.text[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();
        Position::new(line as u32, character as u32)
    }

    /// Up to `len` bytes ending at `offset`, widened to a char boundary.
    pub fn text_before(&self, offset: usize, len: usize) -> &str {
        let end = self.clamp(offset);
        let start = self.clamp(end.saturating_sub(len));
        &self.text[start..end]
    }

    /// Up to `len` bytes starting at `offset`, shortened to a char boundary.
    pub fn text_at(&self, offset: usize, len: usize) -> &str {
        let start = self.clamp(offset);
        let mut end = (start + len).min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        &self.text[start..end]
    }

    /// End of line `line`, excluding the line terminator.
    fn line_end(&self, line: usize) -> usize {
        let end = self
            .line_offsets
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let content = &self.text[self.line_offsets[line]..end];
        let trimmed = content.trim_end_matches(['\n', '\r']);
        self.line_offsets[line] + trimmed.len()
    }

    /// Clamps into the text and moves back onto a char boundary.
    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

fn compute_line_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => offsets.push(i + 1),
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => offsets.push(i + 1),
            _ => {}
        }
        i += 1;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_and_positions_agree() {
        let doc = TextDocument::new("file:///a.php", "<?php\n$x = 1;\r\n$y = 2;");
        assert_eq!(doc.line_count(), 3);
        let offset = doc.offset_at(Position::new(2, 1));
        assert_eq!(&doc.text()[offset..offset + 1], "y");
        assert_eq!(doc.position_at(offset), Position::new(2, 1));
    }

    #[test]
    fn columns_count_utf16_units() {
        let doc = TextDocument::new("file:///a.php", "$é = '😀';");
        let offset = doc.offset_at(Position::new(0, 8));
        assert_eq!(&doc.text()[offset..], "';");
        assert_eq!(doc.position_at(offset), Position::new(0, 8));
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let doc = TextDocument::new("file:///a.php", "ab\ncd");
        assert_eq!(doc.offset_at(Position::new(0, 99)), 2);
        assert_eq!(doc.offset_at(Position::new(9, 0)), 5);
        assert_eq!(doc.position_at(99), Position::new(1, 2));
    }

    #[test]
    fn text_before_respects_char_boundaries() {
        let doc = TextDocument::new("file:///a.php", "$é->");
        let end = doc.text().len();
        assert_eq!(doc.text_before(end, 2), "->");
        assert_eq!(doc.text_before(end, 3), "é->");
        assert_eq!(doc.text_before(end, 100), "$é->");
        assert_eq!(doc.text_at(0, 2), "$");
    }
}
