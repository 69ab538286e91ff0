//! Byte scanners for the engine's numeric payload encodings.
//!
//! Scanning never fails: unexpected bytes end the current list, and values that do
//! not fit in 64 bits wrap.

use model::{Rect, Twips};

#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn at_digit(&self) -> bool {
        self.peek().is_some_and(|byte| byte.is_ascii_digit())
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    pub fn skip_non_numeric(&mut self) {
        while self.peek().is_some_and(|byte| !byte.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    /// Reads a run of decimal digits. An empty run reads as 0.
    pub fn parse_u64(&mut self) -> u64 {
        let mut value: u64 = 0;
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            value = value.wrapping_mul(10).wrapping_add(u64::from(byte - b'0'));
            self.pos += 1;
        }
        value
    }

    /// Reads `a,b,c` up to and including an optional `;`.
    pub fn parse_csv(&mut self) -> Vec<u64> {
        let mut values = Vec::new();
        while let Some(byte) = self.peek() {
            if byte == b';' {
                self.pos += 1;
                break;
            }
            if byte == b',' {
                self.pos += 1;
            }
            self.skip_whitespace();
            if !self.at_digit() {
                return values;
            }
            values.push(self.parse_u64());
        }
        values
    }

    /// Reads `;`-separated lists until the input is exhausted or a segment stalls.
    pub fn parse_multiple_csv(&mut self) -> Vec<Vec<u64>> {
        let mut rows = Vec::new();
        while !self.is_at_end() {
            let start = self.pos;
            let row = self.parse_csv();
            if self.pos == start {
                break;
            }
            rows.push(row);
        }
        rows
    }

    /// Reads four numbers as `x, y, width, height`, skipping any separators.
    pub fn parse_rect(&mut self) -> Rect<Twips> {
        self.skip_non_numeric();
        if self.is_at_end() {
            return Rect::empty();
        }
        let mut fields = [0i64; 4];
        for (index, field) in fields.iter_mut().enumerate() {
            if index > 0 {
                self.skip_non_numeric();
            }
            *field = self.parse_u64() as i64;
        }
        Rect::new(fields[0], fields[1], fields[2], fields[3])
    }

    /// Reads rects until the input is exhausted. Trailing separators yield no rect.
    pub fn parse_multiple_rects(&mut self) -> Vec<Rect<Twips>> {
        let mut rects = Vec::new();
        while !self.is_at_end() {
            self.skip_non_numeric();
            if self.is_at_end() {
                break;
            }
            rects.push(self.parse_rect());
        }
        rects
    }
}

pub fn parse_csv(input: &str) -> Vec<u64> {
    Scanner::new(input.as_bytes()).parse_csv()
}

pub fn parse_multiple_csv(input: &str) -> Vec<Vec<u64>> {
    Scanner::new(input.as_bytes()).parse_multiple_csv()
}

pub fn parse_rect(input: &str) -> Rect<Twips> {
    Scanner::new(input.as_bytes()).parse_rect()
}

/// Page rectangles as reported by the engine: `x, y, w, h; x, y, w, h`.
pub fn parse_multiple_rects(input: &str) -> Vec<Rect<Twips>> {
    Scanner::new(input.as_bytes()).parse_multiple_rects()
}
