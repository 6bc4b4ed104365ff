use std::fmt::Display;
use std::rc::Rc;

// Index and column count code points, not bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub index: usize,
    pub line: usize,
    pub column: usize,
    pub filename: Rc<str>,
}

impl Position {
    pub fn new(filename: Rc<str>) -> Self {
        Self {
            index: 0,
            line: 0,
            column: 0,
            filename,
        }
    }

    // Moves the position past the given character
    pub fn advance(&mut self, c: char) {
        self.index += 1;
        self.column += 1;

        if c == '\n' {
            self.line += 1;
            self.column = 0;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(Rc::from("<stdin>"))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.filename, self.line + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    // Smallest span covering both
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut pos = Position::new(Rc::from("main.yan"));

        for c in "ab\ncé".chars() {
            pos.advance(c);
        }

        assert_eq!(pos.index, 5);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.to_string(), "main.yan:2");
    }

    #[test]
    fn span_join() {
        let mut end = Position::default();
        end.advance('x');

        let a = Span::new(Position::default(), Position::default());
        let b = Span::new(Position::default(), end.clone());

        assert_eq!(a.to(&b).end, end);
    }
}
