//! Field paths reported by the engine.
//!
//! A path is a list of segments: field names, repetition indices and the
//! reserved end-of-list marker. Rendering follows the prompt convention
//! `events[0].citations[1].work` (index segments attach to the previous name).
use std::fmt;

/// Rendered form of [`Segment::End`].
pub const END_MARKER: &str = "[none]";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Name(String),
    Index(usize),
    /// A repetition was closed here; carries no value.
    End,
}

impl Segment {
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, name: &str) -> Self {
        self.with(Segment::Name(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    pub fn end(&self) -> Self {
        self.with(Segment::End)
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the final segment is the end-of-list marker.
    pub fn is_end(&self) -> bool {
        matches!(self.0.last(), Some(Segment::End))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Name(name) if i == 0 => write!(f, "{name}")?,
                Segment::Name(name) => write!(f, ".{name}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
                Segment::End => f.write_str(END_MARKER)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Path {
    /// Parses the rendered form back into segments (`a.b[2].c`, `a[none]`).
    /// Brackets holding neither an index nor `none`, and unmatched brackets, are skipped.
    fn from(src: &str) -> Self {
        let mut segments = Vec::new();
        for part in src.split('.').filter(|p| !p.is_empty()) {
            let (name, mut rest) = match part.find('[') {
                Some(at) => part.split_at(at),
                None => (part, ""),
            };
            if !name.is_empty() {
                segments.push(Segment::Name(name.to_string()));
            }
            while let Some(open) = rest.find('[') {
                let Some(close) = rest[open..].find(']').map(|at| open + at) else {
                    break;
                };
                let inner = &rest[open + 1..close];
                if inner == "none" {
                    segments.push(Segment::End);
                } else if let Ok(n) = inner.parse::<usize>() {
                    segments.push(Segment::Index(n));
                }
                rest = &rest[close + 1..];
            }
        }
        Self(segments)
    }
}
