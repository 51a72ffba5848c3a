//! Code fences and inline code spans.
//!
//! Text inside code is shown to the reader verbatim, so directives and block
//! tags that appear there are not interpreted.

use std::ops::Range;

/// An open fence: its marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub marker: char,
    pub width: usize,
}

impl Fence {
    /// A fence opener or closer: three or more backticks or tildes.
    pub fn of(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let width = trimmed.chars().take_while(|c| *c == marker).count();
        (width >= 3).then_some(Self {
            marker,
            width,
        })
    }

    /// Whether `line` closes this fence.
    pub fn is_closed_by(&self, line: &str) -> bool {
        Self::of(line).is_some_and(|f| f.marker == self.marker && f.width >= self.width)
            && line.trim().chars().all(|c| c == self.marker)
    }
}

/// Byte ranges of `text` covered by fenced code blocks and inline code spans.
///
/// A fence left open runs to the end of the text. An inline span is a run of
/// backticks closed by a run of the same length on the same line; an
/// unmatched run is ordinary text.
pub fn code_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut fence: Option<(Fence, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        if let Some((open, fence_start)) = fence {
            if open.is_closed_by(line) {
                ranges.push(fence_start..offset);
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::of(line) {
            fence = Some((open, start));
            continue;
        }
        inline_spans(line, start, &mut ranges);
    }

    if let Some((_, fence_start)) = fence {
        ranges.push(fence_start..text.len());
    }
    ranges
}

fn inline_spans(line: &str, base: usize, ranges: &mut Vec<Range<usize>>) {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
        let mut j = i + run;
        let mut closed = None;
        while j < bytes.len() {
            if bytes[j] == b'`' {
                let other = bytes[j..].iter().take_while(|b| **b == b'`').count();
                if other == run {
                    closed = Some(j + other);
                    break;
                }
                j += other;
            } else {
                j += 1;
            }
        }
        match closed {
            Some(end) => {
                ranges.push(base + i..base + end);
                i = end;
            }
            None => i += run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_open_and_close() {
        let fence = Fence::of("  ````rust\n").unwrap();
        assert_eq!(fence.marker, '`');
        assert_eq!(fence.width, 4);
        assert!(!fence.is_closed_by("```\n"));
        assert!(fence.is_closed_by("`````\n"));
        assert!(Fence::of("``inline``").is_none());
    }

    #[test]
    fn test_code_ranges() {
        let text = "a `x` b\n```\ncode\n```\nc ``y ` z`` d `open\n";
        let ranges: Vec<&str> = code_ranges(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(ranges, vec!["`x`", "```\ncode\n```\n", "``y ` z``"]);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let text = "intro\n~~~\nrest";
        assert_eq!(code_ranges(text), vec![6..text.len()]);
    }
}
