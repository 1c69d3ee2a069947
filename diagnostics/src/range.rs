//! Compiler locations to document ranges.

use clarion_types::{Point, Range};

use crate::compile::{ClangLocation, ClangSourceRange};
use crate::host::LineLengths;

/// End column used when the reported row is past the end of the document.
/// Wide enough that the highlight is never empty.
pub const UNBOUNDED_LINE_WIDTH: u32 = 1000;

/// Resolve the range a diagnostic should highlight.
///
/// The first explicit range wins; any others are ignored. Without one, the
/// whole reported line is highlighted. Rows are clamped, never rejected:
/// clang reports file-wide diagnostics on line -1, and the document may
/// have shrunk since the compile started.
pub fn resolve_range(
    location: &ClangLocation,
    ranges: Option<&[ClangSourceRange]>,
    lines: &dyn LineLengths,
) -> Range {
    if let Some(first) = ranges.and_then(<[ClangSourceRange]>::first) {
        return Range::new(
            Point::new(first.start.line, first.start.column),
            Point::new(first.end.line, first.end.column),
        );
    }

    let row = u32::try_from(location.line.max(0)).unwrap_or(u32::MAX);
    let end_column = if row <= lines.last_row() {
        lines.line_length(row)
    } else {
        UNBOUNDED_LINE_WIDTH
    };
    Range::from_coords(row, 0, row, end_column)
}
