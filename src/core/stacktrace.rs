//! Call stack capture for error-class records

use backtrace::Backtrace;

/// Maximum number of frames kept in a trace.
pub const MAX_DEPTH: usize = 50;

// Frames of the capture itself and of the logger entry points. Everything
// up to the last of these is dropped so the log call site comes first.
const INTERNAL_FRAMES: &[&str] = &[
    "backtrace::",
    "chain_logger::core::stacktrace::capture",
    "chain_logger::core::logger::Logger",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub line: u32,
}

fn is_internal(function: &str) -> bool {
    let function = function.trim_start_matches('<');
    INTERNAL_FRAMES
        .iter()
        .any(|prefix| function.starts_with(prefix))
}

/// Capture the current stack, innermost frame first.
///
/// Logger and capture frames are skipped, then `depth_skip` further frames,
/// and at most [`MAX_DEPTH`] frames are kept. Inlined calls appear as frames
/// of their own.
pub fn capture_frames(depth_skip: usize) -> Vec<Frame> {
    let bt = Backtrace::new();

    let frames: Vec<Frame> = bt
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| Frame {
            function: symbol
                .name()
                .map(|name| format!("{:#}", name))
                .unwrap_or_else(|| "<unknown>".to_string()),
            line: symbol.lineno().unwrap_or(0),
        })
        .collect();

    let first_internal = frames
        .iter()
        .position(|frame| is_internal(&frame.function))
        .unwrap_or(0);
    let call_site = frames[first_internal..]
        .iter()
        .position(|frame| !is_internal(&frame.function))
        .map_or(frames.len(), |offset| first_internal + offset);

    frames
        .into_iter()
        .skip(call_site + depth_skip)
        .take(MAX_DEPTH)
        .collect()
}

/// Render frames outermost first, one `\tfunction:line` per line, with a
/// leading newline. `frames` is innermost first, as from [`capture_frames`].
pub fn render(frames: &[Frame]) -> String {
    let mut trace = String::from("\n");
    for frame in frames.iter().rev() {
        trace.push('\t');
        trace.push_str(&frame.function);
        trace.push(':');
        trace.push_str(&frame.line.to_string());
        trace.push('\n');
    }
    trace
}

/// Capture and render the stack of the caller.
pub fn capture(depth_skip: usize) -> String {
    render(&capture_frames(depth_skip))
}
