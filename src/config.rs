//! Machine capacities. Each constant matches a reference `#define` in
//! `basic.c` by the same name; components size fixed arrays and bounds
//! checks against these, not against ad-hoc literals.

/// Command line buffer length, including the NUL terminator the reference
/// keeps in `lbuf`. Matches `SIZE_LINE`.
pub const SIZE_LINE: usize = 80;

/// i-code conversion scratch capacity, including the trailing EOL byte.
/// Matches `SIZE_IBUF`; re-exported from [`crate::tokenizer`], which is the
/// module that actually enforces it.
pub const SIZE_IBUF: usize = crate::tokenizer::SIZE_IBUF;

/// Program store capacity. Matches `SIZE_LIST`; re-exported from
/// [`crate::program_store`], which owns the buffer.
pub const SIZE_LIST: usize = crate::program_store::CAPACITY;

/// Array cell count, addressed by `@(expr)`. Matches `SIZE_ARRY`.
pub const SIZE_ARRY: usize = 64;

/// GOSUB stack depth in frames. The reference counts `SIZE_GSTK = 6` raw
/// pointer slots, two per frame; this is the frame count.
pub const GOSUB_STACK_FRAMES: usize = 3;

/// FOR stack depth in frames. The reference counts `SIZE_LSTK = 15` raw
/// slots, five per frame; this is the frame count.
pub const FOR_STACK_FRAMES: usize = 3;

/// Variable count (A-Z).
pub const VAR_COUNT: usize = 26;
