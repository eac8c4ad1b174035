//! Option model: declarations, kinds, values and per-dispatch state.
//!
//! - [`spec`] - `OptSpec` declarations, validation, global merging
//! - [`kind`] - `OptionKind` (parsing behavior + default) and `OptionValue`
//! - [`state`] - `OptionState`, the identifier -> value map of one parse

pub mod kind;
pub mod spec;
pub mod state;

pub use kind::{Factory, OptionKind, OptionValue};
pub use spec::{Completer, OptSpec, merge_globals, to_identifier, validate_options};
pub use state::OptionState;
