//! HSP scripting language.
//!
//! A line-oriented interpreter for gacha draw simulations, covering:
//!
//! - Item pools with an aggregate probability split across items
//! - Goal statements that draw against a pool up to a pity guarantee
//! - Loop records that run repeated fixed-odds trials
//! - Variables, `&A(...)` arithmetic, and `?(...) ⇒` conditionals
//!
//! # Quick start
//!
//! ```rust
//! use hsp::script::Interpreter;
//!
//! let mut interp = Interpreter::with_seed(1);
//! let out = interp.run("#x = 6\n&A(#x * 7)");
//! assert_eq!(out, ["📊 #x = 6", "= 42"]);
//! ```

pub mod cond;
pub mod error;
pub mod expr;
pub mod goal;
pub mod interp;
pub mod pool;
pub mod prob;
pub mod record;
pub mod value;
pub mod vars;

// Re-exports for convenience.
pub use error::{EvalError, HspError};
pub use expr::EvalContext;
pub use interp::{classify, Interpreter, LineKind, RunStats};
pub use pool::Pool;
pub use prob::parse_probability;
pub use record::LoopRecord;
pub use value::{format_number, Value};
