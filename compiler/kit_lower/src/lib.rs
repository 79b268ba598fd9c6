//! Lowering from the typed AST into the Kitten block IR.
//!
//! The front end hands over one [`Body`] per signature. [`lower_body`]
//! drives the [`Translate`] and [`TranslateTest`] implementations of the
//! AST nodes, which build the body back to front through the block API of
//! `kit_cfg`.

pub mod ast;
mod error;
mod lower;

pub use ast::{Body, Command, Expr};
pub use error::LowerError;
pub use lower::{lower_body, LowerCtx, Translate, TranslateTest};
