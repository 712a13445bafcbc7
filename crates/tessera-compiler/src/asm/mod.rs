//! Assembly: raw instruction lists, the two-pass linker and the listing writer.
//!
//! ## Pipeline
//!
//! ```text
//! RawProgram --link()--> LinkedProgram --write_listing()--> text
//!              pass 1: code layout, label offsets, NOPs between adjacent labels
//!              patch:  indirect cells receive their label's code offset
//!              pass 2: used data cells get offsets, unused ones are dropped
//! ```

mod instr;
mod linker;
mod writer;

pub use instr::{
    CellAttrs, CodeTarget, DataDecl, DataInit, HALT_ADDRESS, Instr, Opcode, RawProgram,
};
pub use linker::{LinkError, LinkedCell, LinkedProgram, link};
pub use writer::{ListingText, write_listing};
