//! Reading and writing of the textual STL format.

mod read;
mod write;

pub use self::{
    read::{AsciiReadOptions, AsciiReader},
    write::{write_ascii, AsciiWriteOptions, AsciiWriter, FloatTextFormat},
};
