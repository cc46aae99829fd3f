//! Background execution support for the processor.

pub(crate) mod driver;
