pub mod decode;
pub mod encode;
pub mod opcode;

pub use decode::{OpcodeRecord, decode};
pub use opcode::{CustomDataClass, OpcodeType, opcode_name};
